//! Export and import round trips through the HTTP API.

mod common;

use axum::http::{header, StatusCode};
use common::{body_bytes, body_json, body_text, build_test_app, get, post_json, post_multipart};
use serde_json::json;
use sqlx::PgPool;

/// One project with a tagged prompt in two versions. Returns the project id.
async fn seed(pool: &PgPool) -> String {
    let project_id = common::create_project(pool, "Support").await;
    let category = common::create_category(pool, "faq").await;
    let tag_id = common::create_tag(pool, "prod").await;
    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/projects/{project_id}/prompts"),
        json!({ "name": "answer", "content": "Answer {{q}}", "category": category, "tag_ids": [tag_id] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    common::create_prompt(pool, &project_id, "answer", "Answer briefly: {{q}}", &category).await;
    project_id
}

async fn export(pool: &PgPool, project_id: &str, format: &str) -> axum::response::Response {
    post_json(
        build_test_app(pool.clone()),
        "/api/export",
        json!({ "project_ids": [project_id], "format": format }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn json_export_is_a_download(pool: PgPool) {
    let project_id = seed(&pool).await;
    let response = export(&pool, &project_id, "json").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"prompts_export.json\""
    );

    let json = body_json(response).await;
    assert!(json["export_time"].is_string());
    let project = &json["projects"][0];
    assert_eq!(project["id"], json!(project_id));
    assert_eq!(project["prompts"].as_array().unwrap().len(), 2);
    assert_eq!(project["prompts"][0]["tags"][0]["name"], "prod");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn csv_export_has_header_and_rows(pool: PgPool) {
    let project_id = seed(&pool).await;
    let response = export(&pool, &project_id, "csv").await;

    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let body = body_text(response).await;
    let mut lines = body.lines();
    assert!(lines.next().unwrap().starts_with("project_id,project_name"));
    assert_eq!(lines.count(), 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn yaml_export_is_keyed_by_project_name(pool: PgPool) {
    let project_id = seed(&pool).await;
    let response = export(&pool, &project_id, "yaml").await;

    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/x-yaml");
    let body = body_text(response).await;
    assert!(body.starts_with("Support:"));
    assert!(body.contains("Answer briefly"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn export_requires_project_ids(pool: PgPool) {
    let response = post_json(
        build_test_app(pool),
        "/api/export",
        json!({ "project_ids": [] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn json_export_imports_into_empty_database(pool: PgPool) {
    let project_id = seed(&pool).await;
    let exported = body_bytes(export(&pool, &project_id, "json").await).await;

    // Wipe the project, then bring it back from the file.
    let response = common::delete(
        build_test_app(pool.clone()),
        &format!("/api/projects/{project_id}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_multipart(
        build_test_app(pool.clone()),
        "/api/import",
        "backup.json",
        &exported,
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["imported"], 1);
    assert_eq!(json["data"]["skipped"], 0);

    let json = body_json(
        get(
            build_test_app(pool.clone()),
            &format!("/api/projects/{project_id}/prompts"),
        )
        .await,
    )
    .await;
    assert_eq!(json["total"], 2);

    // Importing the same file again overwrites by id.
    let response = post_multipart(
        build_test_app(pool.clone()),
        "/api/import",
        "backup.json",
        &exported,
        &[],
    )
    .await;
    assert_eq!(body_json(response).await["data"]["imported"], 1);
    let json = body_json(
        get(
            build_test_app(pool),
            &format!("/api/projects/{project_id}/prompts"),
        )
        .await,
    )
    .await;
    assert_eq!(json["total"], 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn json_import_reuses_tag_with_same_name(pool: PgPool) {
    let project_id = seed(&pool).await;
    let exported = body_bytes(export(&pool, &project_id, "json").await).await;
    let old_tag_id = body_json(get(build_test_app(pool.clone()), "/api/tags").await).await["data"][0]
        ["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Recreate "prod" under a fresh id so the file's tag id is unknown.
    for uri in [
        format!("/api/projects/{project_id}"),
        format!("/api/tags/{old_tag_id}"),
    ] {
        let response = common::delete(build_test_app(pool.clone()), &uri).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
    let new_tag_id = common::create_tag(&pool, "prod").await;
    assert_ne!(new_tag_id, old_tag_id);

    let response = post_multipart(
        build_test_app(pool.clone()),
        "/api/import",
        "backup.json",
        &exported,
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["imported"], 1);
    assert_eq!(json["data"]["skipped"], 0);

    let json = body_json(get(build_test_app(pool.clone()), "/api/tags").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    let json = body_json(
        get(
            build_test_app(pool),
            &format!("/api/projects/{project_id}/prompts?tag=prod"),
        )
        .await,
    )
    .await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["data"][0]["tag_ids"][0], new_tag_id.as_str());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn csv_import_groups_rows_by_project(pool: PgPool) {
    let csv = "\
project_id,project_name,project_description,prompt_id,prompt_name,version,category,content,prompt_description,tags,created_at
11111111-1111-4111-8111-111111111111,Imported,,22222222-2222-4222-8222-222222222222,hello,1.0.0,greetings,Hi there,,alpha;beta,
11111111-1111-4111-8111-111111111111,Imported,,33333333-3333-4333-8333-333333333333,hello,1.0.1,greetings,Hi again,,,
not-a-uuid,Broken,,,,,,,,,
";
    let response = post_multipart(
        build_test_app(pool.clone()),
        "/api/import",
        "data.txt",
        csv.as_bytes(),
        &[("format", "csv")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["imported"], 1);
    assert_eq!(json["data"]["skipped"], 1);

    let json = body_json(
        get(
            build_test_app(pool.clone()),
            "/api/projects/11111111-1111-4111-8111-111111111111/prompts?tag=beta",
        )
        .await,
    )
    .await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["data"][0]["category"], "greetings");

    // Missing categories are created on the way in.
    let json = body_json(get(build_test_app(pool), "/api/categories").await).await;
    assert_eq!(json["data"][0]["name"], "greetings");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn import_rejects_unsupported_format(pool: PgPool) {
    let response = post_multipart(
        build_test_app(pool.clone()),
        "/api/import",
        "data.xml",
        b"<projects/>",
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_multipart(
        build_test_app(pool),
        "/api/import",
        "data.json",
        b"{not json",
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
