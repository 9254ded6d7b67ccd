//! Repository tests for settings, providers and test-history retention.

use promptvault_core::chat::ChatMessage;
use promptvault_core::provider::{ProviderConfig, DEFAULT_PROVIDER_KIND};
use promptvault_db::models::project::CreateProject;
use promptvault_db::models::prompt::NewPrompt;
use promptvault_db::models::prompt_history::HistoryOperation;
use promptvault_db::models::setting::UpsertSetting;
use promptvault_db::models::test_history::CreateTestHistory;
use promptvault_db::repositories::{
    ProjectRepo, PromptRepo, ProviderRepo, SettingRepo, TestHistoryRepo,
};
use sqlx::PgPool;

fn provider(id: &str, is_default: bool) -> ProviderConfig {
    ProviderConfig {
        id: id.to_string(),
        name: id.to_uppercase(),
        provider: DEFAULT_PROVIDER_KIND.to_string(),
        api_key: "sk-test".to_string(),
        api_url: None,
        model: "qwen-turbo".to_string(),
        system_prompt: None,
        is_default,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn settings_upsert_keeps_description(pool: PgPool) {
    SettingRepo::upsert_many(
        &pool,
        &[UpsertSetting {
            key: "theme".to_string(),
            value: "dark".to_string(),
            description: Some("UI theme".to_string()),
        }],
    )
    .await
    .unwrap();

    let stored = SettingRepo::upsert_many(
        &pool,
        &[UpsertSetting {
            key: "theme".to_string(),
            value: "light".to_string(),
            description: None,
        }],
    )
    .await
    .unwrap();
    assert_eq!(stored[0].value, "light");
    assert_eq!(stored[0].description.as_deref(), Some("UI theme"));

    assert_eq!(SettingRepo::list(&pool).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn providers_are_replaced_in_order(pool: PgPool) {
    ProviderRepo::replace_all(&pool, &[provider("old", true)])
        .await
        .unwrap();
    ProviderRepo::replace_all(&pool, &[provider("b", false), provider("a", true)])
        .await
        .unwrap();

    let stored = ProviderRepo::list(&pool).await.unwrap();
    let ids: Vec<_> = stored.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert!(stored[1].is_default);
}

#[sqlx::test(migrations = "./migrations")]
async fn two_default_providers_rejected(pool: PgPool) {
    let result = ProviderRepo::replace_all(&pool, &[provider("a", true), provider("b", true)]).await;
    assert!(result.is_err());
    // The failed replacement leaves the previous list untouched.
    assert!(ProviderRepo::list(&pool).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_history_retention_evicts_oldest(pool: PgPool) {
    let project = ProjectRepo::create(
        &pool,
        &CreateProject {
            name: "P".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();
    let prompt = PromptRepo::insert_version(
        &pool,
        &NewPrompt {
            project_id: project.id,
            name: "greeter".to_string(),
            version: "1.0.0".to_string(),
            content: "Hi {{name}}".to_string(),
            description: String::new(),
            category: None,
            tag_ids: Vec::new(),
        },
        HistoryOperation::Create,
        "",
    )
    .await
    .unwrap();

    for n in 0..5 {
        let input = CreateTestHistory {
            title: Some(format!("run {n}")),
            messages: vec![ChatMessage::user("Hi Ada")],
            response: Some(format!("response {n}")),
            ..CreateTestHistory::default()
        };
        TestHistoryRepo::insert_with_retention(&pool, prompt.id, project.id, &input, 3)
            .await
            .unwrap();
    }

    let runs = TestHistoryRepo::list_for_prompt(&pool, prompt.id).await.unwrap();
    let titles: Vec<_> = runs.iter().filter_map(|r| r.title.as_deref()).collect();
    assert_eq!(titles, vec!["run 4", "run 3", "run 2"]);
    assert_eq!(runs[0].messages.0[0].content, "Hi Ada");

    assert!(TestHistoryRepo::delete(&pool, runs[0].id).await.unwrap());
    assert_eq!(TestHistoryRepo::list_for_prompt(&pool, prompt.id).await.unwrap().len(), 2);
}
