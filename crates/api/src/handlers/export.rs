//! Export and import of projects with their prompts.

use std::collections::HashMap;

use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use promptvault_core::error::CoreError;
use promptvault_core::export::{
    parse_import, render, ExportFormat, ExportProject, ExportPrompt, ExportTag, ImportFormat,
    ImportProject,
};
use promptvault_core::types::{new_id, DbId};
use promptvault_core::validation::{validate_name, MAX_PROJECT_NAME_LENGTH, MAX_PROMPT_NAME_LENGTH};
use promptvault_core::versioning::validate_version;
use promptvault_db::models::prompt::{ImportedPrompt, Prompt};
use promptvault_db::models::tag::Tag;
use promptvault_db::repositories::{CategoryRepo, ProjectRepo, PromptRepo, TagRepo};
use promptvault_db::DbPool;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

fn default_format() -> ExportFormat {
    ExportFormat::Json
}

/// Body of `POST /api/export`.
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub project_ids: Vec<DbId>,
    #[serde(default = "default_format")]
    pub format: ExportFormat,
}

/// Result of `POST /api/import`.
#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    /// Projects written.
    pub imported: usize,
    /// Projects or rows left out.
    pub skipped: usize,
    pub errors: Vec<String>,
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// POST /api/export
///
/// Unknown project ids are skipped. The body is served as a download.
pub async fn export(
    State(state): State<AppState>,
    Json(input): Json<ExportRequest>,
) -> AppResult<impl IntoResponse> {
    if input.project_ids.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "project_ids must not be empty".to_string(),
        )));
    }

    let projects = load_export(&state.pool, &input.project_ids).await?;
    let body = render(input.format, &projects, Utc::now())?;
    tracing::info!(
        projects = projects.len(),
        format = ?input.format,
        "Projects exported"
    );

    let disposition = format!("attachment; filename=\"{}\"", input.format.file_name());
    Ok((
        [
            (header::CONTENT_TYPE, input.format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

async fn load_export(pool: &DbPool, ids: &[DbId]) -> AppResult<Vec<ExportProject>> {
    let projects = ProjectRepo::find_by_ids(pool, ids).await?;
    let found: Vec<DbId> = projects.iter().map(|p| p.id).collect();
    let prompts = PromptRepo::list_for_projects(pool, &found).await?;

    let mut tag_ids: Vec<DbId> = prompts.iter().flat_map(|p| p.tag_ids.iter().copied()).collect();
    tag_ids.sort_unstable();
    tag_ids.dedup();
    let tags: HashMap<DbId, Tag> = TagRepo::find_by_ids(pool, &tag_ids)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    let mut by_project: HashMap<DbId, Vec<ExportPrompt>> = HashMap::new();
    for prompt in prompts {
        let project_id = prompt.project_id;
        by_project
            .entry(project_id)
            .or_default()
            .push(export_prompt(prompt, &tags));
    }

    Ok(projects
        .into_iter()
        .map(|project| ExportProject {
            prompts: by_project.remove(&project.id).unwrap_or_default(),
            id: project.id,
            name: project.name,
            description: project.description,
            created_at: project.created_at,
            updated_at: project.updated_at,
        })
        .collect())
}

fn export_prompt(prompt: Prompt, tags: &HashMap<DbId, Tag>) -> ExportPrompt {
    let tags = prompt
        .tag_ids
        .iter()
        .filter_map(|id| tags.get(id))
        .map(|t| ExportTag {
            id: t.id,
            name: t.name.clone(),
            color: t.color.clone(),
            created_at: t.created_at,
        })
        .collect();
    ExportPrompt {
        id: prompt.id,
        name: prompt.name,
        version: prompt.version,
        content: prompt.content,
        description: prompt.description,
        category: prompt.category,
        tags,
        created_at: prompt.created_at,
    }
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// POST /api/import
///
/// Multipart fields: `file` (required) and `format` (`json` or `csv`,
/// otherwise taken from the file extension). Each project is written in its
/// own transaction; a failing project is reported and skipped.
pub async fn import(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<ImportSummary>>> {
    let mut file: Option<(Option<String>, Vec<u8>)> = None;
    let mut format: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some((file_name, data.to_vec()));
            }
            Some("format") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                format = Some(value);
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| AppError::BadRequest("Missing multipart field 'file'".to_string()))?;
    let format = ImportFormat::detect(format.as_deref(), file_name.as_deref())?;
    let parsed = parse_import(format, &bytes)?;

    let mut summary = ImportSummary {
        imported: 0,
        skipped: parsed.skipped,
        errors: parsed.errors,
    };

    for project in &parsed.projects {
        let Some(project_id) = project.id else {
            summary.skipped += 1;
            summary.errors.push("Missing project id".to_string());
            continue;
        };
        match import_project(&state.pool, project_id, project).await {
            Ok(()) => summary.imported += 1,
            Err(e) => {
                tracing::warn!(project_id = %project_id, error = %e, "Project import failed");
                summary.skipped += 1;
                summary.errors.push(format!("Project {project_id}: {e}"));
            }
        }
    }

    tracing::info!(
        imported = summary.imported,
        skipped = summary.skipped,
        "Import finished"
    );
    Ok(Json(DataResponse::new(summary)))
}

async fn import_project(pool: &DbPool, id: DbId, project: &ImportProject) -> AppResult<()> {
    validate_name("project name", &project.name, MAX_PROJECT_NAME_LENGTH)?;
    for prompt in &project.prompts {
        validate_name("prompt name", &prompt.name, MAX_PROMPT_NAME_LENGTH)?;
        validate_version(&prompt.version)?;
    }

    let now = Utc::now();
    let created_at = project.created_at.unwrap_or(now);
    let mut tx = pool.begin().await?;

    ProjectRepo::upsert(
        &mut *tx,
        id,
        &project.name,
        &project.description,
        created_at,
        project.updated_at.unwrap_or(created_at),
    )
    .await?;

    for prompt in &project.prompts {
        let mut tag_ids = Vec::with_capacity(prompt.tags.len());
        for tag in &prompt.tags {
            let stored = match tag.id {
                Some(tag_id) => {
                    TagRepo::upsert(
                        &mut *tx,
                        tag_id,
                        &tag.name,
                        tag.color.as_deref(),
                        tag.created_at.unwrap_or(now),
                    )
                    .await?
                }
                None => TagRepo::find_or_create(&mut *tx, &tag.name, tag.color.as_deref()).await?,
            };
            if !tag_ids.contains(&stored.id) {
                tag_ids.push(stored.id);
            }
        }

        let category = prompt
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        if let Some(category) = category {
            CategoryRepo::ensure_exists(&mut *tx, category).await?;
        }

        let record = ImportedPrompt {
            id: prompt.id.unwrap_or_else(new_id),
            project_id: id,
            name: prompt.name.clone(),
            version: prompt.version.clone(),
            content: prompt.content.clone(),
            description: prompt.description.clone(),
            category: category.map(str::to_string),
            tag_ids,
            created_at: prompt.created_at.unwrap_or(now),
        };
        PromptRepo::upsert(&mut *tx, &record).await?;
    }

    tx.commit().await?;
    Ok(())
}
