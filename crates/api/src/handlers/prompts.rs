//! Handlers for prompt records and their version lineage.
//!
//! Every content change that bumps the version inserts a new record; the
//! record it came from is left untouched. See `promptvault_core::versioning`
//! for the bump rule.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use promptvault_core::diff::{compute_diff, DiffResult};
use promptvault_core::error::CoreError;
use promptvault_core::types::DbId;
use promptvault_core::validation::{validate_name, MAX_PROMPT_NAME_LENGTH};
use promptvault_core::versioning::{next_lineage_version, BumpKind};
use promptvault_db::models::project::Project;
use promptvault_db::models::prompt::{
    CreatePrompt, NewPrompt, Prompt, PromptFilter, PromptMetadata, UpdatePrompt,
};
use promptvault_db::models::prompt_history::{HistoryOperation, PromptHistory};
use promptvault_db::models::tag::Tag;
use promptvault_db::repositories::{CategoryRepo, PromptHistoryRepo, PromptRepo, TagRepo};
use promptvault_db::DbPool;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::handlers::projects::require_project;
use crate::query::{non_empty, parse_date_bound, DiffParams, PromptListParams, SdkPromptParams};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A prompt record with its tags resolved.
#[derive(Debug, Serialize)]
pub struct PromptWithTags {
    #[serde(flatten)]
    pub prompt: Prompt,
    pub tags: Vec<Tag>,
}

/// A prompt record with its tags, owning project and content history.
#[derive(Debug, Serialize)]
pub struct PromptDetail {
    #[serde(flatten)]
    pub prompt: Prompt,
    pub tags: Vec<Tag>,
    pub project: Project,
    pub history: Vec<PromptHistory>,
}

#[derive(Debug, Serialize)]
pub struct PromptDiff {
    pub source_version: String,
    pub target_version: String,
    pub diff: DiffResult,
}

/// Content served to SDK clients.
#[derive(Debug, Serialize)]
pub struct SdkPrompt {
    pub id: DbId,
    pub name: String,
    pub version: String,
    pub content: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn require_prompt(pool: &DbPool, id: DbId) -> AppResult<Prompt> {
    PromptRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Prompt", id)))
}

/// Check that every id names an existing tag. Returns the ids de-duplicated,
/// in their original order.
async fn resolve_tag_ids(pool: &DbPool, ids: &[DbId]) -> AppResult<Vec<DbId>> {
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    let found = TagRepo::find_by_ids(pool, &unique).await?;
    if found.len() != unique.len() {
        return Err(AppError::Core(CoreError::Validation(
            "Invalid tag ids".to_string(),
        )));
    }
    Ok(unique)
}

async fn require_category(pool: &DbPool, name: Option<&str>) -> AppResult<String> {
    let name = name.map(str::trim).filter(|n| !n.is_empty()).ok_or_else(|| {
        AppError::Core(CoreError::Validation("category is required".to_string()))
    })?;
    if !CategoryRepo::exists_by_name(pool, name).await? {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Invalid category '{name}'"
        ))));
    }
    Ok(name.to_string())
}

/// Resolve the tags of many prompts with a single query.
async fn attach_tags(pool: &DbPool, prompts: Vec<Prompt>) -> AppResult<Vec<PromptWithTags>> {
    let mut ids: Vec<DbId> = prompts.iter().flat_map(|p| p.tag_ids.iter().copied()).collect();
    ids.sort_unstable();
    ids.dedup();

    let by_id: HashMap<DbId, Tag> = TagRepo::find_by_ids(pool, &ids)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    Ok(prompts
        .into_iter()
        .map(|prompt| {
            let tags = prompt
                .tag_ids
                .iter()
                .filter_map(|id| by_id.get(id).cloned())
                .collect();
            PromptWithTags { prompt, tags }
        })
        .collect())
}

async fn with_tags(pool: &DbPool, prompt: Prompt) -> AppResult<PromptWithTags> {
    let tags = TagRepo::find_by_ids(pool, &prompt.tag_ids).await?;
    Ok(PromptWithTags { prompt, tags })
}

async fn next_version(pool: &DbPool, prompt: &Prompt, kind: BumpKind) -> AppResult<String> {
    let versions = PromptRepo::lineage_versions(pool, prompt.project_id, &prompt.name).await?;
    Ok(next_lineage_version(
        versions.iter().map(String::as_str),
        kind,
    )?)
}

// ---------------------------------------------------------------------------
// Project-scoped handlers
// ---------------------------------------------------------------------------

/// GET /api/projects/{id}/prompts
pub async fn list_by_project(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Query(params): Query<PromptListParams>,
) -> AppResult<Json<DataResponse<Vec<PromptWithTags>>>> {
    require_project(&state.pool, project_id).await?;

    let tag_id = match non_empty(params.tag) {
        Some(name) => match TagRepo::find_by_name(&state.pool, &name).await? {
            Some(tag) => Some(tag.id),
            None => return Ok(Json(DataResponse::list(Vec::new()))),
        },
        None => None,
    };

    let filter = PromptFilter {
        tag_id,
        version: non_empty(params.version),
        name: non_empty(params.name),
        category: non_empty(params.category),
        start_date: non_empty(params.start_date)
            .map(|d| parse_date_bound(&d, false))
            .transpose()?,
        end_date: non_empty(params.end_date)
            .map(|d| parse_date_bound(&d, true))
            .transpose()?,
    };

    let prompts = PromptRepo::list_for_project(&state.pool, project_id, &filter).await?;
    let prompts = attach_tags(&state.pool, prompts).await?;
    Ok(Json(DataResponse::list(prompts)))
}

/// POST /api/projects/{id}/prompts
///
/// A name already used in the project continues that lineage with a patch
/// bump; a new name starts at `1.0.0`.
pub async fn create(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreatePrompt>,
) -> AppResult<(StatusCode, Json<DataResponse<PromptWithTags>>)> {
    require_project(&state.pool, project_id).await?;
    validate_name("name", &input.name, MAX_PROMPT_NAME_LENGTH)?;
    let category = require_category(&state.pool, input.category.as_deref()).await?;
    let tag_ids = resolve_tag_ids(&state.pool, &input.tag_ids).await?;

    let versions = PromptRepo::lineage_versions(&state.pool, project_id, &input.name).await?;
    let version = next_lineage_version(versions.iter().map(String::as_str), BumpKind::Patch)?;

    let new = NewPrompt {
        project_id,
        name: input.name,
        version,
        content: input.content,
        description: input.description.unwrap_or_default(),
        category: Some(category),
        tag_ids,
    };
    let prompt = PromptRepo::insert_version(&state.pool, &new, HistoryOperation::Create, "").await?;
    tracing::info!(
        prompt_id = %prompt.id,
        project_id = %project_id,
        version = %prompt.version,
        "Prompt created"
    );

    let prompt = with_tags(&state.pool, prompt).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(prompt))))
}

/// GET /api/projects/{id}/sdk/prompt?name=&version=&tag=
///
/// Newest record of the named lineage, optionally pinned to a version or tag.
pub async fn sdk_prompt(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Query(params): Query<SdkPromptParams>,
) -> AppResult<Json<DataResponse<SdkPrompt>>> {
    let tag_id = match non_empty(params.tag) {
        Some(name) => Some(
            TagRepo::find_by_name(&state.pool, &name)
                .await?
                .ok_or(AppError::Core(CoreError::not_found("Tag", &name)))?
                .id,
        ),
        None => None,
    };
    let version = non_empty(params.version);

    let prompt = PromptRepo::find_latest(
        &state.pool,
        project_id,
        &params.name,
        version.as_deref(),
        tag_id,
    )
    .await?
    .ok_or(AppError::Core(CoreError::not_found("Prompt", &params.name)))?;

    Ok(Json(DataResponse::new(SdkPrompt {
        id: prompt.id,
        name: prompt.name,
        version: prompt.version,
        content: prompt.content,
    })))
}

// ---------------------------------------------------------------------------
// Record handlers
// ---------------------------------------------------------------------------

/// GET /api/prompts/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PromptDetail>>> {
    let prompt = require_prompt(&state.pool, id).await?;
    let project = require_project(&state.pool, prompt.project_id).await?;
    let tags = TagRepo::find_by_ids(&state.pool, &prompt.tag_ids).await?;
    let history = PromptHistoryRepo::list_for_prompt(&state.pool, id).await?;

    Ok(Json(DataResponse::new(PromptDetail {
        prompt,
        tags,
        project,
        history,
    })))
}

/// PUT /api/prompts/{id}
///
/// - Content changed, `bump` other than `none`: a new record with the next
///   lineage version.
/// - Content changed, `bump: none`: content replaced in place.
/// - Content unchanged: metadata replaced in place, no history entry.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePrompt>,
) -> AppResult<Json<DataResponse<PromptWithTags>>> {
    let existing = require_prompt(&state.pool, id).await?;

    let tag_ids = match &input.tag_ids {
        Some(ids) => Some(resolve_tag_ids(&state.pool, ids).await?),
        None => None,
    };
    let category = match input.category.as_deref() {
        Some(name) => Some(require_category(&state.pool, Some(name)).await?),
        None => None,
    };
    let meta = PromptMetadata {
        description: input.description,
        category,
        tag_ids,
    };

    let changed_content = input.content.filter(|c| *c != existing.content);

    let prompt = match changed_content {
        Some(content) if input.bump == BumpKind::None => {
            PromptRepo::replace_content(&state.pool, id, &content, &meta)
                .await?
                .ok_or(AppError::Core(CoreError::not_found("Prompt", id)))?
        }
        Some(content) => {
            let version = next_version(&state.pool, &existing, input.bump).await?;
            let new = NewPrompt {
                project_id: existing.project_id,
                name: existing.name.clone(),
                version,
                content,
                description: meta.description.unwrap_or(existing.description),
                category: meta.category.or(existing.category),
                tag_ids: meta.tag_ids.unwrap_or(existing.tag_ids),
            };
            PromptRepo::insert_version(
                &state.pool,
                &new,
                HistoryOperation::Update,
                &existing.content,
            )
            .await?
        }
        None => PromptRepo::update_metadata(&state.pool, id, &meta)
            .await?
            .ok_or(AppError::Core(CoreError::not_found("Prompt", id)))?,
    };

    tracing::info!(
        prompt_id = %prompt.id,
        source_id = %id,
        version = %prompt.version,
        bump = %input.bump,
        "Prompt updated"
    );
    Ok(Json(DataResponse::new(with_tags(&state.pool, prompt).await?)))
}

/// DELETE /api/prompts/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if PromptRepo::delete(&state.pool, id).await? {
        tracing::info!(prompt_id = %id, "Prompt deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::not_found("Prompt", id)))
    }
}

/// GET /api/prompts/{id}/history
pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<PromptHistory>>>> {
    require_prompt(&state.pool, id).await?;
    let entries = PromptHistoryRepo::list_for_prompt(&state.pool, id).await?;
    Ok(Json(DataResponse::list(entries)))
}

/// GET /api/prompts/{id}/diff/{target_id}?granularity=word|line
pub async fn diff(
    State(state): State<AppState>,
    Path((id, target_id)): Path<(DbId, DbId)>,
    Query(params): Query<DiffParams>,
) -> AppResult<Json<DataResponse<PromptDiff>>> {
    let source = require_prompt(&state.pool, id).await?;
    let target = require_prompt(&state.pool, target_id).await?;

    let diff = compute_diff(&source.content, &target.content, params.granularity);
    Ok(Json(DataResponse::new(PromptDiff {
        source_version: source.version,
        target_version: target.version,
        diff,
    })))
}

/// POST /api/prompts/{id}/rollback
///
/// Restores the record's content as a new patch version at the head of its
/// lineage.
pub async fn rollback(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<PromptWithTags>>)> {
    let source = require_prompt(&state.pool, id).await?;
    let version = next_version(&state.pool, &source, BumpKind::Patch).await?;
    let head = PromptRepo::find_latest(&state.pool, source.project_id, &source.name, None, None)
        .await?
        .map(|p| p.content)
        .unwrap_or_default();

    let new = NewPrompt {
        project_id: source.project_id,
        name: source.name,
        version,
        content: source.content,
        description: format!("Rollback to version {}", source.version),
        category: source.category,
        tag_ids: source.tag_ids,
    };
    let prompt =
        PromptRepo::insert_version(&state.pool, &new, HistoryOperation::Rollback, &head).await?;
    tracing::info!(
        prompt_id = %prompt.id,
        source_id = %id,
        version = %prompt.version,
        "Prompt rolled back"
    );

    let prompt = with_tags(&state.pool, prompt).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(prompt))))
}
