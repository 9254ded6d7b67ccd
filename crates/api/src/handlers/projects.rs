//! Handlers for the `/projects` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use promptvault_core::error::CoreError;
use promptvault_core::types::DbId;
use promptvault_core::validation::{validate_name, validate_optional_name, MAX_PROJECT_NAME_LENGTH};
use promptvault_db::models::project::{CreateProject, Project, PromptSummary, UpdateProject};
use promptvault_db::models::tag::Tag;
use promptvault_db::repositories::ProjectRepo;
use promptvault_db::DbPool;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::query::SearchParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// A project with the prompt records it holds and the tags they use.
#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub prompts: Vec<PromptSummary>,
    pub tags: Vec<Tag>,
}

async fn with_details(pool: &DbPool, project: Project) -> AppResult<ProjectDetail> {
    let prompts = ProjectRepo::prompt_summaries(pool, project.id).await?;
    let tags = ProjectRepo::tags_in_use(pool, project.id).await?;
    Ok(ProjectDetail {
        project,
        prompts,
        tags,
    })
}

/// Load a project or fail with 404.
pub async fn require_project(pool: &DbPool, id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Project", id)))
}

/// POST /api/projects
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectDetail>>)> {
    validate_name("name", &input.name, MAX_PROJECT_NAME_LENGTH)?;

    let project = ProjectRepo::create(&state.pool, &input).await?;
    tracing::info!(project_id = %project.id, name = %project.name, "Project created");

    let detail = ProjectDetail {
        project,
        prompts: Vec::new(),
        tags: Vec::new(),
    };
    Ok((StatusCode::CREATED, Json(DataResponse::new(detail))))
}

/// GET /api/projects?search=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<DataResponse<Vec<ProjectDetail>>>> {
    let search = params.search.as_deref().map(str::trim);
    let projects = ProjectRepo::list(&state.pool, search).await?;

    let mut details = Vec::with_capacity(projects.len());
    for project in projects {
        details.push(with_details(&state.pool, project).await?);
    }
    Ok(Json(DataResponse::list(details)))
}

/// GET /api/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectDetail>>> {
    let project = require_project(&state.pool, id).await?;
    Ok(Json(DataResponse::new(
        with_details(&state.pool, project).await?,
    )))
}

/// PUT /api/projects/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<DataResponse<ProjectDetail>>> {
    validate_optional_name("name", input.name.as_deref(), MAX_PROJECT_NAME_LENGTH)?;

    let project = ProjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Project", id)))?;
    tracing::info!(project_id = %id, "Project updated");

    Ok(Json(DataResponse::new(
        with_details(&state.pool, project).await?,
    )))
}

/// DELETE /api/projects/{id}
///
/// Prompts, their history and test runs go with the project.
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if ProjectRepo::delete(&state.pool, id).await? {
        tracing::info!(project_id = %id, "Project deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::not_found("Project", id)))
    }
}
