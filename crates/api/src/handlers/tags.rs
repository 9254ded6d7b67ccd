//! Handlers for the `/tags` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use promptvault_core::error::CoreError;
use promptvault_core::types::DbId;
use promptvault_core::validation::{
    validate_color, validate_name, validate_optional_name, MAX_LABEL_NAME_LENGTH,
};
use promptvault_db::models::tag::{CreateTag, Tag, UpdateTag};
use promptvault_db::repositories::TagRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/tags
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Tag>>>> {
    let tags = TagRepo::list(&state.pool).await?;
    Ok(Json(DataResponse::list(tags)))
}

/// POST /api/tags
///
/// A duplicate name is a 409.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateTag>,
) -> AppResult<(StatusCode, Json<DataResponse<Tag>>)> {
    validate_name("name", &input.name, MAX_LABEL_NAME_LENGTH)?;
    if let Some(color) = &input.color {
        validate_color(color)?;
    }

    let tag = TagRepo::create(&state.pool, &input).await?;
    tracing::info!(tag_id = %tag.id, name = %tag.name, "Tag created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(tag))))
}

/// GET /api/tags/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Tag>>> {
    let tag = TagRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Tag", id)))?;
    Ok(Json(DataResponse::new(tag)))
}

/// PUT /api/tags/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTag>,
) -> AppResult<Json<DataResponse<Tag>>> {
    validate_optional_name("name", input.name.as_deref(), MAX_LABEL_NAME_LENGTH)?;
    if let Some(color) = &input.color {
        validate_color(color)?;
    }

    let tag = TagRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Tag", id)))?;
    Ok(Json(DataResponse::new(tag)))
}

/// DELETE /api/tags/{id}
///
/// The tag id is removed from every prompt that carried it.
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if TagRepo::delete(&state.pool, id).await? {
        tracing::info!(tag_id = %id, "Tag deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::not_found("Tag", id)))
    }
}
