//! Handlers for the `/categories` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use promptvault_core::error::CoreError;
use promptvault_core::types::DbId;
use promptvault_core::validation::{
    validate_color, validate_name, validate_optional_name, MAX_LABEL_NAME_LENGTH,
};
use promptvault_db::models::category::{Category, CreateCategory, UpdateCategory};
use promptvault_db::repositories::CategoryRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/categories
pub async fn list(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Category>>>> {
    let categories = CategoryRepo::list(&state.pool).await?;
    Ok(Json(DataResponse::list(categories)))
}

/// POST /api/categories
///
/// A duplicate name is a 409.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateCategory>,
) -> AppResult<(StatusCode, Json<DataResponse<Category>>)> {
    validate_name("name", &input.name, MAX_LABEL_NAME_LENGTH)?;
    if let Some(color) = &input.color {
        validate_color(color)?;
    }

    let category = CategoryRepo::create(&state.pool, &input).await?;
    tracing::info!(category_id = %category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(category))))
}

/// GET /api/categories/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Category>>> {
    let category = CategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Category", id)))?;
    Ok(Json(DataResponse::new(category)))
}

/// PUT /api/categories/{id}
///
/// Renaming a category renames it on its prompts too.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCategory>,
) -> AppResult<Json<DataResponse<Category>>> {
    validate_optional_name("name", input.name.as_deref(), MAX_LABEL_NAME_LENGTH)?;
    if let Some(color) = &input.color {
        validate_color(color)?;
    }

    let category = CategoryRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Category", id)))?;
    Ok(Json(DataResponse::new(category)))
}

/// DELETE /api/categories/{id}
///
/// Prompts filed under the category are left without one.
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if CategoryRepo::delete(&state.pool, id).await? {
        tracing::info!(category_id = %id, "Category deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::not_found("Category", id)))
    }
}
