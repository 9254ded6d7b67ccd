//! Handlers for playground test-run history.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use promptvault_core::error::CoreError;
use promptvault_core::types::DbId;
use promptvault_db::models::test_history::{CreateTestHistory, TestHistory};
use promptvault_db::repositories::{PromptRepo, TestHistoryRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/prompts/{id}/test-histories
pub async fn list_for_prompt(
    State(state): State<AppState>,
    Path(prompt_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<TestHistory>>>> {
    let records = TestHistoryRepo::list_for_prompt(&state.pool, prompt_id).await?;
    Ok(Json(DataResponse::list(records)))
}

/// POST /api/prompts/{id}/test-histories
///
/// Runs beyond `TEST_HISTORY_RETENTION` for the prompt are evicted, oldest
/// first.
pub async fn create(
    State(state): State<AppState>,
    Path(prompt_id): Path<DbId>,
    Json(input): Json<CreateTestHistory>,
) -> AppResult<(StatusCode, Json<DataResponse<TestHistory>>)> {
    let prompt = PromptRepo::find_by_id(&state.pool, prompt_id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Prompt", prompt_id)))?;
    if input.messages.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "At least one message is required".to_string(),
        )));
    }

    let record = TestHistoryRepo::insert_with_retention(
        &state.pool,
        prompt.id,
        prompt.project_id,
        &input,
        state.config.test_history_retention,
    )
    .await?;
    tracing::debug!(prompt_id = %prompt_id, record_id = %record.id, "Test run recorded");

    Ok((StatusCode::CREATED, Json(DataResponse::new(record))))
}

/// DELETE /api/test-histories/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if TestHistoryRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::not_found("TestHistory", id)))
    }
}
