//! Handlers for the key/value `/settings` store.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use promptvault_core::error::CoreError;
use promptvault_db::models::setting::UpsertSetting;
use promptvault_db::repositories::SettingRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/settings
pub async fn list(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<BTreeMap<String, String>>>> {
    let settings = SettingRepo::list(&state.pool).await?;
    let map = settings.into_iter().map(|s| (s.key, s.value)).collect();
    Ok(Json(DataResponse::new(map)))
}

/// POST /api/settings
///
/// Upserts every posted `key: value` pair and returns the saved pairs.
pub async fn upsert(
    State(state): State<AppState>,
    Json(input): Json<BTreeMap<String, String>>,
) -> AppResult<Json<DataResponse<BTreeMap<String, String>>>> {
    if input.keys().any(|k| k.trim().is_empty()) {
        return Err(AppError::Core(CoreError::Validation(
            "Setting keys must not be empty".to_string(),
        )));
    }

    let entries: Vec<UpsertSetting> = input
        .into_iter()
        .map(|(key, value)| UpsertSetting {
            key,
            value,
            description: None,
        })
        .collect();
    let saved = SettingRepo::upsert_many(&state.pool, &entries).await?;
    tracing::info!(count = saved.len(), "Settings saved");

    let map = saved.into_iter().map(|s| (s.key, s.value)).collect();
    Ok(Json(DataResponse::new(map)))
}
