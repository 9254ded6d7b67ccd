//! Handlers for the LLM provider list.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use promptvault_core::provider::{normalize_defaults, validate_providers, ProviderConfig};
use promptvault_db::repositories::{ProviderRepo, SettingRepo};
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /api/llm-providers`.
#[derive(Debug, Deserialize)]
pub struct ProviderListPayload {
    pub providers: Vec<ProviderConfig>,
}

/// Stored providers. When none are stored, the provider described by the
/// `llm_*` settings, else the environment-configured one.
pub async fn load_providers(state: &AppState) -> AppResult<Vec<ProviderConfig>> {
    let stored = ProviderRepo::list(&state.pool).await?;
    if !stored.is_empty() {
        return Ok(stored);
    }

    let settings: BTreeMap<String, String> = SettingRepo::list(&state.pool)
        .await?
        .into_iter()
        .map(|s| (s.key, s.value))
        .collect();
    let fallback = state
        .config
        .settings_provider(&settings)
        .or_else(|| state.config.env_provider());
    Ok(fallback.into_iter().collect())
}

/// GET /api/llm-providers
pub async fn list(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ProviderConfig>>>> {
    let providers = load_providers(&state).await?;
    Ok(Json(DataResponse::list(providers)))
}

/// POST /api/llm-providers
///
/// Replaces the whole list. Exactly one provider ends up default.
pub async fn replace(
    State(state): State<AppState>,
    Json(input): Json<ProviderListPayload>,
) -> AppResult<Json<DataResponse<Vec<ProviderConfig>>>> {
    let mut providers = input.providers;
    validate_providers(&providers)?;
    normalize_defaults(&mut providers);

    ProviderRepo::replace_all(&state.pool, &providers).await?;
    tracing::info!(count = providers.len(), "LLM providers saved");

    Ok(Json(DataResponse::list(providers)))
}
