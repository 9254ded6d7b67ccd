//! Playground test-run history.

use std::collections::BTreeMap;

use promptvault_core::chat::ChatMessage;
use promptvault_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// A row from the `prompt_test_histories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TestHistory {
    pub id: DbId,
    pub prompt_id: DbId,
    pub project_id: DbId,
    pub title: Option<String>,
    pub messages: Json<Vec<ChatMessage>>,
    pub response: Option<String>,
    pub provider_id: Option<String>,
    pub provider_name: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<i32>,
    pub variable_values: Json<BTreeMap<String, String>>,
    pub variable_prefix: Option<String>,
    pub variable_suffix: Option<String>,
    pub token_count: Option<i64>,
    pub cost: Option<f64>,
    pub input_price: Option<f64>,
    pub output_price: Option<f64>,
    pub created_at: Timestamp,
}

/// Body of `POST /api/prompts/{id}/test-histories`.
///
/// The prompt and project ids come from the path and the stored prompt.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTestHistory {
    pub title: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub response: Option<String>,
    pub provider_id: Option<String>,
    pub provider_name: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<i32>,
    #[serde(default)]
    pub variable_values: BTreeMap<String, String>,
    pub variable_prefix: Option<String>,
    pub variable_suffix: Option<String>,
    pub token_count: Option<i64>,
    pub cost: Option<f64>,
    pub input_price: Option<f64>,
    pub output_price: Option<f64>,
}
