//! Stored LLM provider rows.

use promptvault_core::provider::ProviderConfig;
use sqlx::FromRow;

/// A row from the `llm_providers` table.
#[derive(Debug, Clone, FromRow)]
pub struct LlmProviderRow {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub api_key: String,
    pub api_url: Option<String>,
    pub model: String,
    pub system_prompt: Option<String>,
    pub is_default: bool,
    pub sort_order: i32,
}

impl From<LlmProviderRow> for ProviderConfig {
    fn from(row: LlmProviderRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            provider: row.provider,
            api_key: row.api_key,
            api_url: row.api_url,
            model: row.model,
            system_prompt: row.system_prompt,
            is_default: row.is_default,
        }
    }
}
