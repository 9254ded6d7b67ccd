//! Key/value settings.

use promptvault_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One posted setting. `description` is kept when omitted on update.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertSetting {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}
