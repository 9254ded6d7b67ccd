//! Prompt history model.

use std::fmt;

use promptvault_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Kind of content transition recorded in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOperation {
    Create,
    Update,
    Rollback,
}

impl HistoryOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Rollback => "rollback",
        }
    }
}

impl fmt::Display for HistoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row from the `prompt_histories` table. Rows are never updated.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PromptHistory {
    pub id: DbId,
    pub prompt_id: DbId,
    pub project_id: DbId,
    pub operation: String,
    pub old_content: String,
    pub new_content: String,
    pub created_at: Timestamp,
}
