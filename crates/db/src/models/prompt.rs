//! Prompt model and DTOs.
//!
//! A prompt row is one version of a lineage; the version string is resolved
//! by the caller before insert.

use promptvault_core::types::{DbId, Timestamp};
use promptvault_core::versioning::BumpKind;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `prompts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Prompt {
    pub id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub version: String,
    pub content: String,
    pub description: String,
    pub category: Option<String>,
    pub tag_ids: Vec<DbId>,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Body of `POST /api/projects/{id}/prompts`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePrompt {
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub tag_ids: Vec<DbId>,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Body of `PUT /api/prompts/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePrompt {
    pub content: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tag_ids: Option<Vec<DbId>>,
    #[serde(default)]
    pub bump: BumpKind,
}

// ---------------------------------------------------------------------------
// Repository inputs
// ---------------------------------------------------------------------------

/// A fully resolved prompt record ready for insert.
#[derive(Debug, Clone)]
pub struct NewPrompt {
    pub project_id: DbId,
    pub name: String,
    pub version: String,
    pub content: String,
    pub description: String,
    pub category: Option<String>,
    pub tag_ids: Vec<DbId>,
}

/// Metadata replaced in place. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct PromptMetadata {
    pub description: Option<String>,
    pub category: Option<String>,
    pub tag_ids: Option<Vec<DbId>>,
}

/// Filters for listing a project's prompts. Every filter is optional.
#[derive(Debug, Clone, Default)]
pub struct PromptFilter {
    pub tag_id: Option<DbId>,
    pub version: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
}

/// A prompt record restored from an import file, keeping its id and timestamp.
#[derive(Debug, Clone)]
pub struct ImportedPrompt {
    pub id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub version: String,
    pub content: String,
    pub description: String,
    pub category: Option<String>,
    pub tag_ids: Vec<DbId>,
    pub created_at: Timestamp,
}
