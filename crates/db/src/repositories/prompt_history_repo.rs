//! Repository for the append-only `prompt_histories` table.

use promptvault_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::prompt_history::{HistoryOperation, PromptHistory};

const COLUMNS: &str = "id, prompt_id, project_id, operation, old_content, new_content, created_at";

/// Insert and read access only; history rows are never updated.
pub struct PromptHistoryRepo;

impl PromptHistoryRepo {
    /// Record a content transition for `prompt_id`.
    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        prompt_id: DbId,
        project_id: DbId,
        operation: HistoryOperation,
        old_content: &str,
        new_content: &str,
    ) -> Result<PromptHistory, sqlx::Error> {
        let query = format!(
            "INSERT INTO prompt_histories (prompt_id, project_id, operation, old_content, new_content)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PromptHistory>(&query)
            .bind(prompt_id)
            .bind(project_id)
            .bind(operation.as_str())
            .bind(old_content)
            .bind(new_content)
            .fetch_one(executor)
            .await
    }

    /// History of one prompt record, newest first.
    pub async fn list_for_prompt(
        pool: &PgPool,
        prompt_id: DbId,
    ) -> Result<Vec<PromptHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prompt_histories
             WHERE prompt_id = $1
             ORDER BY created_at DESC, id"
        );
        sqlx::query_as::<_, PromptHistory>(&query)
            .bind(prompt_id)
            .fetch_all(pool)
            .await
    }
}
