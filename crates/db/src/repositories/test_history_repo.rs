//! Repository for the `prompt_test_histories` table.

use promptvault_core::types::DbId;
use sqlx::{PgExecutor, PgPool};
use sqlx::types::Json;

use crate::models::test_history::{CreateTestHistory, TestHistory};

const COLUMNS: &str = "id, prompt_id, project_id, title, messages, response, provider_id, \
    provider_name, model, temperature, top_p, max_tokens, variable_values, variable_prefix, \
    variable_suffix, token_count, cost, input_price, output_price, created_at";

/// Provides insert, list and delete for playground test runs.
pub struct TestHistoryRepo;

impl TestHistoryRepo {
    /// Test runs of one prompt record, newest first.
    pub async fn list_for_prompt(
        pool: &PgPool,
        prompt_id: DbId,
    ) -> Result<Vec<TestHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prompt_test_histories
             WHERE prompt_id = $1
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, TestHistory>(&query)
            .bind(prompt_id)
            .fetch_all(pool)
            .await
    }

    /// Insert a run and trim the prompt's runs to the newest `keep`.
    pub async fn insert_with_retention(
        pool: &PgPool,
        prompt_id: DbId,
        project_id: DbId,
        input: &CreateTestHistory,
        keep: i64,
    ) -> Result<TestHistory, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO prompt_test_histories
                (prompt_id, project_id, title, messages, response, provider_id, provider_name,
                 model, temperature, top_p, max_tokens, variable_values, variable_prefix,
                 variable_suffix, token_count, cost, input_price, output_price)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
             RETURNING {COLUMNS}"
        );
        let record = sqlx::query_as::<_, TestHistory>(&query)
            .bind(prompt_id)
            .bind(project_id)
            .bind(&input.title)
            .bind(Json(&input.messages))
            .bind(&input.response)
            .bind(&input.provider_id)
            .bind(&input.provider_name)
            .bind(&input.model)
            .bind(input.temperature)
            .bind(input.top_p)
            .bind(input.max_tokens)
            .bind(Json(&input.variable_values))
            .bind(&input.variable_prefix)
            .bind(&input.variable_suffix)
            .bind(input.token_count)
            .bind(input.cost)
            .bind(input.input_price)
            .bind(input.output_price)
            .fetch_one(&mut *tx)
            .await?;

        let evicted = Self::trim_for_prompt(&mut *tx, prompt_id, keep).await?;
        tx.commit().await?;

        if evicted > 0 {
            tracing::debug!(prompt_id = %prompt_id, evicted, "Trimmed test histories");
        }
        Ok(record)
    }

    /// Delete all but the newest `keep` runs of a prompt. Returns rows removed.
    pub async fn trim_for_prompt<'e>(
        executor: impl PgExecutor<'e>,
        prompt_id: DbId,
        keep: i64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM prompt_test_histories WHERE id IN (
                SELECT id FROM prompt_test_histories
                WHERE prompt_id = $1
                ORDER BY created_at DESC
                OFFSET $2
             )",
        )
        .bind(prompt_id)
        .bind(keep.max(0))
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM prompt_test_histories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
