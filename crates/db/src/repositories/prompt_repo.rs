//! Repository for the `prompts` table.
//!
//! Writes that change content also write a history row; both happen in one
//! transaction.

use promptvault_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::prompt::{ImportedPrompt, NewPrompt, Prompt, PromptFilter, PromptMetadata};
use crate::models::prompt_history::HistoryOperation;
use crate::repositories::PromptHistoryRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, project_id, name, version, content, description, category, tag_ids, created_at";

/// Provides versioned writes and filtered reads for prompts.
pub struct PromptRepo;

impl PromptRepo {
    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Find a prompt record by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Prompt>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM prompts WHERE id = $1");
        sqlx::query_as::<_, Prompt>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's prompt records matching `filter`, newest first.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
        filter: &PromptFilter,
    ) -> Result<Vec<Prompt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prompts
             WHERE project_id = $1
               AND ($2::UUID IS NULL OR $2 = ANY(tag_ids))
               AND ($3::TEXT IS NULL OR version = $3)
               AND ($4::TEXT IS NULL OR name = $4)
               AND ($5::TEXT IS NULL OR category = $5)
               AND ($6::TIMESTAMPTZ IS NULL OR created_at >= $6)
               AND ($7::TIMESTAMPTZ IS NULL OR created_at <= $7)
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Prompt>(&query)
            .bind(project_id)
            .bind(filter.tag_id)
            .bind(&filter.version)
            .bind(&filter.name)
            .bind(&filter.category)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_all(pool)
            .await
    }

    /// Newest record of a lineage, optionally pinned to a version or tag.
    pub async fn find_latest(
        pool: &PgPool,
        project_id: DbId,
        name: &str,
        version: Option<&str>,
        tag_id: Option<DbId>,
    ) -> Result<Option<Prompt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prompts
             WHERE project_id = $1 AND name = $2
               AND ($3::TEXT IS NULL OR version = $3)
               AND ($4::UUID IS NULL OR $4 = ANY(tag_ids))
             ORDER BY created_at DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, Prompt>(&query)
            .bind(project_id)
            .bind(name)
            .bind(version)
            .bind(tag_id)
            .fetch_optional(pool)
            .await
    }

    /// Every version string stored for a lineage.
    pub async fn lineage_versions(
        pool: &PgPool,
        project_id: DbId,
        name: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT version FROM prompts WHERE project_id = $1 AND name = $2",
        )
        .bind(project_id)
        .bind(name)
        .fetch_all(pool)
        .await
    }

    /// All prompt records of the given projects, grouped by project, oldest first.
    pub async fn list_for_projects(
        pool: &PgPool,
        project_ids: &[DbId],
    ) -> Result<Vec<Prompt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prompts
             WHERE project_id = ANY($1)
             ORDER BY project_id, created_at"
        );
        sqlx::query_as::<_, Prompt>(&query)
            .bind(project_ids)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Versioned writes
    // -----------------------------------------------------------------------

    /// Insert a new record and its history entry atomically.
    ///
    /// `old_content` is the content the record supersedes (empty on create).
    pub async fn insert_version(
        pool: &PgPool,
        input: &NewPrompt,
        operation: HistoryOperation,
        old_content: &str,
    ) -> Result<Prompt, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO prompts
                (project_id, name, version, content, description, category, tag_ids)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let prompt = sqlx::query_as::<_, Prompt>(&query)
            .bind(input.project_id)
            .bind(&input.name)
            .bind(&input.version)
            .bind(&input.content)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.tag_ids)
            .fetch_one(&mut *tx)
            .await?;

        PromptHistoryRepo::insert(
            &mut *tx,
            prompt.id,
            prompt.project_id,
            operation,
            old_content,
            &prompt.content,
        )
        .await?;

        tx.commit().await?;
        Ok(prompt)
    }

    /// Replace content in place, keeping the version, and log an `update`.
    ///
    /// Metadata in `meta` is applied in the same statement. Returns `None`
    /// if the record does not exist.
    pub async fn replace_content(
        pool: &PgPool,
        id: DbId,
        content: &str,
        meta: &PromptMetadata,
    ) -> Result<Option<Prompt>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let old_content: Option<String> =
            sqlx::query_scalar("SELECT content FROM prompts WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(old_content) = old_content else {
            return Ok(None);
        };

        let query = format!(
            "UPDATE prompts SET
                content = $2,
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                tag_ids = COALESCE($5, tag_ids)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let prompt = sqlx::query_as::<_, Prompt>(&query)
            .bind(id)
            .bind(content)
            .bind(&meta.description)
            .bind(&meta.category)
            .bind(&meta.tag_ids)
            .fetch_one(&mut *tx)
            .await?;

        PromptHistoryRepo::insert(
            &mut *tx,
            prompt.id,
            prompt.project_id,
            HistoryOperation::Update,
            &old_content,
            content,
        )
        .await?;

        tx.commit().await?;
        Ok(Some(prompt))
    }

    /// Replace metadata in place. No history is written.
    pub async fn update_metadata(
        pool: &PgPool,
        id: DbId,
        meta: &PromptMetadata,
    ) -> Result<Option<Prompt>, sqlx::Error> {
        let query = format!(
            "UPDATE prompts SET
                description = COALESCE($2, description),
                category = COALESCE($3, category),
                tag_ids = COALESCE($4, tag_ids)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Prompt>(&query)
            .bind(id)
            .bind(&meta.description)
            .bind(&meta.category)
            .bind(&meta.tag_ids)
            .fetch_optional(pool)
            .await
    }

    /// Delete one prompt record. Its histories and test histories cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM prompts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Label maintenance
    // -----------------------------------------------------------------------

    /// Remove a tag id from every prompt carrying it. Returns rows touched.
    pub async fn pull_tag<'e>(
        executor: impl PgExecutor<'e>,
        tag_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE prompts SET tag_ids = array_remove(tag_ids, $1) WHERE $1 = ANY(tag_ids)",
        )
        .bind(tag_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Point prompts at a category's new name, or clear it with `None`.
    pub async fn reassign_category<'e>(
        executor: impl PgExecutor<'e>,
        from: &str,
        to: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE prompts SET category = $2 WHERE category = $1")
            .bind(from)
            .bind(to)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Import
    // -----------------------------------------------------------------------

    /// Insert or overwrite a record with a known id. No history is written.
    pub async fn upsert<'e>(
        executor: impl PgExecutor<'e>,
        input: &ImportedPrompt,
    ) -> Result<Prompt, sqlx::Error> {
        let query = format!(
            "INSERT INTO prompts
                (id, project_id, name, version, content, description, category, tag_ids, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (id) DO UPDATE SET
                project_id = EXCLUDED.project_id,
                name = EXCLUDED.name,
                version = EXCLUDED.version,
                content = EXCLUDED.content,
                description = EXCLUDED.description,
                category = EXCLUDED.category,
                tag_ids = EXCLUDED.tag_ids
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Prompt>(&query)
            .bind(input.id)
            .bind(input.project_id)
            .bind(&input.name)
            .bind(&input.version)
            .bind(&input.content)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.tag_ids)
            .bind(input.created_at)
            .fetch_one(executor)
            .await
    }
}
