//! Repository for the `projects` table.

use promptvault_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::contains_pattern;
use crate::models::project::{CreateProject, Project, PromptSummary, UpdateProject};
use crate::models::tag::Tag;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, description, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (name, description)
             VALUES ($1, COALESCE($2, ''))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// Find a project by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the given projects, newest first. Unknown ids are ignored.
    pub async fn find_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects WHERE id = ANY($1) ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// List projects newest first.
    ///
    /// `search` matches name or description, case-insensitively.
    pub async fn list(pool: &PgPool, search: Option<&str>) -> Result<Vec<Project>, sqlx::Error> {
        let pattern = search.filter(|s| !s.is_empty()).map(contains_pattern);
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE ($1::TEXT IS NULL OR name ILIKE $1 OR description ILIKE $1)
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(pattern)
            .fetch_all(pool)
            .await
    }

    /// Update name and/or description and bump `updated_at`.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Delete a project. Prompts, histories and test histories cascade.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert or overwrite a project with a known id (import).
    pub async fn upsert<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        name: &str,
        description: &str,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (id, name, description, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                updated_at = EXCLUDED.updated_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(name)
            .bind(description)
            .bind(created_at)
            .bind(updated_at)
            .fetch_one(executor)
            .await
    }

    // -----------------------------------------------------------------------
    // Aggregates shown alongside a project
    // -----------------------------------------------------------------------

    /// Every prompt record of the project, newest first.
    pub async fn prompt_summaries(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<PromptSummary>, sqlx::Error> {
        sqlx::query_as::<_, PromptSummary>(
            "SELECT id, project_id, name, version, created_at FROM prompts
             WHERE project_id = $1
             ORDER BY created_at DESC",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Distinct tags attached to any prompt of the project, by name.
    pub async fn tags_in_use(pool: &PgPool, project_id: DbId) -> Result<Vec<Tag>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.name, t.color, t.created_at FROM tags t
             WHERE EXISTS (
                SELECT 1 FROM prompts p
                WHERE p.project_id = $1 AND t.id = ANY(p.tag_ids)
             )
             ORDER BY t.name",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }
}
