//! Repository for the `tags` table.

use promptvault_core::types::{DbId, Timestamp};
use promptvault_core::validation::DEFAULT_TAG_COLOR;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::tag::{CreateTag, Tag, UpdateTag};
use crate::repositories::PromptRepo;

const COLUMNS: &str = "id, name, color, created_at";

/// Provides CRUD operations for tags.
pub struct TagRepo;

impl TagRepo {
    /// Insert a new tag. A duplicate name violates `uq_tags_name`.
    pub async fn create(pool: &PgPool, input: &CreateTag) -> Result<Tag, sqlx::Error> {
        let query = format!(
            "INSERT INTO tags (name, color) VALUES ($1, COALESCE($2, $3)) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(&input.name)
            .bind(&input.color)
            .bind(DEFAULT_TAG_COLOR)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags WHERE id = $1");
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags WHERE name = $1");
        sqlx::query_as::<_, Tag>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Fetch the tags with the given ids. Missing ids are simply absent.
    pub async fn find_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Tag>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("SELECT {COLUMNS} FROM tags WHERE id = ANY($1) ORDER BY name");
        sqlx::query_as::<_, Tag>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// List all tags, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags ORDER BY created_at DESC");
        sqlx::query_as::<_, Tag>(&query).fetch_all(pool).await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTag,
    ) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!(
            "UPDATE tags SET
                name = COALESCE($2, name),
                color = COALESCE($3, color)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.color)
            .fetch_optional(pool)
            .await
    }

    /// Delete a tag and pull its id out of every prompt.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        let detached = PromptRepo::pull_tag(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::debug!(tag_id = %id, detached, "Tag removed from prompts");
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Import
    // -----------------------------------------------------------------------

    /// Store an imported tag and return the row prompts should point at.
    ///
    /// A tag already called `name` wins, whatever its id. Otherwise the tag
    /// is inserted with `id`, or the row with that id is renamed.
    pub async fn upsert(
        conn: &mut PgConnection,
        id: DbId,
        name: &str,
        color: Option<&str>,
        created_at: Timestamp,
    ) -> Result<Tag, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags WHERE name = $1");
        let existing = sqlx::query_as::<_, Tag>(&query)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
        if let Some(tag) = existing {
            if tag.id != id {
                tracing::debug!(imported_id = %id, tag_id = %tag.id, name, "Imported tag matched by name");
            }
            return Ok(tag);
        }

        let query = format!(
            "INSERT INTO tags (id, name, color, created_at)
             VALUES ($1, $2, COALESCE($3, $4), $5)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                color = EXCLUDED.color
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .bind(name)
            .bind(color)
            .bind(DEFAULT_TAG_COLOR)
            .bind(created_at)
            .fetch_one(&mut *conn)
            .await
    }

    /// Return the tag called `name`, creating it with `color` if absent.
    pub async fn find_or_create<'e>(
        executor: impl PgExecutor<'e>,
        name: &str,
        color: Option<&str>,
    ) -> Result<Tag, sqlx::Error> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let query = format!(
            "INSERT INTO tags (name, color) VALUES ($1, COALESCE($2, $3))
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(name)
            .bind(color)
            .bind(DEFAULT_TAG_COLOR)
            .fetch_one(executor)
            .await
    }
}
