//! Repository for the `categories` table.
//!
//! Prompts store the category name, so renames and deletes are propagated to
//! `prompts.category` in the same transaction.

use promptvault_core::types::DbId;
use promptvault_core::validation::DEFAULT_CATEGORY_COLOR;
use sqlx::{PgExecutor, PgPool};

use crate::models::category::{Category, CreateCategory, UpdateCategory};
use crate::repositories::PromptRepo;

const COLUMNS: &str = "id, name, color, created_at";

/// Provides CRUD operations for categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// Insert a new category. A duplicate name violates `uq_categories_name`.
    pub async fn create(pool: &PgPool, input: &CreateCategory) -> Result<Category, sqlx::Error> {
        let query = format!(
            "INSERT INTO categories (name, color) VALUES ($1, COALESCE($2, $3)) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(&input.name)
            .bind(&input.color)
            .bind(DEFAULT_CATEGORY_COLOR)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether a category with this exact name exists.
    pub async fn exists_by_name(pool: &PgPool, name: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE name = $1)")
            .bind(name)
            .fetch_one(pool)
            .await
    }

    /// List all categories, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories ORDER BY created_at DESC");
        sqlx::query_as::<_, Category>(&query).fetch_all(pool).await
    }

    /// Update name and/or color. A rename is carried over to prompts.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let old_name: Option<String> =
            sqlx::query_scalar("SELECT name FROM categories WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(old_name) = old_name else {
            return Ok(None);
        };

        let query = format!(
            "UPDATE categories SET
                name = COALESCE($2, name),
                color = COALESCE($3, color)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let category = sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.color)
            .fetch_one(&mut *tx)
            .await?;

        if category.name != old_name {
            PromptRepo::reassign_category(&mut *tx, &old_name, Some(&category.name)).await?;
        }

        tx.commit().await?;
        Ok(Some(category))
    }

    /// Delete a category and clear it from the prompts that used it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let name: Option<String> =
            sqlx::query_scalar("DELETE FROM categories WHERE id = $1 RETURNING name")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(name) = name else {
            return Ok(false);
        };

        PromptRepo::reassign_category(&mut *tx, &name, None).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Make sure a category called `name` exists (import).
    pub async fn ensure_exists<'e>(
        executor: impl PgExecutor<'e>,
        name: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO categories (name, color) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(DEFAULT_CATEGORY_COLOR)
        .execute(executor)
        .await?;
        Ok(())
    }
}
