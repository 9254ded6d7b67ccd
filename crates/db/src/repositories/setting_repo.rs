//! Repository for the `settings` key/value table.

use sqlx::PgPool;

use crate::models::setting::{Setting, UpsertSetting};

const COLUMNS: &str = "key, value, description, created_at, updated_at";

pub struct SettingRepo;

impl SettingRepo {
    /// All settings, ordered by key.
    pub async fn list(pool: &PgPool) -> Result<Vec<Setting>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM settings ORDER BY key");
        sqlx::query_as::<_, Setting>(&query).fetch_all(pool).await
    }

    /// Upsert every entry in one transaction, returning the stored rows.
    pub async fn upsert_many(
        pool: &PgPool,
        entries: &[UpsertSetting],
    ) -> Result<Vec<Setting>, sqlx::Error> {
        let query = format!(
            "INSERT INTO settings (key, value, description)
             VALUES ($1, $2, $3)
             ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                description = COALESCE(EXCLUDED.description, settings.description),
                updated_at = NOW()
             RETURNING {COLUMNS}"
        );

        let mut tx = pool.begin().await?;
        let mut stored = Vec::with_capacity(entries.len());
        for entry in entries {
            let row = sqlx::query_as::<_, Setting>(&query)
                .bind(&entry.key)
                .bind(&entry.value)
                .bind(&entry.description)
                .fetch_one(&mut *tx)
                .await?;
            stored.push(row);
        }
        tx.commit().await?;
        Ok(stored)
    }
}
