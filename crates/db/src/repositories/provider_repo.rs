//! Repository for the `llm_providers` table.

use promptvault_core::provider::ProviderConfig;
use sqlx::PgPool;

use crate::models::llm_provider::LlmProviderRow;

const COLUMNS: &str =
    "id, name, provider, api_key, api_url, model, system_prompt, is_default, sort_order";

/// The provider list is read whole and replaced whole.
pub struct ProviderRepo;

impl ProviderRepo {
    /// Stored providers in their saved order.
    pub async fn list(pool: &PgPool) -> Result<Vec<ProviderConfig>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM llm_providers ORDER BY sort_order, id");
        let rows = sqlx::query_as::<_, LlmProviderRow>(&query)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(ProviderConfig::from).collect())
    }

    /// Replace the stored list with `providers`, in order, atomically.
    ///
    /// Callers validate and normalize defaults first; the partial unique index
    /// on `is_default` rejects a list with more than one default.
    pub async fn replace_all(
        pool: &PgPool,
        providers: &[ProviderConfig],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM llm_providers")
            .execute(&mut *tx)
            .await?;

        for (sort_order, provider) in (0_i32..).zip(providers) {
            sqlx::query(
                "INSERT INTO llm_providers
                    (id, name, provider, api_key, api_url, model, system_prompt, is_default, sort_order)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(&provider.id)
            .bind(&provider.name)
            .bind(&provider.provider)
            .bind(&provider.api_key)
            .bind(&provider.api_url)
            .bind(&provider.model)
            .bind(&provider.system_prompt)
            .bind(provider.is_default)
            .bind(sort_order)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
