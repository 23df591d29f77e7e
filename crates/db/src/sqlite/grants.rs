//! SQLite-Implementierung des GrantRepository (user_nvrs)

use opus_core::{NvrId, UserId};

use crate::error::DbError;
use crate::repository::{DbResult, GrantRepository};
use crate::sqlite::pool::SqliteDb;

impl GrantRepository for SqliteDb {
    async fn list_for_user(&self, user_id: UserId) -> DbResult<Vec<NvrId>> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT nvr_id FROM user_nvrs WHERE user_id = ? ORDER BY nvr_id")
                .bind(user_id.0)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids.into_iter().map(NvrId).collect())
    }

    async fn replace_for_user(&self, user_id: UserId, nvr_ids: &[NvrId]) -> DbResult<()> {
        // Alles-loeschen-dann-einfuegen in einer Transaktion: entweder der
        // komplette neue Satz oder der alte bleibt bestehen
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_nvrs WHERE user_id = ?")
            .bind(user_id.0)
            .execute(&mut *tx)
            .await?;

        for nvr_id in nvr_ids {
            sqlx::query("INSERT OR IGNORE INTO user_nvrs (user_id, nvr_id) VALUES (?, ?)")
                .bind(user_id.0)
                .bind(nvr_id.0)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    DbError::beim_schreiben(e, || format!("Freigabe {user_id} -> {nvr_id}"))
                })?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn count_for_nvr(&self, nvr_id: NvrId) -> DbResult<i64> {
        let anzahl: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_nvrs WHERE nvr_id = ?")
            .bind(nvr_id.0)
            .fetch_one(&self.pool)
            .await?;
        Ok(anzahl)
    }
}
