//! SQLite-Implementierung des NvrRepository

use opus_core::NvrId;

use crate::error::DbError;
use crate::models::{NeuerNvr, NvrRecord, NvrUpdate};
use crate::repository::{DbResult, NvrRepository};
use crate::sqlite::pool::SqliteDb;

const NVR_SPALTEN: &str =
    "id, name, display_name, ip_address, username, password, max_channels, active";

impl NvrRepository for SqliteDb {
    async fn create(&self, data: NeuerNvr<'_>) -> DbResult<NvrRecord> {
        if data.max_channels < 1 {
            return Err(DbError::UngueltigeDaten(format!(
                "max_channels muss mindestens 1 sein, erhalten: {}",
                data.max_channels
            )));
        }

        let id = sqlx::query(
            "INSERT INTO nvrs
             (name, display_name, ip_address, username, password, max_channels, active)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(data.name)
        .bind(data.display_name)
        .bind(data.ip_address)
        .bind(data.username)
        .bind(data.password)
        .bind(data.max_channels)
        .bind(data.active as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DbError::beim_schreiben(e, || format!("NVR-Name '{}' bereits vergeben", data.name))
        })?
        .last_insert_rowid();

        Ok(NvrRecord {
            id: NvrId(id),
            name: data.name.to_string(),
            display_name: data.display_name.to_string(),
            ip_address: data.ip_address.map(str::to_string),
            username: data.username.map(str::to_string),
            password: data.password.map(str::to_string),
            max_channels: data.max_channels,
            active: data.active,
        })
    }

    async fn get_by_id(&self, id: NvrId) -> DbResult<Option<NvrRecord>> {
        let sql = format!("SELECT {NVR_SPALTEN} FROM nvrs WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_nvr(&r)).transpose()
    }

    async fn get_by_name(&self, name: &str) -> DbResult<Option<NvrRecord>> {
        let sql = format!("SELECT {NVR_SPALTEN} FROM nvrs WHERE name = ?");
        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_nvr(&r)).transpose()
    }

    async fn list(&self) -> DbResult<Vec<NvrRecord>> {
        let sql = format!("SELECT {NVR_SPALTEN} FROM nvrs ORDER BY id");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(row_to_nvr).collect()
    }

    async fn list_ids(&self) -> DbResult<Vec<NvrId>> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM nvrs ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().map(NvrId).collect())
    }

    async fn exists(&self, id: NvrId) -> DbResult<bool> {
        let gefunden: Option<i64> = sqlx::query_scalar("SELECT 1 FROM nvrs WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(gefunden.is_some())
    }

    async fn update(&self, id: NvrId, data: NvrUpdate) -> DbResult<NvrRecord> {
        if let Some(max) = data.max_channels {
            if max < 1 {
                return Err(DbError::UngueltigeDaten(format!(
                    "max_channels muss mindestens 1 sein, erhalten: {max}"
                )));
            }
        }

        let mut sets: Vec<&str> = Vec::new();
        if data.name.is_some() {
            sets.push("name = ?");
        }
        if data.display_name.is_some() {
            sets.push("display_name = ?");
        }
        if data.ip_address.is_some() {
            sets.push("ip_address = ?");
        }
        if data.username.is_some() {
            sets.push("username = ?");
        }
        if data.password.is_some() {
            sets.push("password = ?");
        }
        if data.max_channels.is_some() {
            sets.push("max_channels = ?");
        }
        if data.active.is_some() {
            sets.push("active = ?");
        }

        if sets.is_empty() {
            return self
                .get_by_id(id)
                .await?
                .ok_or_else(|| DbError::nicht_gefunden(format!("NVR {id}")));
        }

        let sql = format!("UPDATE nvrs SET {} WHERE id = ?", sets.join(", "));
        let mut q = sqlx::query(&sql);

        if let Some(ref v) = data.name {
            q = q.bind(v);
        }
        if let Some(ref v) = data.display_name {
            q = q.bind(v);
        }
        if let Some(ref v) = data.ip_address {
            q = q.bind(v.as_deref());
        }
        if let Some(ref v) = data.username {
            q = q.bind(v.as_deref());
        }
        if let Some(ref v) = data.password {
            q = q.bind(v.as_deref());
        }
        if let Some(v) = data.max_channels {
            q = q.bind(v);
        }
        if let Some(v) = data.active {
            q = q.bind(v as i64);
        }
        q = q.bind(id.0);

        let affected = q
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DbError::beim_schreiben(e, || {
                    format!(
                        "NVR-Name '{}' bereits vergeben",
                        data.name.as_deref().unwrap_or_default()
                    )
                })
            })?
            .rows_affected();
        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("NVR {id}")));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::intern("NVR nach Update nicht gefunden"))
    }

    async fn delete(&self, id: NvrId) -> DbResult<bool> {
        let affected = sqlx::query("DELETE FROM nvrs WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

fn row_to_nvr(row: &sqlx::sqlite::SqliteRow) -> DbResult<NvrRecord> {
    use sqlx::Row as _;

    let active: i64 = row.try_get("active")?;

    Ok(NvrRecord {
        id: NvrId(row.try_get("id")?),
        name: row.try_get("name")?,
        display_name: row.try_get("display_name")?,
        ip_address: row.try_get("ip_address")?,
        username: row.try_get("username")?,
        password: row.try_get("password")?,
        max_channels: row.try_get("max_channels")?,
        active: active != 0,
    })
}
