//! SQLite-Implementierung des CameraRepository

use opus_core::{KameraId, NvrId};

use crate::error::DbError;
use crate::models::{KameraRecord, KameraUpdate, NeueKamera};
use crate::repository::{CameraRepository, DbResult};
use crate::sqlite::pool::SqliteDb;

const KAMERA_SPALTEN: &str =
    "id, name, display_name, rtsp_url, nvr_id, active, recording_enabled, notes";

impl CameraRepository for SqliteDb {
    async fn create(&self, data: NeueKamera<'_>) -> DbResult<KameraRecord> {
        let id = sqlx::query(
            "INSERT INTO cameras
             (name, display_name, rtsp_url, nvr_id, active, recording_enabled, notes)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(data.name)
        .bind(data.display_name)
        .bind(data.rtsp_url)
        .bind(data.nvr_id.map(|n| n.0))
        .bind(data.active as i64)
        .bind(data.recording_enabled as i64)
        .bind(data.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DbError::beim_schreiben(e, || format!("Stream-Name '{}' bereits vergeben", data.name))
        })?
        .last_insert_rowid();

        Ok(KameraRecord {
            id: KameraId(id),
            name: data.name.to_string(),
            display_name: data.display_name.to_string(),
            rtsp_url: data.rtsp_url.to_string(),
            nvr_id: data.nvr_id,
            active: data.active,
            recording_enabled: data.recording_enabled,
            notes: data.notes.map(str::to_string),
        })
    }

    async fn get_by_id(&self, id: KameraId) -> DbResult<Option<KameraRecord>> {
        let sql = format!("SELECT {KAMERA_SPALTEN} FROM cameras WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_kamera(&r)).transpose()
    }

    async fn get_by_name(&self, name: &str) -> DbResult<Option<KameraRecord>> {
        let sql = format!("SELECT {KAMERA_SPALTEN} FROM cameras WHERE name = ?");
        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_kamera(&r)).transpose()
    }

    async fn exists_by_name(&self, name: &str) -> DbResult<bool> {
        // SQLite vergleicht TEXT mit "=" standardmaessig binaer (BINARY-Collation)
        let gefunden: Option<i64> = sqlx::query_scalar("SELECT 1 FROM cameras WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(gefunden.is_some())
    }

    async fn list(&self) -> DbResult<Vec<KameraRecord>> {
        let sql = format!("SELECT {KAMERA_SPALTEN} FROM cameras ORDER BY name");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(row_to_kamera).collect()
    }

    async fn list_active(&self) -> DbResult<Vec<KameraRecord>> {
        let sql = format!("SELECT {KAMERA_SPALTEN} FROM cameras WHERE active = 1 ORDER BY name");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(row_to_kamera).collect()
    }

    async fn list_by_nvr(&self, nvr_id: NvrId) -> DbResult<Vec<KameraRecord>> {
        let sql = format!("SELECT {KAMERA_SPALTEN} FROM cameras WHERE nvr_id = ? ORDER BY name");
        let rows = sqlx::query(&sql)
            .bind(nvr_id.0)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_kamera).collect()
    }

    async fn count_by_nvr(&self, nvr_id: NvrId) -> DbResult<i64> {
        let anzahl: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cameras WHERE nvr_id = ?")
            .bind(nvr_id.0)
            .fetch_one(&self.pool)
            .await?;
        Ok(anzahl)
    }

    async fn update(&self, id: KameraId, data: KameraUpdate) -> DbResult<KameraRecord> {
        let mut sets: Vec<&str> = Vec::new();

        if data.name.is_some() {
            sets.push("name = ?");
        }
        if data.display_name.is_some() {
            sets.push("display_name = ?");
        }
        if data.rtsp_url.is_some() {
            sets.push("rtsp_url = ?");
        }
        if data.nvr_id.is_some() {
            sets.push("nvr_id = ?");
        }
        if data.active.is_some() {
            sets.push("active = ?");
        }
        if data.recording_enabled.is_some() {
            sets.push("recording_enabled = ?");
        }
        if data.notes.is_some() {
            sets.push("notes = ?");
        }

        if sets.is_empty() {
            return self
                .get_by_id(id)
                .await?
                .ok_or_else(|| DbError::nicht_gefunden(format!("Kamera {id}")));
        }

        let sql = format!("UPDATE cameras SET {} WHERE id = ?", sets.join(", "));
        let mut q = sqlx::query(&sql);

        if let Some(ref v) = data.name {
            q = q.bind(v);
        }
        if let Some(ref v) = data.display_name {
            q = q.bind(v);
        }
        if let Some(ref v) = data.rtsp_url {
            q = q.bind(v);
        }
        if let Some(v) = data.nvr_id {
            q = q.bind(v.map(|n| n.0));
        }
        if let Some(v) = data.active {
            q = q.bind(v as i64);
        }
        if let Some(v) = data.recording_enabled {
            q = q.bind(v as i64);
        }
        if let Some(ref v) = data.notes {
            q = q.bind(v.as_deref());
        }
        q = q.bind(id.0);

        let affected = q
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DbError::beim_schreiben(e, || {
                    format!(
                        "Stream-Name '{}' bereits vergeben",
                        data.name.as_deref().unwrap_or_default()
                    )
                })
            })?
            .rows_affected();
        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("Kamera {id}")));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::intern("Kamera nach Update nicht gefunden"))
    }

    async fn delete(&self, id: KameraId) -> DbResult<bool> {
        let affected = sqlx::query("DELETE FROM cameras WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

fn row_to_kamera(row: &sqlx::sqlite::SqliteRow) -> DbResult<KameraRecord> {
    use sqlx::Row as _;

    let nvr_id: Option<i64> = row.try_get("nvr_id")?;
    let active: i64 = row.try_get("active")?;
    let recording_enabled: i64 = row.try_get("recording_enabled")?;

    Ok(KameraRecord {
        id: KameraId(row.try_get("id")?),
        name: row.try_get("name")?,
        display_name: row.try_get("display_name")?,
        rtsp_url: row.try_get("rtsp_url")?,
        nvr_id: nvr_id.map(NvrId),
        active: active != 0,
        recording_enabled: recording_enabled != 0,
        notes: row.try_get("notes")?,
    })
}
