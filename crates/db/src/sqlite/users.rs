//! SQLite-Implementierung des UserRepository

use opus_core::{Rolle, UserId};

use crate::error::DbError;
use crate::models::{BenutzerRecord, BenutzerUpdate, NeuerBenutzer};
use crate::repository::{DbResult, UserRepository};
use crate::sqlite::pool::SqliteDb;

impl UserRepository for SqliteDb {
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
        let id = sqlx::query("INSERT INTO users (username, password_hash, role) VALUES (?, ?, ?)")
            .bind(data.username)
            .bind(data.password_hash)
            .bind(data.role.als_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DbError::beim_schreiben(e, || {
                    format!("Benutzername '{}' bereits vergeben", data.username)
                })
            })?
            .last_insert_rowid();

        Ok(BenutzerRecord {
            id: UserId(id),
            username: data.username.to_string(),
            password_hash: data.password_hash.to_string(),
            role: data.role,
        })
    }

    async fn get_by_id(&self, id: UserId) -> DbResult<Option<BenutzerRecord>> {
        let row = sqlx::query("SELECT id, username, password_hash, role FROM users WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn get_by_name(&self, username: &str) -> DbResult<Option<BenutzerRecord>> {
        let row =
            sqlx::query("SELECT id, username, password_hash, role FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn list(&self) -> DbResult<Vec<BenutzerRecord>> {
        let rows =
            sqlx::query("SELECT id, username, password_hash, role FROM users ORDER BY username")
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(row_to_benutzer).collect()
    }

    async fn update(&self, id: UserId, data: BenutzerUpdate) -> DbResult<BenutzerRecord> {
        // Dynamisches UPDATE – nur gesetzte Felder aendern
        let mut sets: Vec<&str> = Vec::new();
        if data.username.is_some() {
            sets.push("username = ?");
        }
        if data.password_hash.is_some() {
            sets.push("password_hash = ?");
        }
        if data.role.is_some() {
            sets.push("role = ?");
        }

        if sets.is_empty() {
            return self
                .get_by_id(id)
                .await?
                .ok_or_else(|| DbError::nicht_gefunden(format!("User {id}")));
        }

        let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
        let mut q = sqlx::query(&sql);

        if let Some(ref v) = data.username {
            q = q.bind(v);
        }
        if let Some(ref v) = data.password_hash {
            q = q.bind(v);
        }
        if let Some(v) = data.role {
            q = q.bind(v.als_str());
        }
        q = q.bind(id.0);

        let affected = q
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DbError::beim_schreiben(e, || {
                    format!(
                        "Benutzername '{}' bereits vergeben",
                        data.username.as_deref().unwrap_or_default()
                    )
                })
            })?
            .rows_affected();
        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("User {id}")));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::intern("User nach Update nicht gefunden"))
    }

    async fn delete(&self, id: UserId) -> DbResult<bool> {
        let affected = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn count(&self) -> DbResult<i64> {
        let anzahl: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(anzahl)
    }
}

fn row_to_benutzer(row: &sqlx::sqlite::SqliteRow) -> DbResult<BenutzerRecord> {
    use sqlx::Row as _;

    let role_str: String = row.try_get("role")?;
    let role = role_str
        .parse::<Rolle>()
        .map_err(|e| DbError::intern(e.to_string()))?;

    Ok(BenutzerRecord {
        id: UserId(row.try_get("id")?),
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role,
    })
}
