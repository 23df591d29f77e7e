//! opus-db – Datenbank-Abstraktion
//!
//! Dieses Crate stellt das Repository-Pattern bereit. Die Geschaeftslogik
//! spricht ausschliesslich gegen die Traits in [`repository`]; die
//! SQLite-Implementierung liegt in [`sqlite`] und wendet beim Oeffnen alle
//! eingebetteten Migrationen an.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::DbError;
pub use repository::{
    CameraRepository, DatabaseConfig, DbResult, GrantRepository, NvrRepository, UserRepository,
};
pub use sqlite::SqliteDb;
