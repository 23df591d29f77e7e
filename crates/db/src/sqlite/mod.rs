//! SQLite-Backend-Implementierungen fuer alle Repository-Traits

pub mod cameras;
pub mod grants;
pub mod nvrs;
pub mod pool;
pub mod users;

pub use pool::SqliteDb;
