//! opus-core – Gemeinsame Typen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Opus-Crates gemeinsam genutzt werden: typisierte IDs und die
//! Benutzerrolle.

pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use types::{KameraId, NvrId, Rolle, RolleUngueltig, UserId};
