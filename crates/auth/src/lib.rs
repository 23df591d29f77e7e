//! opus-auth – Benutzer und Zugriffssteuerung
//!
//! Dieses Crate implementiert:
//! - Passwort-Hashing mit Argon2id
//! - BenutzerService (Anlegen, Bearbeiten, Loeschen, Anmeldedaten pruefen,
//!   Standard-Admin)
//! - ZugriffService (sichtbare NVRs und Kameras je Benutzer, NVR-Freigaben)

pub mod benutzer_service;
pub mod error;
pub mod password;
pub mod zugriff;

pub use benutzer_service::{BenutzerPatch, BenutzerService};
pub use error::{AuthError, AuthResult};
pub use password::{passwort_hashen, passwort_verifizieren};
pub use zugriff::ZugriffService;
