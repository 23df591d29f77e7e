//! Fehlertypen fuer Benutzerverwaltung und Zugriffssteuerung

use opus_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    // --- Eingaben ---
    #[error("Validierungsfehler: {0}")]
    Validierung(String),

    #[error("Nicht gefunden: {0}")]
    NichtGefunden(String),

    // --- Authentifizierung ---
    #[error("Benutzername oder Passwort falsch")]
    UngueltigeAnmeldedaten,

    #[error("Das eigene Konto kann nicht geloescht werden")]
    SelbstLoeschung,

    // --- Passwort ---
    #[error("Passwort-Hashing fehlgeschlagen: {0}")]
    PasswortHashing(String),

    // --- Datenbank ---
    #[error("Datenbankfehler: {0}")]
    Datenbank(DbError),
}

impl AuthError {
    pub fn validierung(msg: impl Into<String>) -> Self {
        Self::Validierung(msg.into())
    }

    pub fn nicht_gefunden(msg: impl Into<String>) -> Self {
        Self::NichtGefunden(msg.into())
    }
}

impl From<DbError> for AuthError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Eindeutigkeit(msg) => Self::Validierung(msg),
            DbError::NichtGefunden(msg) | DbError::UngueltigeDaten(msg) => Self::NichtGefunden(msg),
            andere if andere.ist_eindeutigkeit() => Self::Validierung(andere.to_string()),
            andere => Self::Datenbank(andere),
        }
    }
}

/// Result-Alias fuer den Auth-Service
pub type AuthResult<T> = Result<T, AuthError>;
