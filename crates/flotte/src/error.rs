//! Fehlertypen fuer die Flotten-Verwaltung

use opus_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlotteError {
    #[error("Validierungsfehler: {0}")]
    Validierung(String),

    #[error("Nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error("Datenbankfehler: {0}")]
    Datenbank(DbError),
}

impl FlotteError {
    pub fn validierung(msg: impl Into<String>) -> Self {
        Self::Validierung(msg.into())
    }

    pub fn nicht_gefunden(msg: impl Into<String>) -> Self {
        Self::NichtGefunden(msg.into())
    }
}

/// Konflikte, die erst die Datenbank erkennt, sind fuer den Aufrufer
/// Validierungsfehler wie die Vorabpruefung im Service
impl From<DbError> for FlotteError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Eindeutigkeit(msg) | DbError::UngueltigeDaten(msg) => Self::Validierung(msg),
            DbError::NichtGefunden(msg) => Self::NichtGefunden(msg),
            andere if andere.ist_eindeutigkeit() => Self::Validierung(andere.to_string()),
            andere => Self::Datenbank(andere),
        }
    }
}

pub type FlotteResult<T> = Result<T, FlotteError>;
