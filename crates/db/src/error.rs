//! Fehlertypen fuer das Datenbank-Crate

use thiserror::Error;

/// Datenbank-Fehlertypen
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Datensatz nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error("Eindeutigkeitsverletzung: {0}")]
    Eindeutigkeit(String),

    #[error("Ungueltige Daten: {0}")]
    UngueltigeDaten(String),

    #[error("SQLx-Fehler: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration-Fehler: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Interner DB-Fehler: {0}")]
    Intern(String),
}

impl DbError {
    pub fn nicht_gefunden(msg: impl Into<String>) -> Self {
        Self::NichtGefunden(msg.into())
    }

    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn es sich um einen Eindeutigkeitsfehler handelt
    pub fn ist_eindeutigkeit(&self) -> bool {
        match self {
            Self::Eindeutigkeit(_) => true,
            Self::Sqlx(e) => ist_unique_verletzung(e),
            _ => false,
        }
    }

    /// Uebersetzt einen SQLx-Fehler beim Schreiben in einen fachlichen Fehler
    ///
    /// UNIQUE-Verletzungen werden zu `Eindeutigkeit`, FOREIGN-KEY-Verletzungen
    /// zu `UngueltigeDaten`. Alles andere bleibt ein `Sqlx`-Fehler.
    pub(crate) fn beim_schreiben(e: sqlx::Error, kontext: impl FnOnce() -> String) -> Self {
        if ist_unique_verletzung(&e) {
            return Self::Eindeutigkeit(kontext());
        }
        let fk = e
            .as_database_error()
            .map(|d| d.is_foreign_key_violation())
            .unwrap_or(false);
        if fk {
            return Self::UngueltigeDaten(format!("{} (Referenz existiert nicht)", kontext()));
        }
        Self::Sqlx(e)
    }
}

fn ist_unique_verletzung(e: &sqlx::Error) -> bool {
    match e.as_database_error() {
        Some(d) => d.is_unique_violation() || d.message().contains("UNIQUE"),
        None => false,
    }
}
