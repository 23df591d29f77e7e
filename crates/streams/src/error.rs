//! Fehlertypen fuer die Daemon-Anbindung und den Aufnahme-Katalog

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("HTTP-Fehler: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Daemon antwortete mit Status {status}: {nachricht}")]
    Status { status: u16, nachricht: String },

    #[error("Ungueltige Antwort des Daemons: {0}")]
    Antwort(String),

    // --- Aufnahme-Katalog ---
    #[error("Ungueltiger Pfad: {0}")]
    UngueltigerPfad(String),

    #[error("Aufnahme nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error("Dateisystem-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

/// Result-Alias fuer Daemon- und Katalog-Operationen
pub type StreamResult<T> = Result<T, StreamError>;
