//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable, die Vorrang vor der Konfigurationsdatei hat:
//! - `OPUS_LOG_LEVEL`: Filter-Direktive (z.B. `info` oder `opus_streams=debug,info`)
//! - `OPUS_LOG_FORMAT`: `text` oder `json`

use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "OPUS_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "OPUS_LOG_FORMAT";

/// Initialisiert das Logging-System.
///
/// Darf nur einmal pro Prozess aufgerufen werden.
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = EnvFilter::try_from_env(ENV_LOG_LEVEL)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match log_format_waehlen(std::env::var(ENV_LOG_FORMAT).ok().as_deref(), format) {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_current_span(true)
                .init();
        }
        _ => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Umgebung vor Konfiguration; unbekannte Formate fallen auf `text` zurueck
fn log_format_waehlen<'a>(aus_env: Option<&'a str>, konfiguriert: &'a str) -> &'a str {
    let gewaehlt = aus_env.unwrap_or(konfiguriert);
    if log_format_gueltig(gewaehlt) {
        gewaehlt
    } else {
        "text"
    }
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}
