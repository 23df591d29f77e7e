//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist. `GO2RTC_URL` und `RECORDINGS_DIR` ueberschreiben die
//! entsprechenden Werte aus der Datei.

use std::time::Duration;

use opus_db::DatabaseConfig;
use opus_streams::AufnahmeAbschaltung;
use serde::{Deserialize, Serialize};

pub const ENV_DAEMON_URL: &str = "GO2RTC_URL";
pub const ENV_AUFNAHMEN: &str = "RECORDINGS_DIR";

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpusConfig {
    pub server: ServerEinstellungen,
    pub datenbank: DatenbankEinstellungen,
    /// Stream-Daemon und Aufzeichnung
    pub streams: StreamEinstellungen,
    /// Zugangsdaten fuer den ersten Admin auf leerer Datenbank
    pub admin: AdminEinstellungen,
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Health)
    pub observability: ObservabilityEinstellungen,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename der Installation
    pub name: String,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Opus NVR".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
    pub wal: bool,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        Self {
            url: "sqlite://opus.db".into(),
            max_verbindungen: 5,
            wal: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamEinstellungen {
    /// Basis-URL der go2rtc-API
    pub daemon_url: String,
    /// Timeout je Daemon-Aufruf
    pub timeout_sekunden: u64,
    /// Wurzel der Aufnahmen, wie der Daemon sie sieht
    pub aufnahmen_verzeichnis: String,
    /// Verhalten beim Ausschalten der Aufzeichnung: "belassen" oder "abmelden"
    pub aufnahme_abschalten: AufnahmeAbschaltung,
}

impl Default for StreamEinstellungen {
    fn default() -> Self {
        Self {
            daemon_url: "http://go2rtc:1984".into(),
            timeout_sekunden: 3,
            aufnahmen_verzeichnis: "/recordings".into(),
            aufnahme_abschalten: AufnahmeAbschaltung::Belassen,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminEinstellungen {
    pub standard_benutzer: String,
    pub standard_passwort: String,
}

impl Default for AdminEinstellungen {
    fn default() -> Self {
        Self {
            standard_benutzer: "admin".into(),
            standard_passwort: "admin".into(),
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den Health-Server
    pub aktiviert: bool,
    pub bind_adresse: String,
    /// Port fuer Health (Standard: 9300)
    pub port: u16,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            bind_adresse: "0.0.0.0".into(),
            port: 9300,
        }
    }
}

impl OpusConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei und wendet die
    /// Umgebungsvariablen an.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let mut config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };

        config.umgebung_anwenden(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Ueberschreibt Daemon-URL und Aufnahme-Verzeichnis aus der Umgebung
    pub fn umgebung_anwenden(&mut self, lesen: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lesen(ENV_DAEMON_URL).filter(|v| !v.is_empty()) {
            self.streams.daemon_url = url;
        }
        if let Some(verzeichnis) = lesen(ENV_AUFNAHMEN).filter(|v| !v.is_empty()) {
            self.streams.aufnahmen_verzeichnis = verzeichnis;
        }
    }

    pub fn datenbank_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.datenbank.url.clone(),
            max_verbindungen: self.datenbank.max_verbindungen,
            sqlite_wal: self.datenbank.wal,
            ..Default::default()
        }
    }

    pub fn daemon_timeout(&self) -> Duration {
        Duration::from_secs(self.streams.timeout_sekunden)
    }

    /// Gibt die Bind-Adresse fuer den Observability-Server zurueck
    pub fn observability_bind_adresse(&self) -> String {
        format!(
            "{}:{}",
            self.observability.bind_adresse, self.observability.port
        )
    }
}
