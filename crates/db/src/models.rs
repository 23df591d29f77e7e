//! Datenbankmodelle fuer Opus
//!
//! Diese Typen repraesentieren Datensaetze aus der Datenbank.
//! Sie sind von den Domain-Services getrennt und dienen als reine Datenuebertragungsobjekte.

use opus_core::{KameraId, NvrId, Rolle, UserId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Benutzer
// ---------------------------------------------------------------------------

/// Benutzer-Datensatz aus der Datenbank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenutzerRecord {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Rolle,
}

/// Daten zum Erstellen eines neuen Benutzers
#[derive(Debug, Clone)]
pub struct NeuerBenutzer<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub role: Rolle,
}

/// Daten zum Aktualisieren eines Benutzers
#[derive(Debug, Clone, Default)]
pub struct BenutzerUpdate {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Rolle>,
}

// ---------------------------------------------------------------------------
// NVRs
// ---------------------------------------------------------------------------

/// Standardanzahl Kanaele eines neuen NVR
pub const STANDARD_MAX_KANAELE: i64 = 50;

/// NVR-Datensatz aus der Datenbank
///
/// `name` ist der URL-sichere Slug, der als Praefix fuer alle abgeleiteten
/// Stream-Namen dient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NvrRecord {
    pub id: NvrId,
    pub name: String,
    pub display_name: String,
    pub ip_address: Option<String>,
    pub username: Option<String>,
    /// Wird nie serialisiert, auch nicht in Listenansichten
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    pub max_channels: i64,
    pub active: bool,
}

/// Daten zum Erstellen eines neuen NVR
#[derive(Debug, Clone)]
pub struct NeuerNvr<'a> {
    pub name: &'a str,
    pub display_name: &'a str,
    pub ip_address: Option<&'a str>,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    pub max_channels: i64,
    pub active: bool,
}

impl Default for NeuerNvr<'_> {
    fn default() -> Self {
        Self {
            name: "",
            display_name: "",
            ip_address: None,
            username: None,
            password: None,
            max_channels: STANDARD_MAX_KANAELE,
            active: true,
        }
    }
}

/// Daten zum Aktualisieren eines NVR
#[derive(Debug, Clone, Default)]
pub struct NvrUpdate {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub ip_address: Option<Option<String>>,
    pub username: Option<Option<String>>,
    pub password: Option<Option<String>>,
    pub max_channels: Option<i64>,
    pub active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Kameras
// ---------------------------------------------------------------------------

/// Kamera-Datensatz aus der Datenbank
///
/// `name` ist gleichzeitig der Schluessel in der Stream-Registry des Daemons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KameraRecord {
    pub id: KameraId,
    pub name: String,
    pub display_name: String,
    pub rtsp_url: String,
    pub nvr_id: Option<NvrId>,
    pub active: bool,
    pub recording_enabled: bool,
    pub notes: Option<String>,
}

/// Daten zum Erstellen einer neuen Kamera
#[derive(Debug, Clone)]
pub struct NeueKamera<'a> {
    pub name: &'a str,
    pub display_name: &'a str,
    pub rtsp_url: &'a str,
    pub nvr_id: Option<NvrId>,
    pub active: bool,
    pub recording_enabled: bool,
    pub notes: Option<&'a str>,
}

impl Default for NeueKamera<'_> {
    fn default() -> Self {
        Self {
            name: "",
            display_name: "",
            rtsp_url: "",
            nvr_id: None,
            active: true,
            recording_enabled: false,
            notes: None,
        }
    }
}

/// Daten zum Aktualisieren einer Kamera
#[derive(Debug, Clone, Default)]
pub struct KameraUpdate {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub rtsp_url: Option<String>,
    pub nvr_id: Option<Option<NvrId>>,
    pub active: Option<bool>,
    pub recording_enabled: Option<bool>,
    pub notes: Option<Option<String>>,
}

impl KameraUpdate {
    /// Gibt true zurueck wenn kein Feld gesetzt ist
    pub fn ist_leer(&self) -> bool {
        self.name.is_none()
            && self.display_name.is_none()
            && self.rtsp_url.is_none()
            && self.nvr_id.is_none()
            && self.active.is_none()
            && self.recording_enabled.is_none()
            && self.notes.is_none()
    }
}
