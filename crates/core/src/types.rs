//! Gemeinsame Identifikationstypen fuer Opus
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen. Die Werte
//! entsprechen den INTEGER-Primaerschluesseln der Datenbank.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Eindeutige Benutzer-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Gibt den inneren Datenbankwert zurueck
    pub fn inner(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

/// Eindeutige NVR-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NvrId(pub i64);

impl NvrId {
    /// Gibt den inneren Datenbankwert zurueck
    pub fn inner(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for NvrId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "nvr:{}", self.0)
    }
}

/// Eindeutige Kamera-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KameraId(pub i64);

impl KameraId {
    /// Gibt den inneren Datenbankwert zurueck
    pub fn inner(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for KameraId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "kamera:{}", self.0)
    }
}

/// Rolle eines Benutzers
///
/// Admins sehen implizit alle NVRs und Kameras, Viewer nur explizit
/// freigegebene NVRs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rolle {
    Admin,
    #[default]
    Viewer,
}

impl Rolle {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Viewer => "viewer",
        }
    }

    pub fn ist_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Rolle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.als_str())
    }
}

/// Fehler beim Parsen einer Rolle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Rolle muss \"admin\" oder \"viewer\" sein, erhalten: \"{0}\"")]
pub struct RolleUngueltig(pub String);

impl std::str::FromStr for Rolle {
    type Err = RolleUngueltig;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "viewer" => Ok(Self::Viewer),
            other => Err(RolleUngueltig(other.to_string())),
        }
    }
}
