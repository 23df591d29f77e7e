//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Geschaeftslogik von der konkreten
//! Datenbank-Implementierung. Eindeutigkeit von Namen wird ausschliesslich
//! ueber die UNIQUE-Indizes der Datenbank garantiert; Existenzpruefungen in
//! den Services sind nur ein schneller Vorabtest.

use opus_core::{KameraId, NvrId, UserId};

use crate::error::DbError;
use crate::models::{
    BenutzerRecord, BenutzerUpdate, KameraRecord, KameraUpdate, NeueKamera, NeuerBenutzer,
    NeuerNvr, NvrRecord, NvrUpdate,
};

/// Result-Alias fuer alle Repository-Operationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://opus.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus aktiviert werden soll
    pub sqlite_wal: bool,
    /// Wie lange ein Schreiber auf die Schreibsperre wartet (Sekunden)
    pub busy_timeout_sekunden: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://opus.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
            busy_timeout_sekunden: 5,
        }
    }
}

/// Repository fuer Benutzer-Datenzugriffe
#[allow(async_fn_in_trait)]
pub trait UserRepository: Send + Sync {
    /// Einen neuen Benutzer anlegen
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord>;

    /// Einen Benutzer anhand seiner ID laden
    async fn get_by_id(&self, id: UserId) -> DbResult<Option<BenutzerRecord>>;

    /// Einen Benutzer anhand seines Namens laden
    async fn get_by_name(&self, username: &str) -> DbResult<Option<BenutzerRecord>>;

    /// Alle Benutzer, sortiert nach Benutzername
    async fn list(&self) -> DbResult<Vec<BenutzerRecord>>;

    /// Gesetzte Felder aktualisieren
    async fn update(&self, id: UserId, data: BenutzerUpdate) -> DbResult<BenutzerRecord>;

    /// Einen Benutzer loeschen (Freigaben werden per Kaskade entfernt)
    async fn delete(&self, id: UserId) -> DbResult<bool>;

    /// Anzahl aller Benutzer
    async fn count(&self) -> DbResult<i64>;
}

/// Repository fuer NVR-Datenzugriffe
#[allow(async_fn_in_trait)]
pub trait NvrRepository: Send + Sync {
    async fn create(&self, data: NeuerNvr<'_>) -> DbResult<NvrRecord>;

    async fn get_by_id(&self, id: NvrId) -> DbResult<Option<NvrRecord>>;

    async fn get_by_name(&self, name: &str) -> DbResult<Option<NvrRecord>>;

    /// Alle NVRs, sortiert nach ID
    async fn list(&self) -> DbResult<Vec<NvrRecord>>;

    /// IDs aller NVRs
    async fn list_ids(&self) -> DbResult<Vec<NvrId>>;

    async fn exists(&self, id: NvrId) -> DbResult<bool>;

    async fn update(&self, id: NvrId, data: NvrUpdate) -> DbResult<NvrRecord>;

    /// Einen NVR loeschen; Kameras und Freigaben werden per Kaskade entfernt
    async fn delete(&self, id: NvrId) -> DbResult<bool>;
}

/// Repository fuer Kamera-Datenzugriffe
#[allow(async_fn_in_trait)]
pub trait CameraRepository: Send + Sync {
    /// Neue Kamera anlegen
    ///
    /// Ein bereits vergebener Name liefert `DbError::Eindeutigkeit`.
    async fn create(&self, data: NeueKamera<'_>) -> DbResult<KameraRecord>;

    async fn get_by_id(&self, id: KameraId) -> DbResult<Option<KameraRecord>>;

    async fn get_by_name(&self, name: &str) -> DbResult<Option<KameraRecord>>;

    /// Exakter, gross-/kleinschreibungssensitiver Namensvergleich
    async fn exists_by_name(&self, name: &str) -> DbResult<bool>;

    /// Alle Kameras, sortiert nach Name
    async fn list(&self) -> DbResult<Vec<KameraRecord>>;

    /// Alle Kameras mit `active = 1`, sortiert nach Name
    async fn list_active(&self) -> DbResult<Vec<KameraRecord>>;

    async fn list_by_nvr(&self, nvr_id: NvrId) -> DbResult<Vec<KameraRecord>>;

    async fn count_by_nvr(&self, nvr_id: NvrId) -> DbResult<i64>;

    async fn update(&self, id: KameraId, data: KameraUpdate) -> DbResult<KameraRecord>;

    async fn delete(&self, id: KameraId) -> DbResult<bool>;
}

/// Repository fuer NVR-Freigaben (user_nvrs)
#[allow(async_fn_in_trait)]
pub trait GrantRepository: Send + Sync {
    /// Freigegebene NVR-IDs eines Benutzers, aufsteigend
    async fn list_for_user(&self, user_id: UserId) -> DbResult<Vec<NvrId>>;

    /// Ersetzt alle Freigaben eines Benutzers in einer Transaktion
    async fn replace_for_user(&self, user_id: UserId, nvr_ids: &[NvrId]) -> DbResult<()>;

    /// Anzahl der Freigaben fuer einen NVR
    async fn count_for_nvr(&self, nvr_id: NvrId) -> DbResult<i64>;
}
