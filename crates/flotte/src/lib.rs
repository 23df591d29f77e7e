//! opus-flotte – Verwaltung der Kamera-Flotte
//!
//! Leitet aus den Verbindungsdaten eines NVR die Streams je Kanal ab,
//! gleicht sie mit den gespeicherten Kameras ab und haelt die Registry des
//! Stream-Daemons synchron.

pub mod abgleich;
pub mod ableitung;
pub mod error;
pub mod kamera_service;
pub mod nvr_service;
pub mod startup;

pub use abgleich::{nvr_abgleichen, AbgleichErgebnis};
pub use ableitung::{gegenstueck, player_url, stream_ableiten, variante_aus_name, StreamVariante};
pub use error::{FlotteError, FlotteResult};
pub use kamera_service::{KameraAnsicht, KameraEingabe, KameraPatch, KameraService};
pub use nvr_service::{NvrAnsicht, NvrEingabe, NvrLoeschung, NvrPatch, NvrService, MAX_KANAELE_OBERGRENZE};
pub use startup::{start_abgleich, StartBericht};

use opus_db::models::KameraRecord;
use opus_streams::StreamKamera;

/// Sicht einer gespeicherten Kamera fuer die Stream-Registry
pub(crate) fn stream_kamera(kamera: &KameraRecord) -> StreamKamera<'_> {
    StreamKamera {
        name: &kamera.name,
        rtsp_url: &kamera.rtsp_url,
        recording_enabled: kamera.recording_enabled,
    }
}

/// Erlaubte Zeichen fuer Stream- und NVR-Namen: `[A-Za-z0-9_-]`
pub(crate) fn name_gueltig(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
