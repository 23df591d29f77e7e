//! Abgleich der abgeleiteten Streams eines NVR mit den gespeicherten Kameras
//!
//! Fehlende Kameras werden angelegt und beim Daemon registriert, vorhandene
//! nie ueberschrieben. Der Abgleich ist idempotent und laeuft ohne
//! umschliessende Transaktion: bricht er ab, holt der naechste Lauf den Rest
//! nach. Ein Absenken von `max_channels` loescht nichts.

use opus_db::models::{NeueKamera, NvrRecord};
use opus_db::CameraRepository;
use opus_streams::{StreamDaemon, StreamRegistry};
use serde::Serialize;

use crate::ableitung::alle_streams;
use crate::error::FlotteResult;
use crate::stream_kamera;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AbgleichErgebnis {
    pub erstellt: u32,
    pub uebersprungen: u32,
}

pub async fn nvr_abgleichen<R, D>(
    repo: &R,
    registry: &StreamRegistry<D>,
    nvr: &NvrRecord,
) -> FlotteResult<AbgleichErgebnis>
where
    R: CameraRepository,
    D: StreamDaemon,
{
    let mut ergebnis = AbgleichErgebnis::default();

    for stream in alle_streams(nvr) {
        if repo.exists_by_name(&stream.name).await? {
            ergebnis.uebersprungen += 1;
            continue;
        }

        let neu = NeueKamera {
            name: &stream.name,
            display_name: &stream.label,
            rtsp_url: &stream.rtsp_url,
            nvr_id: Some(nvr.id),
            active: true,
            recording_enabled: false,
            notes: None,
        };
        match repo.create(neu).await {
            Ok(kamera) => {
                registry.kamera_registrieren(&stream_kamera(&kamera)).await;
                ergebnis.erstellt += 1;
            }
            // Parallel angelegt: die UNIQUE-Constraint entscheidet
            Err(e) if e.ist_eindeutigkeit() => {
                tracing::debug!(stream = %stream.name, "Kamera zwischenzeitlich angelegt, uebersprungen");
                ergebnis.uebersprungen += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(
        nvr_id = %nvr.id,
        nvr = %nvr.name,
        erstellt = ergebnis.erstellt,
        uebersprungen = ergebnis.uebersprungen,
        "NVR abgeglichen"
    );

    Ok(ergebnis)
}
