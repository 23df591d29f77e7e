//! Einmaliger Abgleich beim Start
//!
//! go2rtc verliert dynamisch angelegte Streams bei jedem Neustart. Beim
//! Hochfahren werden deshalb alle aktiven Kameras erneut registriert, bevor
//! der Prozess als bereit gilt.

use opus_db::CameraRepository;
use opus_streams::{StreamDaemon, StreamRegistry};
use serde::Serialize;

use crate::error::FlotteResult;
use crate::stream_kamera;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StartBericht {
    pub gesamt: usize,
    pub registriert: usize,
    pub fehlgeschlagen: usize,
}

/// Registriert alle aktiven Kameras; einzelne Fehlschlaege brechen nicht ab
pub async fn start_abgleich<R, D>(repo: &R, registry: &StreamRegistry<D>) -> FlotteResult<StartBericht>
where
    R: CameraRepository,
    D: StreamDaemon,
{
    let kameras = repo.list_active().await?;
    let mut bericht = StartBericht {
        gesamt: kameras.len(),
        ..Default::default()
    };

    for kamera in &kameras {
        if registry.kamera_registrieren(&stream_kamera(kamera)).await {
            bericht.registriert += 1;
        } else {
            bericht.fehlgeschlagen += 1;
        }
    }

    if bericht.fehlgeschlagen > 0 {
        tracing::warn!(
            gesamt = bericht.gesamt,
            registriert = bericht.registriert,
            fehlgeschlagen = bericht.fehlgeschlagen,
            "Start-Abgleich mit Fehlern abgeschlossen"
        );
    } else {
        tracing::info!(
            gesamt = bericht.gesamt,
            registriert = bericht.registriert,
            "Start-Abgleich abgeschlossen"
        );
    }

    Ok(bericht)
}

#[cfg(test)]
mod tests {
    use super::*;

    use opus_db::models::NeueKamera;
    use opus_db::SqliteDb;
    use opus_streams::testing::FakeDaemon;

    async fn db_mit_kameras() -> SqliteDb {
        let db = SqliteDb::in_memory()
            .await
            .expect("In-Memory DB konnte nicht erstellt werden");

        for (name, active, recording_enabled) in [
            ("aktiv", true, false),
            ("aufnahme", true, true),
            ("inaktiv", false, true),
        ] {
            CameraRepository::create(
                &db,
                NeueKamera {
                    name,
                    display_name: name,
                    rtsp_url: "rtsp://x",
                    active,
                    recording_enabled,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }
        db
    }

    #[tokio::test]
    async fn nur_aktive_kameras_mit_aufnahme_ziel() {
        let db = db_mit_kameras().await;
        let reg = StreamRegistry::neu(FakeDaemon::default(), "/recordings");

        let bericht = start_abgleich(&db, &reg).await.unwrap();
        assert_eq!(
            bericht,
            StartBericht {
                gesamt: 2,
                registriert: 2,
                fehlgeschlagen: 0
            }
        );

        assert_eq!(
            reg.daemon().stream_namen(),
            vec!["aktiv".to_string(), "aufnahme".to_string()]
        );
        assert_eq!(
            reg.daemon().quellen("aufnahme"),
            vec![
                "rtsp://x".to_string(),
                "record:///recordings/aufnahme/{dt}.mp4".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn daemon_ausfall_bricht_nicht_ab() {
        let db = db_mit_kameras().await;
        let reg = StreamRegistry::neu(FakeDaemon::default(), "/recordings");
        reg.daemon().fehlschlagen(true);

        let bericht = start_abgleich(&db, &reg).await.unwrap();
        assert_eq!(bericht.gesamt, 2);
        assert_eq!(bericht.fehlgeschlagen, 2);
        // Jede Kamera wurde versucht
        assert_eq!(reg.daemon().aufrufe().len(), 2);
    }
}
