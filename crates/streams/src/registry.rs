//! Best-Effort Stream-Registry
//!
//! Die lokale Datenbank ist die Quelle der Wahrheit, der Daemon nur ein
//! Cache, der sich jederzeit neu befuellen laesst. Deshalb scheitert hier
//! nie eine lokale Operation: Fehler des Daemons werden als WARN geloggt
//! und als `false` gemeldet.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::daemon::StreamDaemon;
use crate::error::StreamResult;

/// Verhalten beim Ausschalten der Aufzeichnung
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AufnahmeAbschaltung {
    /// Stream bleibt wie er ist, die Aufnahme-Quelle laeuft beim Daemon weiter
    #[default]
    Belassen,
    /// Stream wird entfernt und nur mit der RTSP-Quelle neu angelegt
    Abmelden,
}

/// Die Felder einer Kamera, die der Daemon kennen muss
#[derive(Debug, Clone, Copy)]
pub struct StreamKamera<'a> {
    pub name: &'a str,
    pub rtsp_url: &'a str,
    pub recording_enabled: bool,
}

pub struct StreamRegistry<D> {
    daemon: D,
    aufnahmen_verzeichnis: String,
    abschaltung: AufnahmeAbschaltung,
}

impl<D: StreamDaemon> StreamRegistry<D> {
    pub fn neu(daemon: D, aufnahmen_verzeichnis: impl Into<String>) -> Self {
        Self {
            daemon,
            aufnahmen_verzeichnis: aufnahmen_verzeichnis.into(),
            abschaltung: AufnahmeAbschaltung::default(),
        }
    }

    pub fn mit_abschaltung(mut self, abschaltung: AufnahmeAbschaltung) -> Self {
        self.abschaltung = abschaltung;
        self
    }

    pub fn daemon(&self) -> &D {
        &self.daemon
    }

    pub fn abschaltung(&self) -> AufnahmeAbschaltung {
        self.abschaltung
    }

    /// Aufnahme-Ziel fuer den Daemon; `{dt}` ersetzt go2rtc durch den Segmentstart
    pub fn aufnahme_ziel(&self, kamera_name: &str) -> String {
        format!(
            "record://{}/{}/{{dt}}.mp4",
            self.aufnahmen_verzeichnis.trim_end_matches('/'),
            kamera_name
        )
    }

    /// Registriert eine Quelle; `false` wenn der Daemon nicht mitspielt
    pub async fn registrieren(&self, name: &str, uri: &str) -> bool {
        match self.daemon.quelle_hinzufuegen(name, uri).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(stream = name, fehler = %e, "Registrierung beim Daemon fehlgeschlagen");
                false
            }
        }
    }

    pub async fn abmelden(&self, name: &str) -> bool {
        match self.daemon.stream_entfernen(name).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(stream = name, fehler = %e, "Abmeldung beim Daemon fehlgeschlagen");
                false
            }
        }
    }

    /// Registriert die RTSP-Quelle und bei aktiver Aufzeichnung das Aufnahme-Ziel
    ///
    /// Scheitert schon die RTSP-Quelle, wird das Aufnahme-Ziel nicht versucht.
    pub async fn kamera_registrieren(&self, kamera: &StreamKamera<'_>) -> bool {
        if !self.registrieren(kamera.name, kamera.rtsp_url).await {
            return false;
        }
        if kamera.recording_enabled {
            let ziel = self.aufnahme_ziel(kamera.name);
            return self.registrieren(kamera.name, &ziel).await;
        }
        true
    }

    /// Umbenennung: alter Name wird abgemeldet, bevor der neue registriert wird
    pub async fn umbenennen(&self, alter_name: &str, kamera: &StreamKamera<'_>) -> bool {
        self.abmelden(alter_name).await;
        self.kamera_registrieren(kamera).await
    }

    /// Aufzeichnung wurde ausgeschaltet (`kamera.recording_enabled` ist bereits `false`)
    pub async fn aufnahme_beendet(&self, kamera: &StreamKamera<'_>) -> bool {
        if self.abschaltung == AufnahmeAbschaltung::Abmelden {
            // DELETE entfernt alle Quellen, danach nur RTSP neu
            self.abmelden(kamera.name).await;
        }
        self.kamera_registrieren(kamera).await
    }

    /// Online-Status aller Streams
    ///
    /// Im Gegensatz zu allen anderen Operationen wird ein Daemon-Fehler hier an
    /// den Aufrufer weitergereicht.
    pub async fn online_status(&self) -> StreamResult<BTreeMap<String, bool>> {
        let streams = self.daemon.streams_auflisten().await?;
        Ok(streams
            .into_iter()
            .map(|(name, info)| {
                let online = info.ist_online();
                (name, online)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Aufruf, FakeDaemon};

    fn registry() -> StreamRegistry<FakeDaemon> {
        StreamRegistry::neu(FakeDaemon::default(), "/recordings")
    }

    fn kamera(recording_enabled: bool) -> StreamKamera<'static> {
        StreamKamera {
            name: "dock-ch1-main",
            rtsp_url: "rtsp://admin:pw@10.0.0.5:554/Streaming/Channels/101",
            recording_enabled,
        }
    }

    #[test]
    fn aufnahme_ziel_format() {
        let reg = StreamRegistry::neu(FakeDaemon::default(), "/recordings/");
        assert_eq!(
            reg.aufnahme_ziel("dock-ch1-main"),
            "record:///recordings/dock-ch1-main/{dt}.mp4"
        );
    }

    #[tokio::test]
    async fn ohne_aufzeichnung_nur_rtsp_quelle() {
        let reg = registry();
        assert!(reg.kamera_registrieren(&kamera(false)).await);

        assert_eq!(
            reg.daemon().aufrufe(),
            vec![Aufruf::hinzufuegen(
                "dock-ch1-main",
                "rtsp://admin:pw@10.0.0.5:554/Streaming/Channels/101"
            )]
        );
    }

    #[tokio::test]
    async fn mit_aufzeichnung_zusaetzliches_ziel() {
        let reg = registry();
        assert!(reg.kamera_registrieren(&kamera(true)).await);

        let aufrufe = reg.daemon().aufrufe();
        assert_eq!(aufrufe.len(), 2);
        assert_eq!(
            aufrufe[1],
            Aufruf::hinzufuegen("dock-ch1-main", "record:///recordings/dock-ch1-main/{dt}.mp4")
        );
        assert_eq!(reg.daemon().quellen("dock-ch1-main").len(), 2);
    }

    #[tokio::test]
    async fn umbenennen_meldet_zuerst_ab() {
        let reg = registry();
        let neu = StreamKamera {
            name: "tor",
            rtsp_url: "rtsp://x",
            recording_enabled: false,
        };
        assert!(reg.umbenennen("alt", &neu).await);

        assert_eq!(
            reg.daemon().aufrufe(),
            vec![Aufruf::entfernen("alt"), Aufruf::hinzufuegen("tor", "rtsp://x")]
        );
    }

    #[tokio::test]
    async fn daemon_fehler_werden_geschluckt() {
        let reg = registry();
        reg.daemon().fehlschlagen(true);

        assert!(!reg.registrieren("x", "rtsp://x").await);
        assert!(!reg.abmelden("x").await);
        assert!(!reg.kamera_registrieren(&kamera(true)).await);
        // Nach gescheiterter RTSP-Quelle kein zweiter Versuch
        assert_eq!(reg.daemon().aufrufe().len(), 3);
    }

    #[tokio::test]
    async fn aufnahme_beendet_belassen() {
        let reg = registry();
        reg.kamera_registrieren(&kamera(true)).await;
        reg.daemon().aufrufe_leeren();

        reg.aufnahme_beendet(&kamera(false)).await;

        assert_eq!(
            reg.daemon().aufrufe(),
            vec![Aufruf::hinzufuegen(
                "dock-ch1-main",
                "rtsp://admin:pw@10.0.0.5:554/Streaming/Channels/101"
            )]
        );
        // Aufnahme-Quelle bleibt beim Daemon
        assert_eq!(reg.daemon().quellen("dock-ch1-main").len(), 2);
    }

    #[tokio::test]
    async fn aufnahme_beendet_abmelden() {
        let reg = registry().mit_abschaltung(AufnahmeAbschaltung::Abmelden);
        reg.kamera_registrieren(&kamera(true)).await;
        reg.daemon().aufrufe_leeren();

        reg.aufnahme_beendet(&kamera(false)).await;

        let aufrufe = reg.daemon().aufrufe();
        assert_eq!(aufrufe[0], Aufruf::entfernen("dock-ch1-main"));
        assert_eq!(aufrufe.len(), 2);
        assert_eq!(
            reg.daemon().quellen("dock-ch1-main"),
            vec!["rtsp://admin:pw@10.0.0.5:554/Streaming/Channels/101".to_string()]
        );
    }

    #[tokio::test]
    async fn online_status_meldet_fehler() {
        let reg = registry();
        reg.registrieren("a", "rtsp://a").await;

        let status = reg.online_status().await.unwrap();
        assert_eq!(status.get("a"), Some(&true));

        reg.daemon().fehlschlagen(true);
        assert!(reg.online_status().await.is_err());
    }

    #[test]
    fn abschaltung_serde() {
        let a: AufnahmeAbschaltung = serde_json::from_str("\"abmelden\"").unwrap();
        assert_eq!(a, AufnahmeAbschaltung::Abmelden);
        assert_eq!(AufnahmeAbschaltung::default(), AufnahmeAbschaltung::Belassen);
    }
}
