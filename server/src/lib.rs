//! opus-server – Bibliotheks-Root
//!
//! Verdrahtet Datenbank, Stream-Registry und Services und stellt den
//! oeffentlichen Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use config::{AdminEinstellungen, OpusConfig};
use opus_auth::{BenutzerService, ZugriffService};
use opus_db::SqliteDb;
use opus_flotte::{start_abgleich, KameraService, NvrService, StartBericht};
use opus_observability::{observability_server_starten, HealthQuelle};
use opus_streams::{
    aufnahmen_auflisten, segment_aufloesen, Aufnahme, Go2RtcClient, StreamDaemon, StreamRegistry,
    StreamResult,
};

/// Alle Services ueber einer gemeinsamen Datenbank und Registry
pub struct Dienste<D> {
    pub db: Arc<SqliteDb>,
    pub registry: Arc<StreamRegistry<D>>,
    pub kameras: KameraService<SqliteDb, D>,
    pub nvrs: NvrService<SqliteDb, D>,
    pub benutzer: BenutzerService<SqliteDb>,
    pub zugriff: ZugriffService<SqliteDb>,
    aufnahmen_wurzel: PathBuf,
}

impl<D: StreamDaemon> Dienste<D> {
    pub fn neu(
        db: Arc<SqliteDb>,
        registry: Arc<StreamRegistry<D>>,
        aufnahmen_wurzel: impl Into<PathBuf>,
    ) -> Self {
        Self {
            kameras: KameraService::neu(db.clone(), registry.clone()),
            nvrs: NvrService::neu(db.clone(), registry.clone()),
            benutzer: BenutzerService::neu(db.clone()),
            zugriff: ZugriffService::neu(db.clone()),
            aufnahmen_wurzel: aufnahmen_wurzel.into(),
            db,
            registry,
        }
    }

    /// Standard-Admin anlegen und alle aktiven Kameras beim Daemon registrieren
    pub async fn hochfahren(&self, admin: &AdminEinstellungen) -> Result<StartBericht> {
        self.benutzer
            .standard_admin_anlegen(&admin.standard_benutzer, &admin.standard_passwort)
            .await
            .context("Standard-Admin konnte nicht angelegt werden")?;

        let bericht = start_abgleich(&*self.db, &self.registry)
            .await
            .context("Start-Abgleich fehlgeschlagen")?;
        Ok(bericht)
    }

    pub fn aufnahmen_wurzel(&self) -> &Path {
        &self.aufnahmen_wurzel
    }

    /// Aufgezeichnete Segmente, optional auf eine Kamera beschraenkt
    pub async fn aufnahmen(
        &self,
        kamera: Option<&str>,
    ) -> StreamResult<BTreeMap<String, Vec<Aufnahme>>> {
        aufnahmen_auflisten(&self.aufnahmen_wurzel, kamera).await
    }

    /// Pfad eines einzelnen Segments fuer den Download
    pub async fn aufnahme_datei(&self, kamera: &str, datei: &str) -> StreamResult<PathBuf> {
        segment_aufloesen(&self.aufnahmen_wurzel, kamera, datei).await
    }
}

/// Health-Messwerte aus Datenbank und go2rtc
pub struct OpusHealth {
    db: Arc<SqliteDb>,
    registry: Arc<StreamRegistry<Go2RtcClient>>,
}

impl OpusHealth {
    pub fn neu(db: Arc<SqliteDb>, registry: Arc<StreamRegistry<Go2RtcClient>>) -> Self {
        Self { db, registry }
    }
}

#[async_trait]
impl HealthQuelle for OpusHealth {
    async fn db_verbunden(&self) -> bool {
        self.db.ping().await
    }

    async fn stream_status(&self) -> Option<BTreeMap<String, bool>> {
        match self.registry.online_status().await {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::debug!(fehler = %e, "Stream-Status nicht abrufbar");
                None
            }
        }
    }
}

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: OpusConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: OpusConfig) -> Self {
        Self { config }
    }

    /// Baut Datenbank, Registry und Services auf
    ///
    /// Nur ein Fehler beim Oeffnen der Datenbank oder bei den Migrationen
    /// bricht ab; ein unerreichbarer Daemon wird beim Abgleich geloggt.
    pub async fn vorbereiten(&self) -> Result<Dienste<Go2RtcClient>> {
        let db = SqliteDb::oeffnen(&self.config.datenbank_config())
            .await
            .with_context(|| {
                format!(
                    "Datenbank '{}' konnte nicht geoeffnet werden",
                    self.config.datenbank.url
                )
            })?;

        let client = Go2RtcClient::neu(&self.config.streams.daemon_url, self.config.daemon_timeout())
            .context("HTTP-Client fuer go2rtc konnte nicht erstellt werden")?;
        let registry = StreamRegistry::neu(client, &self.config.streams.aufnahmen_verzeichnis)
            .mit_abschaltung(self.config.streams.aufnahme_abschalten);

        Ok(Dienste::neu(
            Arc::new(db),
            Arc::new(registry),
            &self.config.streams.aufnahmen_verzeichnis,
        ))
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbank oeffnen und migrieren
    /// 2. Standard-Admin anlegen, Kameras beim Daemon registrieren
    /// 3. Health-Server starten
    /// 4. Auf Ctrl-C warten
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            server_name = %self.config.server.name,
            daemon = %self.config.streams.daemon_url,
            aufnahmen = %self.config.streams.aufnahmen_verzeichnis,
            "Server startet"
        );

        let dienste = self.vorbereiten().await?;
        let bericht = dienste.hochfahren(&self.config.admin).await?;
        tracing::info!(
            kameras = bericht.gesamt,
            registriert = bericht.registriert,
            "Server bereit"
        );

        let (stopp_tx, stopp_rx) = tokio::sync::oneshot::channel::<()>();
        let health = if self.config.observability.aktiviert {
            let adresse: SocketAddr = self
                .config
                .observability_bind_adresse()
                .parse()
                .context("Ungueltige Observability-Adresse")?;
            let quelle = Arc::new(OpusHealth::neu(dienste.db.clone(), dienste.registry.clone()));
            Some(tokio::spawn(async move {
                let shutdown = async {
                    let _ = stopp_rx.await;
                };
                if let Err(e) = observability_server_starten(adresse, quelle, shutdown).await {
                    tracing::error!(fehler = %e, "Observability-Server beendet");
                }
            }))
        } else {
            None
        };

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        let _ = stopp_tx.send(());
        if let Some(handle) = health {
            let _ = handle.await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use opus_core::Rolle;
    use opus_flotte::{KameraEingabe, NvrEingabe};
    use opus_streams::testing::{Aufruf, FakeDaemon};

    async fn dienste(wurzel: &Path) -> Dienste<FakeDaemon> {
        let db = SqliteDb::in_memory()
            .await
            .expect("In-Memory DB konnte nicht erstellt werden");
        let registry = StreamRegistry::neu(FakeDaemon::default(), "/recordings");
        Dienste::neu(Arc::new(db), Arc::new(registry), wurzel)
    }

    #[tokio::test]
    async fn hochfahren_legt_admin_an_und_registriert_aktive_kameras() {
        let tmp = tempfile::tempdir().unwrap();
        let d = dienste(tmp.path()).await;

        d.kameras
            .erstellen(KameraEingabe {
                name: "einfahrt".into(),
                display_name: "Einfahrt".into(),
                rtsp_url: "rtsp://10.0.0.5/live".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        d.kameras
            .erstellen(KameraEingabe {
                name: "keller".into(),
                display_name: "Keller".into(),
                rtsp_url: "rtsp://10.0.0.6/live".into(),
                active: false,
                ..Default::default()
            })
            .await
            .unwrap();

        // Daemon-Neustart simulieren
        d.registry.daemon().aufrufe_leeren();

        let bericht = d.hochfahren(&AdminEinstellungen::default()).await.unwrap();
        assert_eq!(bericht.gesamt, 1);
        assert_eq!(bericht.registriert, 1);
        assert_eq!(
            d.registry.daemon().aufrufe(),
            vec![Aufruf::hinzufuegen("einfahrt", "rtsp://10.0.0.5/live")]
        );

        let benutzer = d.benutzer.auflisten().await.unwrap();
        assert_eq!(benutzer.len(), 1);
        assert_eq!(benutzer[0].role, Rolle::Admin);

        // Zweiter Start legt keinen weiteren Admin an
        d.hochfahren(&AdminEinstellungen::default()).await.unwrap();
        assert_eq!(d.benutzer.auflisten().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn viewer_sieht_nur_freigegebenen_nvr() {
        let tmp = tempfile::tempdir().unwrap();
        let d = dienste(tmp.path()).await;

        let (dock, ergebnis) = d
            .nvrs
            .erstellen(NvrEingabe {
                name: "dock".into(),
                display_name: "Dock".into(),
                ip_address: Some("10.0.0.10".into()),
                username: Some("admin".into()),
                password: Some("pw".into()),
                max_channels: Some(2),
            })
            .await
            .unwrap();
        assert_eq!(ergebnis.erstellt, 4);
        d.nvrs
            .erstellen(NvrEingabe {
                name: "halle".into(),
                display_name: "Halle".into(),
                ip_address: Some("10.0.0.11".into()),
                max_channels: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();

        let viewer = d.benutzer.erstellen("vera", "pw", "viewer").await.unwrap();
        d.zugriff.freigaben_setzen(viewer.id, &[dock.id]).await.unwrap();

        let namen: Vec<String> = d
            .zugriff
            .sichtbare_kameras(&viewer)
            .await
            .unwrap()
            .into_iter()
            .map(|k| k.name)
            .collect();
        assert_eq!(
            namen,
            vec!["dock-ch1-main", "dock-ch1-sub", "dock-ch2-main", "dock-ch2-sub"]
        );
    }

    #[tokio::test]
    async fn aufnahmen_ueber_dienste() {
        let tmp = tempfile::tempdir().unwrap();
        let kamera_dir = tmp.path().join("einfahrt");
        std::fs::create_dir_all(&kamera_dir).unwrap();
        std::fs::write(kamera_dir.join("2024-01-15_14-00-00.mp4"), b"mp4").unwrap();

        let d = dienste(tmp.path()).await;
        let katalog = d.aufnahmen(None).await.unwrap();
        assert_eq!(katalog["einfahrt"].len(), 1);

        let pfad = d
            .aufnahme_datei("einfahrt", "2024-01-15_14-00-00.mp4")
            .await
            .unwrap();
        assert_eq!(pfad, kamera_dir.join("2024-01-15_14-00-00.mp4"));
        assert!(d.aufnahme_datei("einfahrt", "../geheim.mp4").await.is_err());
    }

    #[tokio::test]
    async fn health_ohne_daemon_meldet_nur_db() {
        let db = Arc::new(SqliteDb::in_memory().await.unwrap());
        // Port belegen und wieder freigeben: danach Connection refused
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Go2RtcClient::neu(format!("http://{addr}"), Duration::from_millis(500)).unwrap();
        let registry = Arc::new(StreamRegistry::neu(client, "/recordings"));
        let health = OpusHealth::neu(db, registry);

        assert!(health.db_verbunden().await);
        assert!(health.stream_status().await.is_none());
    }

    fn datei_config(pfad: &Path) -> OpusConfig {
        let mut config = OpusConfig::default();
        config.datenbank.url = format!("sqlite://{}", pfad.display());
        config.streams.daemon_url = "http://127.0.0.1:1".into();
        config
    }

    #[tokio::test]
    async fn vorbereiten_bricht_bei_kaputter_migration_ab() {
        let tmp = tempfile::tempdir().unwrap();
        let server = Server::neu(datei_config(&tmp.path().join("opus.db")));

        let dienste = server.vorbereiten().await.unwrap();
        assert!(dienste.db.ping().await);

        // Pruefsumme der ersten Migration verfaelschen
        sqlx::query("UPDATE _sqlx_migrations SET checksum = x'00' WHERE version = 1")
            .execute(dienste.db.pool())
            .await
            .unwrap();
        dienste.db.pool().close().await;
        drop(dienste);

        let err = match server.vorbereiten().await {
            Ok(_) => panic!("Start trotz kaputter Migration"),
            Err(e) => e,
        };
        let migration = err.chain().any(|ursache| {
            matches!(
                ursache.downcast_ref::<opus_db::DbError>(),
                Some(opus_db::DbError::Migration(_))
            )
        });
        assert!(migration, "{err:#}");
    }
}
