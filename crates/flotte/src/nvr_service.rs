//! NVR-Service: Anlegen mit Provisionierung, Bearbeiten, Loeschen, Synchronisieren

use std::sync::Arc;

use opus_core::NvrId;
use opus_db::models::{NeuerNvr, NvrRecord, NvrUpdate, STANDARD_MAX_KANAELE};
use opus_db::{CameraRepository, GrantRepository, NvrRepository};
use opus_streams::{StreamDaemon, StreamRegistry};
use serde::Serialize;

use crate::abgleich::{nvr_abgleichen, AbgleichErgebnis};
use crate::error::{FlotteError, FlotteResult};
use crate::name_gueltig;

#[derive(Debug, Clone, Default)]
pub struct NvrEingabe {
    pub name: String,
    pub display_name: String,
    pub ip_address: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// `None` = Standard (50)
    pub max_channels: Option<i64>,
}

/// Teil-Aenderung eines NVR
///
/// Ein leeres `password` laesst das gespeicherte Passwort unveraendert, leere
/// Verbindungsfelder werden zu `NULL`.
#[derive(Debug, Clone, Default)]
pub struct NvrPatch {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub ip_address: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_channels: Option<i64>,
    pub active: Option<bool>,
}

/// NVR mit Kamera-Anzahl; das Passwort ist nie Teil der Ansicht
#[derive(Debug, Clone, Serialize)]
pub struct NvrAnsicht {
    #[serde(flatten)]
    pub nvr: NvrRecord,
    pub camera_count: i64,
}

/// Was beim Loeschen eines NVR mit entfernt wurde
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NvrLoeschung {
    pub kameras: usize,
    pub freigaben: i64,
}

pub struct NvrService<R, D> {
    repo: Arc<R>,
    registry: Arc<StreamRegistry<D>>,
}

impl<R, D> NvrService<R, D>
where
    R: NvrRepository + CameraRepository + GrantRepository,
    D: StreamDaemon,
{
    pub fn neu(repo: Arc<R>, registry: Arc<StreamRegistry<D>>) -> Self {
        Self { repo, registry }
    }

    pub async fn laden(&self, id: NvrId) -> FlotteResult<NvrRecord> {
        NvrRepository::get_by_id(&*self.repo, id)
            .await?
            .ok_or_else(|| FlotteError::nicht_gefunden(format!("NVR {id}")))
    }

    pub async fn auflisten(&self) -> FlotteResult<Vec<NvrAnsicht>> {
        let nvrs = NvrRepository::list(&*self.repo).await?;

        let mut ansichten = Vec::with_capacity(nvrs.len());
        for nvr in nvrs {
            let camera_count = CameraRepository::count_by_nvr(&*self.repo, nvr.id).await?;
            ansichten.push(NvrAnsicht { nvr, camera_count });
        }
        Ok(ansichten)
    }

    /// Legt einen NVR an und provisioniert sofort alle Kanaele
    pub async fn erstellen(&self, eingabe: NvrEingabe) -> FlotteResult<(NvrRecord, AbgleichErgebnis)> {
        let name = eingabe.name.trim();
        let display_name = eingabe.display_name.trim();
        if name.is_empty() || display_name.is_empty() {
            return Err(FlotteError::validierung(
                "name und display_name sind Pflichtfelder",
            ));
        }
        if !name_gueltig(name) {
            return Err(FlotteError::validierung(format!(
                "NVR-Name '{name}' darf nur Buchstaben, Ziffern, '_' und '-' enthalten"
            )));
        }
        if NvrRepository::get_by_name(&*self.repo, name).await?.is_some() {
            return Err(FlotteError::validierung(format!(
                "NVR-Name '{name}' bereits vergeben"
            )));
        }
        let max_channels = kanaele_pruefen(eingabe.max_channels.unwrap_or(STANDARD_MAX_KANAELE))?;

        let ip_address = nicht_leer(eingabe.ip_address);
        let username = nicht_leer(eingabe.username);
        let password = nicht_leer(eingabe.password);

        let nvr = NvrRepository::create(
            &*self.repo,
            NeuerNvr {
                name,
                display_name,
                ip_address: ip_address.as_deref(),
                username: username.as_deref(),
                password: password.as_deref(),
                max_channels,
                active: true,
            },
        )
        .await?;
        tracing::info!(nvr_id = %nvr.id, nvr = %nvr.name, max_channels, "NVR angelegt");

        let ergebnis = nvr_abgleichen(&*self.repo, &self.registry, &nvr).await?;
        Ok((nvr, ergebnis))
    }

    /// Aendert einen NVR; abgeleitete Kameras bleiben unberuehrt
    pub async fn aktualisieren(&self, id: NvrId, patch: NvrPatch) -> FlotteResult<NvrRecord> {
        let alt = self.laden(id).await?;
        let mut update = NvrUpdate::default();

        if let Some(name) = patch.name {
            let name = name.trim();
            if name != alt.name {
                if !name_gueltig(name) {
                    return Err(FlotteError::validierung(format!(
                        "NVR-Name '{name}' darf nur Buchstaben, Ziffern, '_' und '-' enthalten"
                    )));
                }
                if NvrRepository::get_by_name(&*self.repo, name).await?.is_some() {
                    return Err(FlotteError::validierung(format!(
                        "NVR-Name '{name}' bereits vergeben"
                    )));
                }
                update.name = Some(name.to_string());
            }
        }
        if let Some(display_name) = patch.display_name {
            let display_name = display_name.trim();
            if display_name.is_empty() {
                return Err(FlotteError::validierung("display_name darf nicht leer sein"));
            }
            update.display_name = Some(display_name.to_string());
        }
        if let Some(ip) = patch.ip_address {
            update.ip_address = Some(nicht_leer(Some(ip)));
        }
        if let Some(username) = patch.username {
            update.username = Some(nicht_leer(Some(username)));
        }
        if let Some(password) = nicht_leer(patch.password) {
            update.password = Some(Some(password));
        }
        if let Some(max) = patch.max_channels {
            update.max_channels = Some(kanaele_pruefen(max)?);
        }
        update.active = patch.active;

        let nvr = NvrRepository::update(&*self.repo, id, update).await?;

        if nvr.name != alt.name {
            let kameras = CameraRepository::count_by_nvr(&*self.repo, id).await?;
            tracing::warn!(
                nvr_id = %id,
                alt = %alt.name,
                neu = %nvr.name,
                kameras,
                "NVR umbenannt, abgeleitete Kameras behalten ihre bisherigen Namen"
            );
        }

        Ok(nvr)
    }

    /// Loescht einen NVR samt Kameras und Freigaben
    ///
    /// Gibt zurueck, wie viele Kameras und Freigaben mit entfernt wurden.
    pub async fn loeschen(&self, id: NvrId) -> FlotteResult<NvrLoeschung> {
        let nvr = self.laden(id).await?;
        let kameras = CameraRepository::list_by_nvr(&*self.repo, id).await?;
        let freigaben = GrantRepository::count_for_nvr(&*self.repo, id).await?;

        for kamera in &kameras {
            self.registry.abmelden(&kamera.name).await;
        }
        NvrRepository::delete(&*self.repo, id).await?;

        tracing::info!(
            nvr_id = %id,
            nvr = %nvr.name,
            kameras = kameras.len(),
            freigaben,
            "NVR geloescht"
        );
        Ok(NvrLoeschung {
            kameras: kameras.len(),
            freigaben,
        })
    }

    pub async fn synchronisieren(&self, id: NvrId) -> FlotteResult<AbgleichErgebnis> {
        let nvr = self.laden(id).await?;
        nvr_abgleichen(&*self.repo, &self.registry, &nvr).await
    }
}

/// Groesste Kanalzahl gaengiger NVRs; jeder Kanal kostet zwei Kameras
pub const MAX_KANAELE_OBERGRENZE: i64 = 256;

fn kanaele_pruefen(max_channels: i64) -> FlotteResult<i64> {
    if !(1..=MAX_KANAELE_OBERGRENZE).contains(&max_channels) {
        return Err(FlotteError::validierung(format!(
            "max_channels muss zwischen 1 und {MAX_KANAELE_OBERGRENZE} liegen, erhalten: {max_channels}"
        )));
    }
    Ok(max_channels)
}

fn nicht_leer(wert: Option<String>) -> Option<String> {
    wert.map(|w| w.trim().to_string()).filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    use opus_core::Rolle;
    use opus_db::models::NeuerBenutzer;
    use opus_db::{GrantRepository, SqliteDb, UserRepository};
    use opus_streams::testing::{Aufruf, FakeDaemon};

    async fn service() -> NvrService<SqliteDb, FakeDaemon> {
        let db = SqliteDb::in_memory()
            .await
            .expect("In-Memory DB konnte nicht erstellt werden");
        let registry = StreamRegistry::neu(FakeDaemon::default(), "/recordings");
        NvrService::neu(Arc::new(db), Arc::new(registry))
    }

    fn dock(max_channels: i64) -> NvrEingabe {
        NvrEingabe {
            name: "dock".into(),
            display_name: "Dock".into(),
            ip_address: Some("10.0.0.5".into()),
            username: Some("admin".into()),
            password: Some("pw".into()),
            max_channels: Some(max_channels),
        }
    }

    #[tokio::test]
    async fn erstellen_provisioniert_kanaele() {
        let s = service().await;

        let (nvr, ergebnis) = s.erstellen(dock(3)).await.unwrap();
        assert_eq!(ergebnis, AbgleichErgebnis { erstellt: 6, uebersprungen: 0 });
        assert_eq!(nvr.max_channels, 3);
        assert_eq!(s.registry.daemon().aufrufe().len(), 6);
    }

    #[tokio::test]
    async fn erstellen_standard_kanaele() {
        let s = service().await;

        let (nvr, ergebnis) = s
            .erstellen(NvrEingabe {
                max_channels: None,
                ip_address: Some("  ".into()),
                ..dock(0)
            })
            .await
            .unwrap();
        assert_eq!(nvr.max_channels, 50);
        assert_eq!(nvr.ip_address, None);
        assert_eq!(ergebnis.erstellt, 100);
    }

    #[tokio::test]
    async fn erstellen_validierung() {
        let s = service().await;

        for eingabe in [
            NvrEingabe {
                name: " ".into(),
                ..dock(1)
            },
            NvrEingabe {
                name: "mit/slash".into(),
                ..dock(1)
            },
            dock(0),
            dock(MAX_KANAELE_OBERGRENZE + 1),
            dock(1_000_000),
        ] {
            let err = s.erstellen(eingabe).await.unwrap_err();
            assert!(matches!(err, FlotteError::Validierung(_)), "{err}");
        }

        // Abgelehnte Eingaben legen weder NVR noch Kameras an
        assert!(CameraRepository::list(&*s.repo).await.unwrap().is_empty());
        assert!(s.registry.daemon().aufrufe().is_empty());

        s.erstellen(dock(1)).await.unwrap();
        let doppelt = s.erstellen(dock(1)).await.unwrap_err();
        assert!(matches!(doppelt, FlotteError::Validierung(_)));
    }

    #[tokio::test]
    async fn kanalzahl_obergrenze_auch_beim_bearbeiten() {
        let s = service().await;
        let (nvr, _) = s.erstellen(dock(MAX_KANAELE_OBERGRENZE)).await.unwrap();
        assert_eq!(nvr.max_channels, MAX_KANAELE_OBERGRENZE);

        let err = s
            .aktualisieren(
                nvr.id,
                NvrPatch {
                    max_channels: Some(MAX_KANAELE_OBERGRENZE + 1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FlotteError::Validierung(_)));
        assert_eq!(s.laden(nvr.id).await.unwrap().max_channels, MAX_KANAELE_OBERGRENZE);
    }

    #[tokio::test]
    async fn leeres_passwort_bleibt_unveraendert() {
        let s = service().await;
        let (nvr, _) = s.erstellen(dock(1)).await.unwrap();

        let nvr = s
            .aktualisieren(
                nvr.id,
                NvrPatch {
                    password: Some(String::new()),
                    ip_address: Some("10.0.0.6".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(nvr.password.as_deref(), Some("pw"));
        assert_eq!(nvr.ip_address.as_deref(), Some("10.0.0.6"));

        let nvr = s
            .aktualisieren(
                nvr.id,
                NvrPatch {
                    password: Some("neu".into()),
                    username: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(nvr.password.as_deref(), Some("neu"));
        assert_eq!(nvr.username, None);
    }

    #[tokio::test]
    async fn umbenennen_kaskadiert_nicht() {
        let s = service().await;
        let (nvr, _) = s.erstellen(dock(1)).await.unwrap();

        let nvr = s
            .aktualisieren(
                nvr.id,
                NvrPatch {
                    name: Some("rampe".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(nvr.name, "rampe");

        let namen: Vec<String> = CameraRepository::list_by_nvr(&*s.repo, nvr.id)
            .await
            .unwrap()
            .into_iter()
            .map(|k| k.name)
            .collect();
        assert_eq!(namen, vec!["dock-ch1-main", "dock-ch1-sub"]);

        // Ein Sync legt danach die Streams unter dem neuen Namen zusaetzlich an
        let ergebnis = s.synchronisieren(nvr.id).await.unwrap();
        assert_eq!(ergebnis, AbgleichErgebnis { erstellt: 2, uebersprungen: 0 });
    }

    #[tokio::test]
    async fn loeschen_meldet_ab_und_kaskadiert() {
        let s = service().await;
        let (nvr, _) = s.erstellen(dock(2)).await.unwrap();

        let user = UserRepository::create(
            &*s.repo,
            NeuerBenutzer {
                username: "viewer",
                password_hash: "h",
                role: Rolle::Viewer,
            },
        )
        .await
        .unwrap();
        GrantRepository::replace_for_user(&*s.repo, user.id, &[nvr.id])
            .await
            .unwrap();
        s.registry.daemon().aufrufe_leeren();

        let entfernt = s.loeschen(nvr.id).await.unwrap();
        assert_eq!(
            entfernt,
            NvrLoeschung {
                kameras: 4,
                freigaben: 1
            }
        );

        let aufrufe = s.registry.daemon().aufrufe();
        assert_eq!(aufrufe.len(), 4);
        assert!(aufrufe.contains(&Aufruf::entfernen("dock-ch2-sub")));
        assert!(s.registry.daemon().stream_namen().is_empty());

        assert!(CameraRepository::list(&*s.repo).await.unwrap().is_empty());
        assert_eq!(GrantRepository::count_for_nvr(&*s.repo, nvr.id).await.unwrap(), 0);
        assert!(matches!(
            s.laden(nvr.id).await.unwrap_err(),
            FlotteError::NichtGefunden(_)
        ));
    }

    #[tokio::test]
    async fn synchronisieren_unbekannt() {
        let s = service().await;
        let err = s.synchronisieren(NvrId(9)).await.unwrap_err();
        assert!(matches!(err, FlotteError::NichtGefunden(_)));
    }

    #[tokio::test]
    async fn auflisten_ohne_passwort() {
        let s = service().await;
        s.erstellen(dock(2)).await.unwrap();

        let liste = s.auflisten().await.unwrap();
        assert_eq!(liste.len(), 1);
        assert_eq!(liste[0].camera_count, 4);

        let json = serde_json::to_value(&liste[0]).unwrap();
        assert_eq!(json["name"], "dock");
        assert_eq!(json["camera_count"], 4);
        assert!(json.get("password").is_none());
    }
}
