//! Kamera-Service: manuelles Anlegen, Bearbeiten und Loeschen von Kameras
//!
//! Jede Aenderung wird zuerst lokal gespeichert und danach an die
//! Stream-Registry weitergegeben. Bei Umbenennung wird der alte Name beim
//! Daemon abgemeldet, bevor der neue registriert wird; beim Loeschen wird
//! abgemeldet, bevor die Zeile verschwindet.

use std::collections::HashMap;
use std::sync::Arc;

use opus_core::{KameraId, NvrId};
use opus_db::models::{KameraRecord, KameraUpdate, NeueKamera};
use opus_db::{CameraRepository, NvrRepository};
use opus_streams::{StreamDaemon, StreamRegistry};
use serde::Serialize;

use crate::ableitung::{gegenstueck, player_url, variante_aus_name, StreamVariante};
use crate::error::{FlotteError, FlotteResult};
use crate::{name_gueltig, stream_kamera};

/// Daten fuer eine neue Kamera
#[derive(Debug, Clone)]
pub struct KameraEingabe {
    pub name: String,
    pub display_name: String,
    pub rtsp_url: String,
    pub nvr_id: Option<NvrId>,
    pub active: bool,
    pub recording_enabled: bool,
    pub notes: Option<String>,
}

impl Default for KameraEingabe {
    fn default() -> Self {
        Self {
            name: String::new(),
            display_name: String::new(),
            rtsp_url: String::new(),
            nvr_id: None,
            active: true,
            recording_enabled: false,
            notes: None,
        }
    }
}

/// Teil-Aenderung einer Kamera; `None` laesst das Feld unveraendert
#[derive(Debug, Clone, Default)]
pub struct KameraPatch {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub rtsp_url: Option<String>,
    pub nvr_id: Option<Option<NvrId>>,
    pub active: Option<bool>,
    pub recording_enabled: Option<bool>,
    pub notes: Option<Option<String>>,
}

/// Kamera mit abgeleiteten Feldern fuer die Listenansicht
#[derive(Debug, Clone, Serialize)]
pub struct KameraAnsicht {
    #[serde(flatten)]
    pub kamera: KameraRecord,
    pub nvr_name: Option<String>,
    pub is_main: bool,
    pub is_sub: bool,
    pub counterpart: Option<String>,
    pub stream_url: String,
}

impl KameraAnsicht {
    pub fn neu(kamera: KameraRecord, nvr_name: Option<String>) -> Self {
        let variante = variante_aus_name(&kamera.name);
        Self {
            is_main: variante == Some(StreamVariante::Main),
            is_sub: variante == Some(StreamVariante::Sub),
            counterpart: gegenstueck(&kamera.name),
            stream_url: player_url(&kamera.name),
            nvr_name,
            kamera,
        }
    }
}

pub struct KameraService<R, D> {
    repo: Arc<R>,
    registry: Arc<StreamRegistry<D>>,
}

impl<R, D> KameraService<R, D>
where
    R: CameraRepository + NvrRepository,
    D: StreamDaemon,
{
    pub fn neu(repo: Arc<R>, registry: Arc<StreamRegistry<D>>) -> Self {
        Self { repo, registry }
    }

    pub async fn laden(&self, id: KameraId) -> FlotteResult<KameraRecord> {
        CameraRepository::get_by_id(&*self.repo, id)
            .await?
            .ok_or_else(|| FlotteError::nicht_gefunden(format!("Kamera {id}")))
    }

    /// Alle Kameras nach Name sortiert, mit NVR-Anzeigename und Paarung
    pub async fn auflisten(&self) -> FlotteResult<Vec<KameraAnsicht>> {
        let kameras = CameraRepository::list(&*self.repo).await?;
        let nvr_namen: HashMap<NvrId, String> = NvrRepository::list(&*self.repo)
            .await?
            .into_iter()
            .map(|n| (n.id, n.display_name))
            .collect();

        Ok(kameras
            .into_iter()
            .map(|k| {
                let nvr_name = k.nvr_id.and_then(|id| nvr_namen.get(&id).cloned());
                KameraAnsicht::neu(k, nvr_name)
            })
            .collect())
    }

    pub async fn erstellen(&self, eingabe: KameraEingabe) -> FlotteResult<KameraRecord> {
        let name = eingabe.name.trim();
        let display_name = eingabe.display_name.trim();
        let rtsp_url = eingabe.rtsp_url.trim();

        if name.is_empty() || display_name.is_empty() || rtsp_url.is_empty() {
            return Err(FlotteError::validierung(
                "name, display_name und rtsp_url sind Pflichtfelder",
            ));
        }
        self.name_pruefen(name).await?;
        if let Some(nvr_id) = eingabe.nvr_id {
            self.nvr_pruefen(nvr_id).await?;
        }

        let kamera = CameraRepository::create(
            &*self.repo,
            NeueKamera {
                name,
                display_name,
                rtsp_url,
                nvr_id: eingabe.nvr_id,
                active: eingabe.active,
                recording_enabled: eingabe.recording_enabled,
                notes: eingabe.notes.as_deref(),
            },
        )
        .await?;

        self.registry
            .kamera_registrieren(&stream_kamera(&kamera))
            .await;

        tracing::info!(kamera_id = %kamera.id, stream = %kamera.name, "Kamera angelegt");
        Ok(kamera)
    }

    pub async fn aktualisieren(&self, id: KameraId, patch: KameraPatch) -> FlotteResult<KameraRecord> {
        let alt = self.laden(id).await?;
        let mut update = KameraUpdate::default();

        if let Some(name) = patch.name {
            let name = name.trim();
            if name != alt.name {
                self.name_pruefen(name).await?;
                update.name = Some(name.to_string());
            }
        }
        if let Some(display_name) = patch.display_name {
            update.display_name = Some(pflichtfeld("display_name", &display_name)?);
        }
        if let Some(rtsp_url) = patch.rtsp_url {
            update.rtsp_url = Some(pflichtfeld("rtsp_url", &rtsp_url)?);
        }
        if let Some(nvr_id) = patch.nvr_id {
            if let Some(nvr_id) = nvr_id {
                self.nvr_pruefen(nvr_id).await?;
            }
            update.nvr_id = Some(nvr_id);
        }
        update.active = patch.active;
        update.recording_enabled = patch.recording_enabled;
        update.notes = patch.notes;

        let neu = if update.ist_leer() {
            alt.clone()
        } else {
            CameraRepository::update(&*self.repo, id, update).await?
        };

        let stream = stream_kamera(&neu);
        if neu.name != alt.name {
            self.registry.umbenennen(&alt.name, &stream).await;
            tracing::info!(kamera_id = %id, alt = %alt.name, neu = %neu.name, "Kamera umbenannt");
        } else if alt.recording_enabled && !neu.recording_enabled {
            self.registry.aufnahme_beendet(&stream).await;
        } else {
            self.registry.kamera_registrieren(&stream).await;
        }

        Ok(neu)
    }

    pub async fn aufnahme_setzen(&self, id: KameraId, aktiv: bool) -> FlotteResult<KameraRecord> {
        let kamera = self
            .aktualisieren(
                id,
                KameraPatch {
                    recording_enabled: Some(aktiv),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(kamera_id = %id, aufnahme = aktiv, "Aufzeichnung umgeschaltet");
        Ok(kamera)
    }

    pub async fn loeschen(&self, id: KameraId) -> FlotteResult<()> {
        let kamera = self.laden(id).await?;

        self.registry.abmelden(&kamera.name).await;
        CameraRepository::delete(&*self.repo, id).await?;

        tracing::info!(kamera_id = %id, stream = %kamera.name, "Kamera geloescht");
        Ok(())
    }

    async fn name_pruefen(&self, name: &str) -> FlotteResult<()> {
        if !name_gueltig(name) {
            return Err(FlotteError::validierung(format!(
                "Stream-Name '{name}' darf nur Buchstaben, Ziffern, '_' und '-' enthalten"
            )));
        }
        if CameraRepository::exists_by_name(&*self.repo, name).await? {
            return Err(FlotteError::validierung(format!(
                "Stream-Name '{name}' bereits vergeben"
            )));
        }
        Ok(())
    }

    async fn nvr_pruefen(&self, nvr_id: NvrId) -> FlotteResult<()> {
        if !NvrRepository::exists(&*self.repo, nvr_id).await? {
            return Err(FlotteError::nicht_gefunden(format!("NVR {nvr_id}")));
        }
        Ok(())
    }
}

fn pflichtfeld(feld: &str, wert: &str) -> FlotteResult<String> {
    let wert = wert.trim();
    if wert.is_empty() {
        return Err(FlotteError::validierung(format!("{feld} darf nicht leer sein")));
    }
    Ok(wert.to_string())
}
