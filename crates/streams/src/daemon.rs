//! Transport zum go2rtc-Daemon
//!
//! Endpunkte:
//! - `PUT    {basis}/api/streams?name=X&src=Y` – Quelle zu Stream X hinzufuegen
//! - `DELETE {basis}/api/streams?name=X`       – Stream X mit allen Quellen entfernen
//! - `GET    {basis}/api/streams`              – `{ name: { producers: [...] } }`
//!
//! Der Transport gibt Fehler zurueck. Ob sie geschluckt werden, entscheidet
//! die [`StreamRegistry`](crate::registry::StreamRegistry).

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StreamError, StreamResult};

/// Zustand eines Streams laut `GET /api/streams`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    #[serde(default)]
    pub producers: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub consumers: Option<Vec<serde_json::Value>>,
}

impl StreamInfo {
    /// Ein Stream gilt als online, sobald er mindestens einen Producer hat
    pub fn ist_online(&self) -> bool {
        self.producers.as_ref().is_some_and(|p| !p.is_empty())
    }
}

/// HTTP-Steuerschnittstelle des Stream-Daemons
#[allow(async_fn_in_trait)]
pub trait StreamDaemon: Send + Sync {
    /// Fuegt dem Stream `name` die Quelle `src` hinzu (legt ihn ggf. an)
    async fn quelle_hinzufuegen(&self, name: &str, src: &str) -> StreamResult<()>;

    /// Entfernt den Stream `name` samt aller Quellen
    async fn stream_entfernen(&self, name: &str) -> StreamResult<()>;

    /// Alle beim Daemon bekannten Streams
    async fn streams_auflisten(&self) -> StreamResult<BTreeMap<String, StreamInfo>>;
}

/// reqwest-basierter Client fuer die go2rtc-API
#[derive(Debug, Clone)]
pub struct Go2RtcClient {
    client: reqwest::Client,
    basis_url: String,
}

impl Go2RtcClient {
    /// Erstellt einen Client mit festem Timeout pro Anfrage
    pub fn neu(basis_url: impl Into<String>, timeout: Duration) -> StreamResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let basis_url = basis_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, basis_url })
    }

    pub fn basis_url(&self) -> &str {
        &self.basis_url
    }

    fn streams_url(&self) -> String {
        format!("{}/api/streams", self.basis_url)
    }
}

impl StreamDaemon for Go2RtcClient {
    async fn quelle_hinzufuegen(&self, name: &str, src: &str) -> StreamResult<()> {
        let resp = self
            .client
            .put(self.streams_url())
            .query(&[("name", name), ("src", src)])
            .send()
            .await?;
        status_pruefen(resp).await?;

        tracing::debug!(stream = name, src, "Quelle beim Daemon registriert");
        Ok(())
    }

    async fn stream_entfernen(&self, name: &str) -> StreamResult<()> {
        let resp = self
            .client
            .delete(self.streams_url())
            .query(&[("name", name)])
            .send()
            .await?;
        status_pruefen(resp).await?;

        tracing::debug!(stream = name, "Stream beim Daemon entfernt");
        Ok(())
    }

    async fn streams_auflisten(&self) -> StreamResult<BTreeMap<String, StreamInfo>> {
        let resp = self.client.get(self.streams_url()).send().await?;
        let resp = status_pruefen(resp).await?;

        // go2rtc liefert `null` statt `{}`, solange kein Stream existiert
        let streams: Option<BTreeMap<String, StreamInfo>> = resp
            .json()
            .await
            .map_err(|e| StreamError::Antwort(e.to_string()))?;
        Ok(streams.unwrap_or_default())
    }
}

async fn status_pruefen(resp: reqwest::Response) -> StreamResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let nachricht = resp.text().await.unwrap_or_default();
    Err(StreamError::Status {
        status: status.as_u16(),
        nachricht,
    })
}
