//! Aufzeichnender Fake-Daemon fuer Tests
//!
//! Haelt einen einfachen Stream-Zustand im Speicher und protokolliert jeden
//! Aufruf, auch die absichtlich fehlschlagenden.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::daemon::{StreamDaemon, StreamInfo};
use crate::error::{StreamError, StreamResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aufruf {
    Hinzufuegen { name: String, src: String },
    Entfernen { name: String },
}

impl Aufruf {
    pub fn hinzufuegen(name: &str, src: &str) -> Self {
        Self::Hinzufuegen {
            name: name.into(),
            src: src.into(),
        }
    }

    pub fn entfernen(name: &str) -> Self {
        Self::Entfernen { name: name.into() }
    }
}

#[derive(Debug, Default)]
pub struct FakeDaemon {
    aufrufe: Mutex<Vec<Aufruf>>,
    streams: Mutex<BTreeMap<String, Vec<String>>>,
    fehlschlagen: AtomicBool,
}

impl FakeDaemon {
    /// Laesst ab jetzt jeden Aufruf mit einem Status-Fehler scheitern
    pub fn fehlschlagen(&self, an: bool) {
        self.fehlschlagen.store(an, Ordering::SeqCst);
    }

    pub fn aufrufe(&self) -> Vec<Aufruf> {
        self.aufrufe.lock().unwrap().clone()
    }

    pub fn aufrufe_leeren(&self) {
        self.aufrufe.lock().unwrap().clear();
    }

    /// Aktuell registrierte Quellen eines Streams
    pub fn quellen(&self, name: &str) -> Vec<String> {
        self.streams
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn stream_namen(&self) -> Vec<String> {
        self.streams.lock().unwrap().keys().cloned().collect()
    }

    fn pruefen(&self) -> StreamResult<()> {
        if self.fehlschlagen.load(Ordering::SeqCst) {
            return Err(StreamError::Status {
                status: 503,
                nachricht: "Daemon nicht erreichbar".into(),
            });
        }
        Ok(())
    }
}

impl StreamDaemon for FakeDaemon {
    async fn quelle_hinzufuegen(&self, name: &str, src: &str) -> StreamResult<()> {
        self.aufrufe
            .lock()
            .unwrap()
            .push(Aufruf::hinzufuegen(name, src));
        self.pruefen()?;

        let mut streams = self.streams.lock().unwrap();
        let quellen = streams.entry(name.to_string()).or_default();
        if !quellen.iter().any(|q| q == src) {
            quellen.push(src.to_string());
        }
        Ok(())
    }

    async fn stream_entfernen(&self, name: &str) -> StreamResult<()> {
        self.aufrufe.lock().unwrap().push(Aufruf::entfernen(name));
        self.pruefen()?;

        self.streams.lock().unwrap().remove(name);
        Ok(())
    }

    async fn streams_auflisten(&self) -> StreamResult<BTreeMap<String, StreamInfo>> {
        self.pruefen()?;

        Ok(self
            .streams
            .lock()
            .unwrap()
            .iter()
            .map(|(name, quellen)| {
                let producers = quellen
                    .iter()
                    .map(|q| serde_json::json!({ "url": q }))
                    .collect();
                (
                    name.clone(),
                    StreamInfo {
                        producers: Some(producers),
                        consumers: None,
                    },
                )
            })
            .collect())
    }
}
