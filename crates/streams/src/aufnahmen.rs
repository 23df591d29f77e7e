//! Katalog der vom Daemon aufgezeichneten Segmente
//!
//! Layout auf der Platte: `{wurzel}/{kamera}/{YYYY-MM-DD_HH-MM-SS}.mp4`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{StreamError, StreamResult};

const SEGMENT_ENDUNG: &str = ".mp4";
const ZEITSTEMPEL_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Ein aufgezeichnetes Segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aufnahme {
    pub camera_name: String,
    pub filename: String,
    pub size: u64,
    /// Groesse in MiB, auf eine Nachkommastelle gerundet
    pub size_mb: f64,
    pub started_at: Option<NaiveDateTime>,
    pub download_url: String,
}

fn groesse_mb(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 / 1024.0 * 10.0).round() / 10.0
}

/// Startzeit aus dem Dateinamen, `None` wenn er nicht dem Muster folgt
pub fn startzeit_parsen(dateiname: &str) -> Option<NaiveDateTime> {
    let stamm = dateiname.strip_suffix(SEGMENT_ENDUNG).unwrap_or(dateiname);
    NaiveDateTime::parse_from_str(stamm, ZEITSTEMPEL_FORMAT).ok()
}

/// Alle Segmente je Kamera, neueste zuerst
///
/// Kameras ohne Segmente fehlen im Ergebnis, ein fehlendes Wurzelverzeichnis
/// ergibt eine leere Map.
pub async fn aufnahmen_auflisten(
    wurzel: &Path,
    kamera_filter: Option<&str>,
) -> StreamResult<BTreeMap<String, Vec<Aufnahme>>> {
    let mut ergebnis = BTreeMap::new();

    if !tokio::fs::try_exists(wurzel).await? {
        return Ok(ergebnis);
    }

    let mut verzeichnisse = tokio::fs::read_dir(wurzel).await?;
    while let Some(eintrag) = verzeichnisse.next_entry().await? {
        if !eintrag.file_type().await?.is_dir() {
            continue;
        }
        let Ok(kamera) = eintrag.file_name().into_string() else {
            continue;
        };
        if kamera_filter.is_some_and(|f| f != kamera) {
            continue;
        }

        let segmente = segmente_lesen(&eintrag.path(), &kamera).await?;
        if !segmente.is_empty() {
            ergebnis.insert(kamera, segmente);
        }
    }

    Ok(ergebnis)
}

async fn segmente_lesen(verzeichnis: &Path, kamera: &str) -> StreamResult<Vec<Aufnahme>> {
    let mut segmente = Vec::new();

    let mut dateien = tokio::fs::read_dir(verzeichnis).await?;
    while let Some(eintrag) = dateien.next_entry().await? {
        let Ok(dateiname) = eintrag.file_name().into_string() else {
            continue;
        };
        if !dateiname.ends_with(SEGMENT_ENDUNG) {
            continue;
        }
        let size = eintrag.metadata().await?.len();

        segmente.push(Aufnahme {
            camera_name: kamera.to_string(),
            started_at: startzeit_parsen(&dateiname),
            download_url: format!("/api/recordings/{kamera}/{dateiname}"),
            filename: dateiname,
            size_mb: groesse_mb(size),
            size,
        });
    }

    // Zeitstempel im Namen sortieren lexikographisch = chronologisch
    segmente.sort_by(|a, b| b.filename.cmp(&a.filename));
    Ok(segmente)
}

/// Loest einen Segment-Pfad innerhalb der Wurzel auf
pub async fn segment_aufloesen(wurzel: &Path, kamera: &str, datei: &str) -> StreamResult<PathBuf> {
    for teil in [kamera, datei] {
        if teil.is_empty() || teil.contains("..") || teil.contains('/') || teil.contains('\\') {
            return Err(StreamError::UngueltigerPfad(teil.to_string()));
        }
    }
    if !datei.ends_with(SEGMENT_ENDUNG) {
        return Err(StreamError::UngueltigerPfad(format!(
            "{datei}: nur {SEGMENT_ENDUNG}-Dateien"
        )));
    }

    let pfad = wurzel.join(kamera).join(datei);
    if !tokio::fs::try_exists(&pfad).await? {
        return Err(StreamError::NichtGefunden(format!("{kamera}/{datei}")));
    }
    Ok(pfad)
}
