//! Ableitung von Stream-Namen, Labels und RTSP-URLs aus NVR-Daten
//!
//! Pro Kanal `ch` liefert ein NVR zwei Streams:
//!
//! | Variante | Name               | RTSP-Kanal   |
//! |----------|--------------------|--------------|
//! | Main     | `{nvr}-ch{ch}-main` | `ch*100 + 1` |
//! | Sub      | `{nvr}-ch{ch}-sub`  | `ch*100 + 2` |
//!
//! Die Zuordnung Main/Sub ergibt sich ausschliesslich aus dem Namenssuffix
//! und wird nirgends gespeichert.

use opus_db::models::NvrRecord;

pub const RTSP_PORT: u16 = 554;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamVariante {
    Main,
    Sub,
}

impl StreamVariante {
    pub const ALLE: [StreamVariante; 2] = [StreamVariante::Main, StreamVariante::Sub];

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Main => "-main",
            Self::Sub => "-sub",
        }
    }

    fn bezeichnung(self) -> &'static str {
        match self {
            Self::Main => "Main",
            Self::Sub => "Sub",
        }
    }

    fn kanal_offset(self) -> i64 {
        match self {
            Self::Main => 1,
            Self::Sub => 2,
        }
    }

    pub fn gegenteil(self) -> Self {
        match self {
            Self::Main => Self::Sub,
            Self::Sub => Self::Main,
        }
    }
}

/// Ein aus (NVR, Kanal, Variante) abgeleiteter Stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbgeleiteterStream {
    pub name: String,
    pub label: String,
    pub rtsp_url: String,
    pub kanal: i64,
    pub variante: StreamVariante,
}

/// Kanalnummer im Hikvision-Schema (`/Streaming/Channels/{n}`)
pub fn rtsp_kanal(kanal: i64, variante: StreamVariante) -> i64 {
    kanal * 100 + variante.kanal_offset()
}

pub fn stream_name(nvr_name: &str, kanal: i64, variante: StreamVariante) -> String {
    format!("{nvr_name}-ch{kanal}{}", variante.suffix())
}

/// Leitet einen Stream ab; fehlende Verbindungsfelder werden zum Leerstring
pub fn stream_ableiten(nvr: &NvrRecord, kanal: i64, variante: StreamVariante) -> AbgeleiteterStream {
    let benutzer = nvr.username.as_deref().unwrap_or_default();
    let passwort = nvr.password.as_deref().unwrap_or_default();
    let ip = nvr.ip_address.as_deref().unwrap_or_default();

    AbgeleiteterStream {
        name: stream_name(&nvr.name, kanal, variante),
        label: format!(
            "{} — Ch {kanal} {}",
            nvr.display_name,
            variante.bezeichnung()
        ),
        rtsp_url: format!(
            "rtsp://{benutzer}:{passwort}@{ip}:{RTSP_PORT}/Streaming/Channels/{}",
            rtsp_kanal(kanal, variante)
        ),
        kanal,
        variante,
    }
}

/// Alle Streams eines NVR in Abgleich-Reihenfolge: Kanal aufsteigend, Main vor Sub
pub fn alle_streams(nvr: &NvrRecord) -> impl Iterator<Item = AbgeleiteterStream> + '_ {
    (1..=nvr.max_channels).flat_map(move |kanal| {
        StreamVariante::ALLE
            .into_iter()
            .map(move |variante| stream_ableiten(nvr, kanal, variante))
    })
}

pub fn variante_aus_name(name: &str) -> Option<StreamVariante> {
    StreamVariante::ALLE
        .into_iter()
        .find(|v| name.ends_with(v.suffix()))
}

/// Name des Gegenstuecks (`x-main` <-> `x-sub`)
pub fn gegenstueck(name: &str) -> Option<String> {
    let variante = variante_aus_name(name)?;
    let stamm = name.strip_suffix(variante.suffix())?;
    Some(format!("{stamm}{}", variante.gegenteil().suffix()))
}

/// Browser-Player des Daemons hinter dem Reverse-Proxy
pub fn player_url(name: &str) -> String {
    format!("/go2rtc/stream.html?src={name}&mode=mse")
}
