//! opus-streams – Anbindung an den go2rtc-Stream-Daemon
//!
//! - [`daemon`]: Transport-Trait und HTTP-Client fuer `/api/streams`
//! - [`registry`]: Best-Effort-Registry (Fehler werden geloggt, nicht propagiert)
//! - [`aufnahmen`]: Katalog der aufgezeichneten Segmente auf der Platte

pub mod aufnahmen;
pub mod daemon;
pub mod error;
pub mod registry;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use aufnahmen::{aufnahmen_auflisten, segment_aufloesen, Aufnahme};
pub use daemon::{Go2RtcClient, StreamDaemon, StreamInfo};
pub use error::{StreamError, StreamResult};
pub use registry::{AufnahmeAbschaltung, StreamKamera, StreamRegistry};
