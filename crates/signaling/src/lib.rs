//! dotfield-signaling – Sessions, Routing und Autopilot der Installation
//!
//! Dieser Crate haelt den einzigen zustandsbehafteten Teil von DotField:
//! wer verbunden ist, welches Event an wen geht und wann der Wuerfel
//! synthetische Aktivitaet bekommt.
//!
//! ## Architektur
//!
//! ```text
//! WebServer (axum, GET /ws)          CubeServer (TCP, JSON-Zeilen)
//!     |                                   ^
//!     v                                   |
//! ClientConnection (ein Task pro Socket)  KanalHardwareSink
//!     |                                   ^
//!     v  Befehl                           |
//! Installation (ein Task, serialisierte Zeitlinie)
//!     |
//!     +-- SessionRegistry     (join / reconnect / restart)
//!     +-- EventRouter         (activate, deactivate, nyan)
//!     +-- AutopilotController (Aktiviert <-> Deaktiviert, Tick)
//!     +-- AutopilotFarben     (rotierendes Farbfenster)
//!     +-- SessionZuteiler     (Seite und Farben)
//!     +-- Zeitgeber           (Tick, Rotation, Leerlauf)
//! ```

pub mod allocator;
pub mod autopilot;
pub mod broadcast;
pub mod connection;
pub mod cube;
pub mod error;
pub mod hardware;
pub mod id;
pub mod installation;
pub mod palette;
pub mod registry;
pub mod router;
pub mod session;
pub mod timer;
pub mod ws;

// Bequeme Re-Exporte
pub use allocator::{SessionZuteiler, ZufallsZuteiler};
pub use autopilot::{AutopilotController, AutopilotZustand};
pub use broadcast::BroadcastFilter;
pub use connection::ClientConnection;
pub use cube::CubeServer;
pub use error::{SignalingError, SignalingResult};
pub use hardware::{HardwareSink, KanalHardwareSink};
pub use installation::{
    installation_starten, Befehl, Installation, InstallationConfig, InstallationHandle,
    InstallationStatus,
};
pub use palette::Palette;
pub use registry::SessionRegistry;
pub use router::EventRouter;
pub use session::{ClientSender, Session};
pub use timer::{TokioZeitgeber, VirtuellerZeitgeber, Zeitgeber};
pub use ws::WebServer;
