//! dotfield-protocol – Event-Definitionen
//!
//! Dieses Crate definiert alle benannten Events die zwischen Browser-Clients,
//! Server und Cube-Hardware ausgetauscht werden, sowie den Zeilen-Codec fuer
//! die Hardware-Verbindung.

pub mod event;
pub mod wire;

pub use event::{ClientEvent, HardwareEvent, ServerEvent, WelcomeMessage, APP_KENNUNG};
pub use wire::CubeCodec;
