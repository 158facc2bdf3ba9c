//! dotfield-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen DotField-Crates gemeinsam genutzt werden: Session-IDs, die sechs
//! Wuerfelseiten, Rasterkoordinaten und Farbtypen.

pub mod error;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{DotFieldError, Result};
pub use types::{ColorIndex, Coords, Face, Rgb, SessionId};
