//! Fehlertypen fuer DotField
//!
//! Der Kern kennt nur wenige echte Fehlerzustaende. Eine unbekannte Session
//! wird dem Client als `restart` gemeldet, ID-Kollisionen werden intern
//! wiederholt und tauchen hier gar nicht erst auf.

use thiserror::Error;

/// Globaler Result-Alias fuer DotField
pub type Result<T> = std::result::Result<T, DotFieldError>;

/// Alle moeglichen Fehler im DotField-Kern
#[derive(Debug, Error)]
pub enum DotFieldError {
    /// Reconnect mit einer ID die der Registry nicht bekannt ist
    /// (typischerweise nach einem Neustart des Servers)
    #[error("Unbekannte Session: {0}")]
    UnbekannteSession(String),
}
