//! Gemeinsame Identifikations- und Wertetypen fuer DotField
//!
//! Session-IDs verwenden das Newtype-Pattern, damit sie nicht mit anderen
//! Strings verwechselt werden koennen. Die Wuerfelseiten sind ein geschlossener
//! Enum, auf dem Draht kleingeschrieben (`"front"`, `"top"`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index in die gemeinsame Farbpalette
pub type ColorIndex = usize;

/// Opake, global eindeutige Session-ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Erstellt eine SessionId aus einem beliebigen String
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Gibt die ID als &str zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Eine der sechs Seiten des physischen Wuerfels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    Top,
    Front,
    Left,
    Right,
    Back,
    Bottom,
}

impl Face {
    /// Alle Seiten in kanonischer Reihenfolge
    pub const ALLE: [Face; 6] = [
        Face::Top,
        Face::Front,
        Face::Left,
        Face::Right,
        Face::Back,
        Face::Bottom,
    ];

    /// Name der Seite wie er auf dem Draht verwendet wird
    pub fn name(&self) -> &'static str {
        match self {
            Face::Top => "top",
            Face::Front => "front",
            Face::Left => "left",
            Face::Right => "right",
            Face::Back => "back",
            Face::Bottom => "bottom",
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Zellkoordinate im Raster einer Seite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coords {
    pub x: u32,
    pub y: u32,
}

impl Coords {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// RGB-Farbe, auf dem Draht als `[r, g, b]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }
}
