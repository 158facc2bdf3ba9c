//! Wire-Format fuer die Cube-Verbindung (TCP)
//!
//! Zeilenbasiertes Protokoll: ein JSON-Objekt pro Zeile, abgeschlossen mit `\n`.
//!
//! ```text
//! {"event":"activate","data":{"startColorIndex":1,...}}\n
//! {"event":"nyan","data":{"coords":{"x":0,"y":7},"face":"top"}}\n
//! ```
//!
//! Der Server schreibt nur; der Decoder existiert fuer Cube-Simulatoren und Tests.

use bytes::{BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

use crate::event::HardwareEvent;

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Standard-maximale Zeilenlaenge (64 KB)
pub const DEFAULT_MAX_ZEILE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// CubeCodec
// ---------------------------------------------------------------------------

/// tokio-util Codec fuer die Cube-Verbindung
///
/// Implementiert `Encoder<HardwareEvent>` und `Decoder` fuer
/// `tokio_util::codec::Framed`.
#[derive(Debug, Clone)]
pub struct CubeCodec {
    max_zeile: usize,
    /// Bereits durchsuchter Teil des Puffers (kein erneutes Scannen)
    gescannt: usize,
}

impl CubeCodec {
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_ZEILE)
    }

    /// Erstellt einen `CubeCodec` mit benutzerdefinierter maximaler Zeilenlaenge
    pub fn with_max_size(max_zeile: usize) -> Self {
        Self {
            max_zeile,
            gescannt: 0,
        }
    }
}

impl Default for CubeCodec {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Decoder-Implementierung
// ---------------------------------------------------------------------------

impl Decoder for CubeCodec {
    type Item = HardwareEvent;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let ende = match src[self.gescannt..].iter().position(|b| *b == b'\n') {
                Some(pos) => self.gescannt + pos,
                None => {
                    if src.len() > self.max_zeile {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!(
                                "Zeile zu lang: {} Bytes (Maximum: {} Bytes)",
                                src.len(),
                                self.max_zeile
                            ),
                        ));
                    }
                    self.gescannt = src.len();
                    return Ok(None);
                }
            };

            let zeile = src.split_to(ende + 1);
            self.gescannt = 0;

            let inhalt = &zeile[..ende];
            // Leerzeilen (auch "\r\n") ueberspringen
            if inhalt.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }

            let event: HardwareEvent = serde_json::from_slice(inhalt).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("JSON-Deserialisierung fehlgeschlagen: {}", e),
                )
            })?;
            return Ok(Some(event));
        }
    }
}

// ---------------------------------------------------------------------------
// Encoder-Implementierung
// ---------------------------------------------------------------------------

impl Encoder<HardwareEvent> for CubeCodec {
    type Error = io::Error;

    fn encode(&mut self, item: HardwareEvent, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_vec(&item).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("JSON-Serialisierung fehlgeschlagen: {}", e),
            )
        })?;

        dst.reserve(json.len() + 1);
        dst.put_slice(&json);
        dst.put_u8(b'\n');
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
