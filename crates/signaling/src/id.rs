//! Session-ID-Vergabe
//!
//! IDs sind 128 Bit aus dem Thread-RNG (ChaCha, kryptografisch sicher),
//! URL-sicher Base64-kodiert. Jede vergebene ID wird zusaetzlich in einem
//! Set "verbrannter" IDs gemerkt; eine Kollision fuehrt zu einem neuen Versuch
//! und verlaesst diesen Modul nie.

use base64::Engine;
use dotfield_core::SessionId;
use rand::RngCore;
use std::collections::HashSet;

/// Anzahl Zufallsbytes pro ID (22 Zeichen Base64)
const ID_BYTES: usize = 16;

/// Vergibt paarweise verschiedene Session-IDs
#[derive(Debug, Default)]
pub struct IdGenerator {
    verbrannt: HashSet<SessionId>,
}

impl IdGenerator {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Erzeugt eine neue, bisher nie vergebene ID
    pub fn generieren(&mut self) -> SessionId {
        self.generieren_mit(token_generieren)
    }

    /// Wie `generieren`, aber mit austauschbarer Token-Quelle
    pub(crate) fn generieren_mit(&mut self, mut quelle: impl FnMut() -> String) -> SessionId {
        loop {
            let id = SessionId::new(quelle());
            if self.verbrannt.insert(id.clone()) {
                return id;
            }
            tracing::debug!(session_id = %id, "ID-Kollision, neuer Versuch");
        }
    }

    /// Prueft ob eine ID bereits vergeben wurde
    pub fn ist_verbrannt(&self, id: &SessionId) -> bool {
        self.verbrannt.contains(id)
    }

    /// Anzahl bisher vergebener IDs
    pub fn anzahl(&self) -> usize {
        self.verbrannt.len()
    }
}

/// Generiert einen kryptografisch sicheren Token (URL-sicheres Base64)
fn token_generieren() -> String {
    let mut bytes = [0u8; ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_sind_paarweise_verschieden() {
        let mut gen = IdGenerator::neu();
        let ids: HashSet<SessionId> = (0..1000).map(|_| gen.generieren()).collect();
        assert_eq!(ids.len(), 1000);
        assert_eq!(gen.anzahl(), 1000);
    }

    #[test]
    fn id_hat_feste_laenge() {
        let mut gen = IdGenerator::neu();
        let id = gen.generieren();
        assert_eq!(id.as_str().len(), 22);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn kollision_wird_wiederholt() {
        let mut gen = IdGenerator::neu();
        let mut folge = vec!["b", "a", "a", "a"];
        let erste = gen.generieren_mit(|| folge.pop().unwrap_or("x").to_string());
        assert_eq!(erste.as_str(), "a");

        // Die Quelle liefert noch zweimal "a" – beide werden verworfen
        let zweite = gen.generieren_mit(|| folge.pop().unwrap_or("x").to_string());
        assert_eq!(zweite.as_str(), "b");
        assert!(gen.ist_verbrannt(&SessionId::new("a")));
        assert!(gen.ist_verbrannt(&SessionId::new("b")));
    }
}
