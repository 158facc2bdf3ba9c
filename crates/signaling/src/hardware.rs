//! Hardware-Senke – Events an den physischen Wuerfel
//!
//! Senden ist fire-and-forget: eine langsame oder getrennte Cube-Verbindung
//! darf die Installation nie aufhalten.

use dotfield_protocol::event::HardwareEvent;
use tokio::sync::broadcast;

/// Standard-Puffergroesse fuer Hardware-Events pro Empfaenger
pub const HARDWARE_KANAL_GROESSE: usize = 256;

/// Empfaenger aller Hardware-Events
pub trait HardwareSink: Send + 'static {
    fn senden(&self, event: HardwareEvent);
}

/// Verteilt Hardware-Events ueber einen tokio-Broadcast-Kanal
///
/// Jede Cube-Verbindung abonniert den Kanal. Wer zu langsam liest,
/// ueberspringt Events; ohne Abonnenten gehen Events verloren.
#[derive(Clone, Debug)]
pub struct KanalHardwareSink {
    tx: broadcast::Sender<HardwareEvent>,
}

impl KanalHardwareSink {
    pub fn neu(kapazitaet: usize) -> Self {
        let (tx, _) = broadcast::channel(kapazitaet);
        Self { tx }
    }

    pub fn abonnieren(&self) -> broadcast::Receiver<HardwareEvent> {
        self.tx.subscribe()
    }

    /// Anzahl verbundener Empfaenger
    pub fn empfaenger_anzahl(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for KanalHardwareSink {
    fn default() -> Self {
        Self::neu(HARDWARE_KANAL_GROESSE)
    }
}

impl HardwareSink for KanalHardwareSink {
    fn senden(&self, event: HardwareEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!(event = event.name(), "Kein Cube verbunden – Event verworfen");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotfield_core::types::{Coords, Face};
    use dotfield_protocol::event::ZellAufSeite;

    fn nyan() -> HardwareEvent {
        HardwareEvent::Nyan(ZellAufSeite {
            coords: Coords::new(2, 2),
            face: Face::Right,
        })
    }

    #[test]
    fn ohne_empfaenger_kein_fehler() {
        let sink = KanalHardwareSink::default();
        sink.senden(nyan());
        assert_eq!(sink.empfaenger_anzahl(), 0);
    }

    #[test]
    fn alle_empfaenger_bekommen_das_event() {
        let sink = KanalHardwareSink::neu(8);
        let mut a = sink.abonnieren();
        let mut b = sink.abonnieren();

        sink.senden(nyan());
        assert_eq!(a.try_recv().unwrap(), nyan());
        assert_eq!(b.try_recv().unwrap(), nyan());
    }

    #[test]
    fn langsamer_empfaenger_ueberspringt() {
        let sink = KanalHardwareSink::neu(2);
        let mut rx = sink.abonnieren();
        for _ in 0..5 {
            sink.senden(nyan());
        }
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(3))
        ));
        assert!(rx.try_recv().is_ok());
    }
}
