//! Session und Client-Sender
//!
//! Eine `Session` ist der serverseitige Datensatz eines Browser-Clients:
//! ID, gewaehlte Wuerfelseite und Farbzuteilung. Die Verbindung selbst ist
//! austauschbar – nach einem Reconnect zeigt `sender` auf die neue Queue.

use dotfield_core::types::{ColorIndex, Face, SessionId};
use dotfield_protocol::event::{ServerEvent, WelcomeMessage, APP_KENNUNG};
use tokio::sync::mpsc;

use crate::palette::Palette;

/// Groesse der Send-Queue pro Verbindung
pub const SEND_QUEUE_GROESSE: usize = 64;

/// Laufende Nummer einer WebSocket-Verbindung
pub type VerbindungsId = u64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue einer Verbindung
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub verbindung_id: VerbindungsId,
    tx: mpsc::Sender<ServerEvent>,
}

impl ClientSender {
    pub fn neu(verbindung_id: VerbindungsId, tx: mpsc::Sender<ServerEvent>) -> Self {
        Self { verbindung_id, tx }
    }

    /// Erstellt Sender und Empfaenger mit Standard-Queue-Groesse
    pub fn kanal(verbindung_id: VerbindungsId) -> (Self, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        (Self::neu(verbindung_id, tx), rx)
    }

    /// Sendet ein Event nicht-blockierend an die Verbindung
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, event: ServerEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(ev)) => {
                tracing::warn!(
                    verbindung = self.verbindung_id,
                    event = ev.name(),
                    "Send-Queue voll – Event verworfen"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    verbindung = self.verbindung_id,
                    "Send-Queue geschlossen (Client getrennt)"
                );
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Serverseitiger Datensatz eines Clients
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    /// Aktuelle Verbindung (wird beim Reconnect ersetzt)
    pub sender: ClientSender,
    pub face: Face,
    pub start_color_index: ColorIndex,
    pub end_color_index: ColorIndex,
}

impl Session {
    /// Bindet die Session an eine neue Verbindung
    pub fn transport_binden(&mut self, sender: ClientSender) {
        self.sender = sender;
    }

    pub fn senden(&self, event: ServerEvent) -> bool {
        self.sender.senden(event)
    }

    /// Beschreibt den aktuellen Zustand der Session fuer den Client
    pub fn welcome(&self, palette: &Palette) -> WelcomeMessage {
        WelcomeMessage {
            app: APP_KENNUNG.to_string(),
            id: self.id.clone(),
            colors: palette.farben().to_vec(),
            start_color_index: self.start_color_index,
            end_color_index: self.end_color_index,
            face: self.face,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotfield_core::types::Rgb;

    fn test_session(sender: ClientSender) -> Session {
        Session {
            id: SessionId::new("s1"),
            sender,
            face: Face::Left,
            start_color_index: 1,
            end_color_index: 0,
        }
    }

    #[tokio::test]
    async fn senden_erreicht_empfaenger() {
        let (sender, mut rx) = ClientSender::kanal(1);
        assert!(sender.senden(ServerEvent::Restart));
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::Restart);
    }

    #[tokio::test]
    async fn volle_queue_verwirft() {
        let (tx, _rx) = mpsc::channel(1);
        let sender = ClientSender::neu(7, tx);
        assert!(sender.senden(ServerEvent::Restart));
        assert!(!sender.senden(ServerEvent::Restart));
    }

    #[tokio::test]
    async fn geschlossene_queue_verwirft() {
        let (sender, rx) = ClientSender::kanal(2);
        drop(rx);
        assert!(!sender.senden(ServerEvent::Restart));
    }

    #[tokio::test]
    async fn transport_binden_ersetzt_verbindung() {
        let (alt, mut alt_rx) = ClientSender::kanal(1);
        let (neu, mut neu_rx) = ClientSender::kanal(2);
        let mut session = test_session(alt);

        session.transport_binden(neu);
        assert_eq!(session.sender.verbindung_id, 2);
        session.senden(ServerEvent::Restart);

        assert!(alt_rx.try_recv().is_err());
        assert!(neu_rx.try_recv().is_ok());
    }

    #[test]
    fn welcome_beschreibt_session() {
        let (sender, _rx) = ClientSender::kanal(1);
        let session = test_session(sender);
        let palette = Palette::neu(vec![Rgb::new(1, 2, 3), Rgb::new(4, 5, 6)]).unwrap();

        let welcome = session.welcome(&palette);
        assert_eq!(welcome.app, "DotField");
        assert_eq!(welcome.id, session.id);
        assert_eq!(welcome.colors.len(), 2);
        assert_eq!(welcome.start_color_index, 1);
        assert_eq!(welcome.end_color_index, 0);
        assert_eq!(welcome.face, Face::Left);
    }
}
