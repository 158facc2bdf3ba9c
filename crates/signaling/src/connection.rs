//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede Browser-Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Eingehende Textframes werden zu `ClientEvent`s dekodiert und
//! an die Installation weitergereicht; ausgehende `ServerEvent`s kommen ueber
//! die `ClientSender`-Queue zurueck.
//!
//! ```text
//! WebSocket --Text--> ClientEvent --Befehl--> Installation
//! WebSocket <--Text-- ServerEvent <--mpsc---- ClientSender
//! ```
//!
//! Beim Schliessen wird nur die Zuordnung Verbindung -> Session geloest; die
//! Session selbst bleibt fuer einen spaeteren Reconnect registriert.

use axum::extract::ws::{Message, WebSocket};
use dotfield_protocol::event::{ClientEvent, ServerEvent};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

use crate::installation::InstallationHandle;
use crate::session::{ClientSender, VerbindungsId};

/// Fortlaufende Verbindungsnummern (prozessweit eindeutig)
static NAECHSTE_VERBINDUNG: AtomicU64 = AtomicU64::new(1);

/// Vergibt eine neue Verbindungsnummer
pub fn verbindung_id_vergeben() -> VerbindungsId {
    NAECHSTE_VERBINDUNG.fetch_add(1, Ordering::Relaxed)
}

/// Dekodiert einen Textframe; nicht dekodierbare Frames werden verworfen
pub fn eingang_dekodieren(text: &str, peer: SocketAddr) -> Option<ClientEvent> {
    match ClientEvent::from_json(text) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(peer = %peer, fehler = %e, "Ungueltiges Client-Event verworfen");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// ClientConnection
// ---------------------------------------------------------------------------

/// Verarbeitet eine einzelne WebSocket-Verbindung
pub struct ClientConnection {
    installation: InstallationHandle,
    peer_addr: SocketAddr,
    verbindung_id: VerbindungsId,
}

impl ClientConnection {
    pub fn neu(installation: InstallationHandle, peer_addr: SocketAddr) -> Self {
        Self {
            installation,
            peer_addr,
            verbindung_id: verbindung_id_vergeben(),
        }
    }

    pub fn verbindung_id(&self) -> VerbindungsId {
        self.verbindung_id
    }

    /// Verarbeitungsschleife; laeuft bis der Client trennt oder Shutdown kommt
    pub async fn verarbeiten(self, mut socket: WebSocket, mut shutdown_rx: watch::Receiver<bool>) {
        let peer = self.peer_addr;
        let (sender, mut ausgehend_rx) = ClientSender::kanal(self.verbindung_id);

        tracing::info!(peer = %peer, verbindung = self.verbindung_id, "Neue WebSocket-Verbindung");

        loop {
            tokio::select! {
                // Eingehender Frame vom Browser
                frame = socket.recv() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            let Some(event) = eingang_dekodieren(&text, peer) else {
                                continue;
                            };
                            tracing::trace!(peer = %peer, event = event.name(), "Event empfangen");
                            if self.installation.ereignis(sender.clone(), event).await.is_err() {
                                tracing::warn!(peer = %peer, "Installation beendet, Verbindung wird geschlossen");
                                break;
                            }
                        }
                        Some(Ok(Message::Binary(_))) => {
                            tracing::warn!(peer = %peer, "Binaerframe verworfen");
                        }
                        // Ping/Pong beantwortet axum selbst
                        Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!(peer = %peer, "Verbindung vom Client getrennt");
                            break;
                        }
                        Some(Err(e)) => {
                            tracing::warn!(peer = %peer, fehler = %e, "WebSocket-Lesefehler");
                            break;
                        }
                    }
                }

                // Ausgehendes Event aus der Installation
                Some(ausgehend) = ausgehend_rx.recv() => {
                    if let Err(e) = Self::senden(&mut socket, &ausgehend).await {
                        tracing::warn!(peer = %peer, fehler = %e, "Senden fehlgeschlagen");
                        break;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(peer = %peer, "Shutdown-Signal – Verbindung wird getrennt");
                        let _ = socket.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }

        // Session bleibt, nur die Verbindung wird abgemeldet
        let _ = self.installation.getrennt(self.verbindung_id).await;
        tracing::debug!(peer = %peer, verbindung = self.verbindung_id, "Verbindung beendet");
    }

    async fn senden(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), axum::Error> {
        let json = match event.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(event = event.name(), fehler = %e, "Serialisierung fehlgeschlagen");
                return Ok(());
            }
        };
        socket.send(Message::Text(json)).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use dotfield_core::types::Face;

    fn peer() -> SocketAddr {
        "127.0.0.1:5000".parse().unwrap()
    }

    #[test]
    fn gueltiger_frame() {
        let event = eingang_dekodieren(r#"{"event":"faceselect","data":"back"}"#, peer());
        assert_eq!(event, Some(ClientEvent::FaceSelect(Face::Back)));
    }

    #[test]
    fn kaputter_frame_wird_verworfen() {
        assert!(eingang_dekodieren("kein json", peer()).is_none());
        assert!(eingang_dekodieren(r#"{"event":"tanzen","data":{}}"#, peer()).is_none());
        assert!(eingang_dekodieren(r#"{"event":"activate","data":{"coords":{"x":-1,"y":0}}}"#, peer()).is_none());
    }

    #[test]
    fn verbindungsnummern_eindeutig() {
        let a = verbindung_id_vergeben();
        let b = verbindung_id_vergeben();
        assert_ne!(a, b);
    }
}
