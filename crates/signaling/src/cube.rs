//! Cube-Link – TCP-Verbindung zum physischen Wuerfel
//!
//! Der `CubeServer` nimmt Verbindungen der Cube-Steuerung an. Jede Verbindung
//! abonniert die `KanalHardwareSink` und bekommt jedes Hardware-Event als
//! eine JSON-Zeile (`CubeCodec`). Mehrere Cubes (z.B. Simulator und echte
//! Hardware) koennen gleichzeitig verbunden sein.
//!
//! Ein zu langsamer Cube ueberspringt Events; die Installation wartet nie.

use dotfield_protocol::event::HardwareEvent;
use dotfield_protocol::wire::CubeCodec;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, watch};
use tokio_util::codec::Framed;

use crate::error::SignalingResult;
use crate::hardware::KanalHardwareSink;

/// TCP-Listener fuer Cube-Verbindungen
pub struct CubeServer {
    sink: KanalHardwareSink,
    bind_addr: SocketAddr,
}

impl CubeServer {
    pub fn neu(sink: KanalHardwareSink, bind_addr: SocketAddr) -> Self {
        Self { sink, bind_addr }
    }

    /// Bindet `bind_addr` und laeuft bis zum Shutdown
    pub async fn starten(self, shutdown_rx: watch::Receiver<bool>) -> SignalingResult<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        self.auf_listener(listener, shutdown_rx).await
    }

    /// Accept-Loop auf einem bereits gebundenen Listener
    pub async fn auf_listener(
        self,
        listener: TcpListener,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> SignalingResult<()> {
        let lokale_addr = listener.local_addr()?;
        tracing::info!(adresse = %lokale_addr, "Cube-Server gestartet");

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            tracing::info!(peer = %peer_addr, "Cube verbunden");
                            let events = self.sink.abonnieren();
                            let shutdown_rx_clone = shutdown_rx.clone();
                            tokio::spawn(async move {
                                cube_verarbeiten(stream, peer_addr, events, shutdown_rx_clone).await;
                            });
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "Cube-Accept-Fehler");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Cube-Server: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!("Cube-Server gestoppt");
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

/// Leitet Hardware-Events an einen verbundenen Cube weiter
async fn cube_verarbeiten(
    stream: TcpStream,
    peer: SocketAddr,
    mut events: broadcast::Receiver<HardwareEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut framed = Framed::new(stream, CubeCodec::new());

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if let Err(e) = framed.send(event).await {
                            tracing::warn!(peer = %peer, fehler = %e, "Cube-Senden fehlgeschlagen");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(verpasst)) => {
                        tracing::warn!(peer = %peer, verpasst, "Cube zu langsam – Events uebersprungen");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            // Der Cube sendet nichts; EOF oder Fehler heisst getrennt
            eingang = framed.next() => {
                match eingang {
                    Some(Ok(event)) => {
                        tracing::debug!(peer = %peer, event = event.name(), "Unerwartetes Event vom Cube ignoriert");
                    }
                    Some(Err(e)) => {
                        tracing::warn!(peer = %peer, fehler = %e, "Cube-Lesefehler");
                        break;
                    }
                    None => {
                        tracing::info!(peer = %peer, "Cube getrennt");
                        break;
                    }
                }
            }

            Ok(()) = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}
