//! HTTP/WebSocket-Listener – Bindet Socket, nimmt Browser-Verbindungen an
//!
//! Der `WebServer` stellt ueber axum drei Routen bereit:
//! - `GET /ws`     – WebSocket-Upgrade, pro Verbindung eine `ClientConnection`
//! - `GET /status` – Momentaufnahme der Installation als JSON
//! - `GET /health` – Health-Check
//!
//! Ein `true` auf dem Shutdown-Watch beendet Listener und alle Verbindungen.

use axum::{
    extract::{ConnectInfo, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::connection::ClientConnection;
use crate::error::SignalingResult;
use crate::installation::{InstallationHandle, InstallationStatus};

/// Geteilter Zustand der Handler
#[derive(Clone)]
struct WebState {
    installation: InstallationHandle,
    shutdown_rx: watch::Receiver<bool>,
}

/// HTTP/WebSocket-Server fuer die Browser-Clients
pub struct WebServer {
    installation: InstallationHandle,
    bind_addr: SocketAddr,
}

impl WebServer {
    pub fn neu(installation: InstallationHandle, bind_addr: SocketAddr) -> Self {
        Self {
            installation,
            bind_addr,
        }
    }

    /// Baut den Router
    pub fn router(&self, shutdown_rx: watch::Receiver<bool>) -> Router {
        let state = WebState {
            installation: self.installation.clone(),
            shutdown_rx,
        };
        Router::new()
            .route("/ws", get(ws_upgrade))
            .route("/status", get(status))
            .route("/health", get(health))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bindet `bind_addr` und laeuft bis zum Shutdown
    pub async fn starten(self, shutdown_rx: watch::Receiver<bool>) -> SignalingResult<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        self.auf_listener(listener, shutdown_rx).await
    }

    /// Laeuft auf einem bereits gebundenen Listener (Tests binden Port 0)
    pub async fn auf_listener(
        self,
        listener: TcpListener,
        shutdown_rx: watch::Receiver<bool>,
    ) -> SignalingResult<()> {
        let lokale_addr = listener.local_addr()?;
        let app = self.router(shutdown_rx.clone());

        tracing::info!(adresse = %lokale_addr, "WebSocket-Server gestartet");

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_abwarten(shutdown_rx))
        .await?;

        tracing::info!("WebSocket-Server gestoppt");
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

/// Wartet bis der Watch `true` meldet oder der Sender wegfaellt
async fn shutdown_abwarten(mut shutdown_rx: watch::Receiver<bool>) {
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            return;
        }
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<WebState>,
) -> Response {
    let verbindung = ClientConnection::neu(state.installation, peer);
    let shutdown_rx = state.shutdown_rx;
    ws.on_upgrade(move |socket| verbindung.verarbeiten(socket, shutdown_rx))
}

async fn status(
    State(state): State<WebState>,
) -> Result<Json<InstallationStatus>, StatusCode> {
    state
        .installation
        .status()
        .await
        .map(Json)
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)
}

/// GET /health
async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
