//! dotfield-server – Bibliotheks-Root
//!
//! Deklariert die Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;

use anyhow::{Context, Result};
use config::ServerConfig;
use dotfield_signaling::{
    installation_starten, CubeServer, KanalHardwareSink, WebServer, ZufallsZuteiler,
};
use tokio::sync::watch;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Installation (Registry, Autopilot, Timer) starten
    /// 2. Cube-Listener starten
    /// 3. WebSocket-Listener starten
    /// 4. Auf Ctrl-C warten, dann alles ueber den Watch-Kanal beenden
    pub async fn starten(self) -> Result<()> {
        let installation_config = self.config.installation_config()?;
        let web_adresse = self.config.web_adresse()?;
        let cube_adresse = self.config.cube_adresse()?;

        tracing::info!(
            web = %web_adresse,
            cube = %cube_adresse,
            farben = installation_config.palette.len(),
            "Server startet"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sink = KanalHardwareSink::default();

        let (installation, installation_task) = installation_starten(
            installation_config,
            sink.clone(),
            ZufallsZuteiler::neu(),
            shutdown_rx.clone(),
        )?;

        let cube_task = tokio::spawn(CubeServer::neu(sink, cube_adresse).starten(shutdown_rx.clone()));
        let web_task = tokio::spawn(WebServer::neu(installation, web_adresse).starten(shutdown_rx));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
        let _ = shutdown_tx.send(true);

        web_task
            .await
            .context("WebSocket-Task abgebrochen")?
            .context("WebSocket-Server")?;
        cube_task
            .await
            .context("Cube-Task abgebrochen")?
            .context("Cube-Server")?;
        installation_task.await.context("Installation abgebrochen")?;

        tracing::info!("Server beendet");
        Ok(())
    }
}
