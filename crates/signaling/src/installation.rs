//! Installation – die eine serialisierte Zeitlinie
//!
//! Registry, Autopilot, Paletten-Offset und Hardware-Senke gehoeren der
//! `Installation`. Sie laeuft in genau einem tokio-Task und verarbeitet
//! Client-Events und Timer-Signale strikt nacheinander in Eingangsreihenfolge.
//! Verbindungs-Tasks reichen nur `Befehl`e ueber das `InstallationHandle` ein.
//!
//! ## Ablauf
//! ```text
//! ClientConnection --Befehl--> mpsc --+
//!                                     +--> Installation::ausfuehren (select!)
//! TokioZeitgeber --TimerSignal--> mpsc+         |
//!                                               +-- SessionRegistry (join)
//!                                               +-- EventRouter (activate/deactivate/nyan)
//!                                               +-- SessionZuteiler (faceselect/colorselect)
//!                                               +-- AutopilotController (Tick, Leerlauf)
//! ```

use dotfield_core::types::{ColorIndex, SessionId};
use dotfield_protocol::event::{ClientEvent, ServerEvent, ZellPayload};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::allocator::SessionZuteiler;
use crate::autopilot::{AutopilotController, AutopilotZustand};
use crate::error::{SignalingError, SignalingResult};
use crate::hardware::HardwareSink;
use crate::palette::{AutopilotFarben, Palette};
use crate::registry::SessionRegistry;
use crate::router::EventRouter;
use crate::session::{ClientSender, VerbindungsId};
use crate::timer::{TimerArt, TimerSignal, TokioZeitgeber, Zeitgeber};

/// Groesse der Befehls-Queue
const BEFEHL_QUEUE_GROESSE: usize = 1024;

/// Groesse der Timer-Queue
const TIMER_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Konfiguration der Installation
#[derive(Debug, Clone)]
pub struct InstallationConfig {
    pub palette: Palette,
    /// Palettenindizes fuer den Autopiloten (None = ganze Palette)
    pub farbzuordnung: Option<Vec<ColorIndex>>,
    /// Breite des rotierenden Farbfensters
    pub fensterbreite: usize,
    /// Synthetische Events pro Sekunde im Autopilot
    pub ereignisse_pro_sekunde: f64,
    /// Ruhezeit bis der Autopilot wieder anspringt
    pub leerlauf: Duration,
    /// Takt der Paletten-Rotation
    pub rotation: Duration,
    /// Zellen pro Seitenkante
    pub raster_groesse: u32,
}

impl Default for InstallationConfig {
    fn default() -> Self {
        Self {
            palette: Palette::standard(),
            farbzuordnung: None,
            fensterbreite: 3,
            ereignisse_pro_sekunde: 10.0,
            leerlauf: Duration::from_secs(30),
            rotation: Duration::from_secs(5),
            raster_groesse: 8,
        }
    }
}

impl InstallationConfig {
    /// Prueft alle Werte ohne etwas zu starten
    pub fn pruefen(&self) -> SignalingResult<()> {
        self.farben_bauen().map(|_| ())
    }

    /// Abstand zwischen zwei Autopilot-Ticks
    ///
    /// Die Periode muss als `Duration` darstellbar und groesser als 0 sein.
    pub fn tick_periode(&self) -> SignalingResult<Duration> {
        let rate = self.ereignisse_pro_sekunde;
        if !(rate.is_finite() && rate > 0.0) {
            return Err(SignalingError::konfiguration(format!(
                "Autopilot-Rate muss positiv sein, ist {rate}"
            )));
        }
        match Duration::try_from_secs_f64(1.0 / rate) {
            Ok(periode) if !periode.is_zero() => Ok(periode),
            Ok(_) => Err(SignalingError::konfiguration(format!(
                "Autopilot-Rate {rate} ergibt eine Tick-Periode von 0"
            ))),
            Err(e) => Err(SignalingError::konfiguration(format!(
                "Autopilot-Rate {rate} ergibt keine gueltige Tick-Periode: {e}"
            ))),
        }
    }

    /// Prueft die Werte und baut die Autopilot-Farbauswahl
    fn farben_bauen(&self) -> SignalingResult<AutopilotFarben> {
        self.tick_periode()?;
        if self.rotation.is_zero() {
            return Err(SignalingError::konfiguration(
                "Rotations-Takt muss groesser als 0 sein",
            ));
        }
        if self.raster_groesse == 0 {
            return Err(SignalingError::konfiguration(
                "Rastergroesse muss groesser als 0 sein",
            ));
        }
        match &self.farbzuordnung {
            Some(zuordnung) => {
                AutopilotFarben::neu(zuordnung.clone(), self.fensterbreite, &self.palette)
            }
            None => AutopilotFarben::ueber_palette(&self.palette, self.fensterbreite),
        }
    }
}

// ---------------------------------------------------------------------------
// Befehle
// ---------------------------------------------------------------------------

/// Momentaufnahme fuer Status-Abfragen
#[derive(Debug, Clone, Serialize)]
pub struct InstallationStatus {
    pub sessions: usize,
    pub autopilot: AutopilotZustand,
    pub autopilot_starts: u64,
    pub palette_offset: usize,
}

/// Alles was von aussen in die Zeitlinie kommt
#[derive(Debug)]
pub enum Befehl {
    /// Event einer Verbindung
    Ereignis {
        sender: ClientSender,
        event: ClientEvent,
    },
    /// Verbindung geschlossen (die Session bleibt bestehen)
    Getrennt { verbindung_id: VerbindungsId },
    Status {
        antwort: oneshot::Sender<InstallationStatus>,
    },
}

// ---------------------------------------------------------------------------
// Installation
// ---------------------------------------------------------------------------

/// Besitzt den gesamten veraenderlichen Zustand
pub struct Installation<Z, H, A>
where
    Z: Zeitgeber,
    H: HardwareSink,
    A: SessionZuteiler,
{
    registry: SessionRegistry,
    autopilot: AutopilotController,
    farben: AutopilotFarben,
    palette: Palette,
    rotation: Duration,
    /// Welche Verbindung gehoert zu welcher Session
    verbindungen: HashMap<VerbindungsId, SessionId>,
    zeitgeber: Z,
    sink: H,
    zuteiler: A,
    rng: StdRng,
}

impl<Z, H, A> Installation<Z, H, A>
where
    Z: Zeitgeber,
    H: HardwareSink,
    A: SessionZuteiler,
{
    /// Erstellt die Installation; Timer laufen erst nach `starten`
    pub fn neu(config: InstallationConfig, zeitgeber: Z, sink: H, zuteiler: A) -> SignalingResult<Self> {
        let farben = config.farben_bauen()?;
        Ok(Self {
            registry: SessionRegistry::neu(),
            autopilot: AutopilotController::neu(
                config.tick_periode()?,
                config.leerlauf,
                config.raster_groesse,
            ),
            farben,
            palette: config.palette,
            rotation: config.rotation,
            verbindungen: HashMap::new(),
            zeitgeber,
            sink,
            zuteiler,
            rng: StdRng::from_entropy(),
        })
    }

    /// Ersetzt den Zufallsgenerator (reproduzierbare Tests)
    pub fn mit_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Startet Paletten-Rotation und Autopilot
    pub fn starten(&mut self) {
        self.zeitgeber
            .periodisch_starten(TimerArt::PalettenRotation, self.rotation);
        self.autopilot.aktivieren(&mut self.zeitgeber);
        tracing::info!(
            farben = self.palette.len(),
            rotation_ms = self.rotation.as_millis() as u64,
            "Installation gestartet"
        );
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn autopilot(&self) -> &AutopilotController {
        &self.autopilot
    }

    pub fn farben(&self) -> &AutopilotFarben {
        &self.farben
    }

    pub fn zeitgeber(&self) -> &Z {
        &self.zeitgeber
    }

    pub fn sink(&self) -> &H {
        &self.sink
    }

    pub fn status(&self) -> InstallationStatus {
        InstallationStatus {
            sessions: self.registry.anzahl(),
            autopilot: self.autopilot.zustand(),
            autopilot_starts: self.autopilot.starts(),
            palette_offset: self.farben.offset().wert(),
        }
    }

    /// Verarbeitet einen Befehl von aussen
    pub fn befehl_verarbeiten(&mut self, befehl: Befehl) {
        match befehl {
            Befehl::Ereignis { sender, event } => self.ereignis_verarbeiten(sender, event),
            Befehl::Getrennt { verbindung_id } => {
                if let Some(session_id) = self.verbindungen.remove(&verbindung_id) {
                    tracing::debug!(
                        session_id = %session_id,
                        verbindung = verbindung_id,
                        "Verbindung getrennt, Session bleibt registriert"
                    );
                }
            }
            Befehl::Status { antwort } => {
                let _ = antwort.send(self.status());
            }
        }
    }

    fn ereignis_verarbeiten(&mut self, sender: ClientSender, event: ClientEvent) {
        if let ClientEvent::Join(id) = event {
            return self.beitreten(id, sender);
        }

        let session_id = match self.verbindungen.get(&sender.verbindung_id) {
            Some(id) => id.clone(),
            None => {
                tracing::debug!(
                    verbindung = sender.verbindung_id,
                    event = event.name(),
                    "Event vor join ignoriert"
                );
                return;
            }
        };

        match event {
            ClientEvent::FaceSelect(face) => {
                if let Some(session) = self.registry.session_mut(&session_id) {
                    self.zuteiler.seite_waehlen(session, face);
                }
            }
            ClientEvent::ColorSelect(wahl) => {
                if let Some(session) = self.registry.session_mut(&session_id) {
                    self.zuteiler
                        .farbe_waehlen(session, wahl.is_start_color, wahl.color_index);
                }
            }
            ClientEvent::Activate(ZellPayload { coords })
            | ClientEvent::Deactivate(ZellPayload { coords })
            | ClientEvent::Nyan(ZellPayload { coords }) => {
                let Some(session) = self.registry.session(&session_id) else {
                    return;
                };
                let mut router = EventRouter {
                    registry: &self.registry,
                    sink: &self.sink,
                    autopilot: &mut self.autopilot,
                    zeitgeber: &mut self.zeitgeber,
                };
                match event {
                    ClientEvent::Activate(_) => router.activate(session, coords),
                    ClientEvent::Deactivate(_) => router.deactivate(session, coords),
                    _ => router.nyan(session, coords),
                };
            }
            ClientEvent::Join(_) => {}
        }
    }

    fn beitreten(&mut self, id: Option<SessionId>, sender: ClientSender) {
        let verbindung_id = sender.verbindung_id;
        match self
            .registry
            .beitreten(id, sender.clone(), &mut self.zuteiler, &self.palette)
        {
            Ok(beitritt) => {
                // Nur die neueste Verbindung spricht fuer die Session
                self.verbindungen
                    .retain(|v, s| *v == verbindung_id || *s != beitritt.session_id);
                self.verbindungen
                    .insert(verbindung_id, beitritt.session_id.clone());
                sender.senden(ServerEvent::Welcome(beitritt.welcome));
            }
            Err(e) => {
                tracing::debug!(
                    verbindung = verbindung_id,
                    fehler = %e,
                    "Join abgelehnt, Client muss neu starten"
                );
                sender.senden(ServerEvent::Restart);
            }
        }
    }

    /// Verarbeitet ein ausgeloestes Timer-Signal
    pub fn timer_verarbeiten(&mut self, signal: TimerSignal) {
        match signal.art {
            TimerArt::AutopilotTick => {
                if let Some(event) =
                    self.autopilot
                        .tick(&self.zeitgeber, &signal, &self.farben, &mut self.rng)
                {
                    self.sink.senden(event);
                }
            }
            TimerArt::PalettenRotation => {
                if self.zeitgeber.ist_aktuell(&signal) {
                    let offset = self.farben.rotieren();
                    tracing::trace!(offset, "Palette rotiert");
                }
            }
            TimerArt::Leerlauf => {
                self.autopilot.leerlauf_signal(&mut self.zeitgeber, &signal);
            }
        }
    }

    /// Hauptschleife – laeuft bis Shutdown oder bis alle Handles weg sind
    pub async fn ausfuehren(
        mut self,
        mut befehle: mpsc::Receiver<Befehl>,
        mut timer: mpsc::Receiver<TimerSignal>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        self.starten();

        loop {
            tokio::select! {
                befehl = befehle.recv() => match befehl {
                    Some(befehl) => self.befehl_verarbeiten(befehl),
                    None => {
                        tracing::info!("Alle Installation-Handles geschlossen");
                        break;
                    }
                },

                Some(signal) = timer.recv() => self.timer_verarbeiten(signal),

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Installation: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!(sessions = self.registry.anzahl(), "Installation beendet");
    }
}

// ---------------------------------------------------------------------------
// InstallationHandle
// ---------------------------------------------------------------------------

/// Cloneable Zugang zur Zeitlinie der Installation
#[derive(Clone, Debug)]
pub struct InstallationHandle {
    tx: mpsc::Sender<Befehl>,
}

impl InstallationHandle {
    pub fn neu(tx: mpsc::Sender<Befehl>) -> Self {
        Self { tx }
    }

    pub async fn senden(&self, befehl: Befehl) -> SignalingResult<()> {
        self.tx
            .send(befehl)
            .await
            .map_err(|_| SignalingError::InstallationBeendet)
    }

    pub async fn ereignis(&self, sender: ClientSender, event: ClientEvent) -> SignalingResult<()> {
        self.senden(Befehl::Ereignis { sender, event }).await
    }

    pub async fn getrennt(&self, verbindung_id: VerbindungsId) -> SignalingResult<()> {
        self.senden(Befehl::Getrennt { verbindung_id }).await
    }

    pub async fn status(&self) -> SignalingResult<InstallationStatus> {
        let (antwort, rx) = oneshot::channel();
        self.senden(Befehl::Status { antwort }).await?;
        rx.await.map_err(|_| SignalingError::InstallationBeendet)
    }
}

/// Baut die Installation mit `TokioZeitgeber` und startet sie als Task
///
/// Muss innerhalb einer tokio-Runtime aufgerufen werden.
pub fn installation_starten<H, A>(
    config: InstallationConfig,
    sink: H,
    zuteiler: A,
    shutdown_rx: watch::Receiver<bool>,
) -> SignalingResult<(InstallationHandle, JoinHandle<()>)>
where
    H: HardwareSink,
    A: SessionZuteiler,
{
    let (timer_tx, timer_rx) = mpsc::channel(TIMER_QUEUE_GROESSE);
    let installation = Installation::neu(config, TokioZeitgeber::neu(timer_tx), sink, zuteiler)?;

    let (tx, rx) = mpsc::channel(BEFEHL_QUEUE_GROESSE);
    let task = tokio::spawn(installation.ausfuehren(rx, timer_rx, shutdown_rx));
    Ok((InstallationHandle::neu(tx), task))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
