//! Autopilot – haelt den Wuerfel lebendig wenn niemand spielt
//!
//! ## State Machine
//! ```text
//!            activate / nyan (beliebige Session)
//! Aktiviert ------------------------------------> Deaktiviert
//!     ^        Tick stoppen, Leerlauf-Timer an        |
//!     |                                               |
//!     +-----------------------------------------------+
//!        Leerlauf-Signal: Tick starten, Leerlauf-Timer aus
//! ```
//!
//! Der Eintritt in den bereits aktuellen Zustand ist ein No-op, daher laeuft
//! nie mehr als ein Tick-Timer. Solange aktiviert erzeugt jeder Tick eine
//! zufaellige Aktivierung fuer die Hardware; an Browser-Clients geht davon
//! nichts.

use dotfield_core::types::{Coords, Face};
use dotfield_protocol::event::{HardwareAktivierung, HardwareEvent};
use rand::Rng;
use serde::Serialize;
use std::time::Duration;

use crate::palette::AutopilotFarben;
use crate::timer::{LeerlaufTimer, TimerArt, TimerSignal, Zeitgeber};

/// Zustand des Autopiloten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AutopilotZustand {
    Aktiviert,
    Deaktiviert,
}

/// Steuert Autopilot-Tick und Leerlauf-Timer
#[derive(Debug)]
pub struct AutopilotController {
    zustand: AutopilotZustand,
    tick_periode: Duration,
    raster_groesse: u32,
    leerlauf: LeerlaufTimer,
    /// Wie oft der Tick-Timer gestartet wurde
    starts: u64,
}

impl AutopilotController {
    /// Erstellt den Controller im Zustand `Deaktiviert` ohne laufende Timer
    ///
    /// Die Installation ruft beim Start `aktivieren` auf. `tick_periode`
    /// kommt geprueft aus `InstallationConfig::tick_periode`.
    pub fn neu(tick_periode: Duration, leerlauf: Duration, raster_groesse: u32) -> Self {
        Self {
            zustand: AutopilotZustand::Deaktiviert,
            tick_periode,
            raster_groesse: raster_groesse.max(1),
            leerlauf: LeerlaufTimer::neu(leerlauf),
            starts: 0,
        }
    }

    pub fn zustand(&self) -> AutopilotZustand {
        self.zustand
    }

    pub fn ist_aktiviert(&self) -> bool {
        self.zustand == AutopilotZustand::Aktiviert
    }

    pub fn tick_periode(&self) -> Duration {
        self.tick_periode
    }

    pub fn starts(&self) -> u64 {
        self.starts
    }

    pub fn leerlauf(&self) -> &LeerlaufTimer {
        &self.leerlauf
    }

    /// Deaktiviert -> Aktiviert. Gibt `false` zurueck wenn schon aktiviert.
    pub fn aktivieren<Z: Zeitgeber + ?Sized>(&mut self, zeitgeber: &mut Z) -> bool {
        if self.zustand == AutopilotZustand::Aktiviert {
            return false;
        }
        self.zustand = AutopilotZustand::Aktiviert;
        self.leerlauf.deaktivieren(zeitgeber);
        zeitgeber.periodisch_starten(TimerArt::AutopilotTick, self.tick_periode);
        self.starts += 1;

        tracing::info!(periode_ms = self.tick_periode.as_millis() as u64, "Autopilot aktiviert");
        true
    }

    /// Aktiviert -> Deaktiviert. Gibt `false` zurueck wenn schon deaktiviert.
    pub fn deaktivieren<Z: Zeitgeber + ?Sized>(&mut self, zeitgeber: &mut Z) -> bool {
        if self.zustand == AutopilotZustand::Deaktiviert {
            return false;
        }
        self.zustand = AutopilotZustand::Deaktiviert;
        self.leerlauf.aktivieren(zeitgeber);
        zeitgeber.stoppen(TimerArt::AutopilotTick);

        tracing::info!("Autopilot deaktiviert");
        true
    }

    /// Menschliche Aktivitaet (`activate`, `nyan`): abschalten und Countdown neu starten
    pub fn aktivitaet<Z: Zeitgeber + ?Sized>(&mut self, zeitgeber: &mut Z) {
        self.deaktivieren(zeitgeber);
        self.leerlauf.zuruecksetzen(zeitgeber);
    }

    /// Countdown neu starten ohne den Zustand anzufassen (`deactivate`)
    pub fn leerlauf_zuruecksetzen<Z: Zeitgeber + ?Sized>(&mut self, zeitgeber: &mut Z) {
        self.leerlauf.zuruecksetzen(zeitgeber);
    }

    /// Verarbeitet ein Leerlauf-Signal; gibt `true` zurueck wenn der Autopilot anspringt
    pub fn leerlauf_signal<Z: Zeitgeber + ?Sized>(
        &mut self,
        zeitgeber: &mut Z,
        signal: &TimerSignal,
    ) -> bool {
        if !self.leerlauf.ausgeloest(zeitgeber, signal) {
            tracing::trace!(generation = signal.generation, "Veraltetes Leerlauf-Signal");
            return false;
        }
        self.aktivieren(zeitgeber)
    }

    /// Erzeugt das synthetische Event fuer einen Tick
    ///
    /// `None` wenn der Autopilot nicht aktiviert ist oder das Signal zu einem
    /// bereits abgebrochenen Tick-Timer gehoert.
    pub fn tick<Z, R>(
        &self,
        zeitgeber: &Z,
        signal: &TimerSignal,
        farben: &AutopilotFarben,
        rng: &mut R,
    ) -> Option<HardwareEvent>
    where
        Z: Zeitgeber + ?Sized,
        R: Rng + ?Sized,
    {
        if signal.art != TimerArt::AutopilotTick
            || !self.ist_aktiviert()
            || !zeitgeber.ist_aktuell(signal)
        {
            return None;
        }
        Some(self.synthetisieren(farben, rng))
    }

    fn synthetisieren<R: Rng + ?Sized>(&self, farben: &AutopilotFarben, rng: &mut R) -> HardwareEvent {
        HardwareEvent::Activate(HardwareAktivierung {
            start_color_index: farben.farbe_waehlen(rng),
            end_color_index: farben.farbe_waehlen(rng),
            coords: Coords::new(
                rng.gen_range(0..self.raster_groesse),
                rng.gen_range(0..self.raster_groesse),
            ),
            face: Face::ALLE[rng.gen_range(0..Face::ALLE.len())],
        })
    }
}
