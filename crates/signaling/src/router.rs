//! Event-Router – Wer bekommt welches Event
//!
//! | Event        | Peers (gleiche Seite, ohne Ausloeser) | Hardware | Autopilot        |
//! |--------------|----------------------------------------|----------|------------------|
//! | `activate`   | `{color, coords, face}`                | ja       | aus + Countdown  |
//! | `deactivate` | `{coords, face}`                       | nein     | nur Countdown    |
//! | `nyan`       | nein                                   | ja       | aus + Countdown  |
//!
//! `deactivate` schaltet den Autopiloten bewusst nicht ab; der Wuerfel hat
//! ausserdem keine Loslass-Animation und bekommt das Event nie.

use dotfield_core::types::Coords;
use dotfield_protocol::event::{
    HardwareAktivierung, HardwareEvent, PeerAktivierung, ServerEvent, ZellAufSeite,
};

use crate::autopilot::AutopilotController;
use crate::broadcast::{self, BroadcastFilter};
use crate::hardware::HardwareSink;
use crate::registry::SessionRegistry;
use crate::session::Session;
use crate::timer::Zeitgeber;

/// Ergebnis einer Zustellung
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zustellung {
    /// Anzahl Peers die das Event bekommen haben
    pub peers: usize,
    /// Ging ein Event an die Hardware?
    pub hardware: bool,
}

/// Routet Zell-Events einer Session an Peers und Hardware
///
/// Lebt nur fuer die Dauer eines Events und leiht sich den Zustand der
/// Installation.
pub struct EventRouter<'a, Z: ?Sized, H: ?Sized> {
    pub registry: &'a SessionRegistry,
    pub sink: &'a H,
    pub autopilot: &'a mut AutopilotController,
    pub zeitgeber: &'a mut Z,
}

impl<'a, Z, H> EventRouter<'a, Z, H>
where
    Z: Zeitgeber + ?Sized,
    H: HardwareSink + ?Sized,
{
    /// Beruehrung einer Zelle
    pub fn activate(&mut self, session: &Session, coords: Coords) -> Zustellung {
        let peer_event = ServerEvent::Activate(PeerAktivierung {
            color: session.start_color_index,
            coords,
            face: session.face,
        });
        let hardware_event = HardwareEvent::Activate(HardwareAktivierung {
            start_color_index: session.start_color_index,
            end_color_index: session.end_color_index,
            coords,
            face: session.face,
        });

        let peers = self.broadcast(
            &peer_event,
            &BroadcastFilter::peers(session.id.clone(), session.face),
        );
        self.sink.senden(hardware_event);
        self.autopilot.aktivitaet(&mut *self.zeitgeber);

        tracing::debug!(
            session_id = %session.id,
            face = %session.face,
            x = coords.x,
            y = coords.y,
            peers,
            "activate"
        );
        Zustellung {
            peers,
            hardware: true,
        }
    }

    /// Zelle losgelassen – nur Peers, nie Hardware
    pub fn deactivate(&mut self, session: &Session, coords: Coords) -> Zustellung {
        let event = ServerEvent::Deactivate(ZellAufSeite {
            coords,
            face: session.face,
        });
        let peers = self.broadcast(
            &event,
            &BroadcastFilter::peers(session.id.clone(), session.face),
        );
        self.autopilot.leerlauf_zuruecksetzen(&mut *self.zeitgeber);

        tracing::debug!(session_id = %session.id, face = %session.face, peers, "deactivate");
        Zustellung {
            peers,
            hardware: false,
        }
    }

    /// Nyan-Spur – nur Hardware, nie Peers
    pub fn nyan(&mut self, session: &Session, coords: Coords) -> Zustellung {
        self.sink.senden(HardwareEvent::Nyan(ZellAufSeite {
            coords,
            face: session.face,
        }));
        self.autopilot.aktivitaet(&mut *self.zeitgeber);

        tracing::debug!(session_id = %session.id, face = %session.face, "nyan");
        Zustellung {
            peers: 0,
            hardware: true,
        }
    }

    /// Allgemeiner Broadcast an alle Sessions die `filter` durchlaesst
    pub fn broadcast(&self, event: &ServerEvent, filter: &BroadcastFilter) -> usize {
        broadcast::verteilen(self.registry, event, filter)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
