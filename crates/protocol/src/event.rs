//! Benannte Events (WebSocket und Cube-Link)
//!
//! Definiert alle Events die zwischen Browser-Client, Server und Cube
//! ausgetauscht werden.
//!
//! ## Design
//! - Jedes Event ist ein JSON-Objekt `{"event": <name>, "data": <payload>}`
//! - Events ohne Payload (`restart`) lassen `data` weg
//! - Feldnamen sind camelCase, Seiten kleingeschrieben
//! - Drei getrennte Enums, weil `activate` je nach Richtung eine andere Form hat

use dotfield_core::types::{ColorIndex, Coords, Face, Rgb, SessionId};
use serde::{Deserialize, Serialize};

/// Kennung die jeder `welcome` mitschickt; Clients verwerfen fremde Server
pub const APP_KENNUNG: &str = "DotField";

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Zell-Payload vom Client (`activate`, `deactivate`, `nyan`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZellPayload {
    pub coords: Coords,
}

/// Farbwahl vom Client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarbWahl {
    /// true = Startfarbe, false = Endfarbe
    pub is_start_color: bool,
    pub color_index: ColorIndex,
}

/// Begruessung nach `join` – beschreibt den aktuellen Zustand der Session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMessage {
    /// Immer `APP_KENNUNG`
    pub app: String,
    pub id: SessionId,
    /// Die komplette Palette
    pub colors: Vec<Rgb>,
    pub start_color_index: ColorIndex,
    pub end_color_index: ColorIndex,
    pub face: Face,
}

/// Aktivierung fuer andere Clients derselben Seite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerAktivierung {
    /// Startfarbe des ausloesenden Clients
    pub color: ColorIndex,
    pub coords: Coords,
    pub face: Face,
}

/// Zelle + Seite (`deactivate` an Peers, `nyan` an Hardware)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZellAufSeite {
    pub coords: Coords,
    pub face: Face,
}

/// Aktivierung fuer die Hardware – traegt beide Farben
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareAktivierung {
    pub start_color_index: ColorIndex,
    pub end_color_index: ColorIndex,
    pub coords: Coords,
    pub face: Face,
}

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

/// Alle Events die ein Browser-Client senden kann
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ClientEvent {
    /// `null` = neuer Client, sonst Reconnect mit bekannter ID
    Join(Option<SessionId>),
    Activate(ZellPayload),
    Deactivate(ZellPayload),
    Nyan(ZellPayload),
    FaceSelect(Face),
    ColorSelect(FarbWahl),
}

impl ClientEvent {
    /// Name des Events auf dem Draht
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Join(_) => "join",
            ClientEvent::Activate(_) => "activate",
            ClientEvent::Deactivate(_) => "deactivate",
            ClientEvent::Nyan(_) => "nyan",
            ClientEvent::FaceSelect(_) => "faceselect",
            ClientEvent::ColorSelect(_) => "colorselect",
        }
    }

    /// Deserialisiert ein Event aus einem WebSocket-Textframe
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

/// Alle Events die der Server an Browser-Clients sendet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ServerEvent {
    Welcome(WelcomeMessage),
    /// Session unbekannt – Client soll seinen Zustand verwerfen und neu beitreten
    Restart,
    Activate(PeerAktivierung),
    Deactivate(ZellAufSeite),
}

impl ServerEvent {
    /// Name des Events auf dem Draht
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Welcome(_) => "welcome",
            ServerEvent::Restart => "restart",
            ServerEvent::Activate(_) => "activate",
            ServerEvent::Deactivate(_) => "deactivate",
        }
    }

    /// Serialisiert das Event als JSON-Textframe
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Server -> Hardware
// ---------------------------------------------------------------------------

/// Events an die Cube-Hardware
///
/// `deactivate` existiert hier absichtlich nicht: der Wuerfel hat keine
/// Loslass-Animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum HardwareEvent {
    Activate(HardwareAktivierung),
    Nyan(ZellAufSeite),
}

impl HardwareEvent {
    pub fn name(&self) -> &'static str {
        match self {
            HardwareEvent::Activate(_) => "activate",
            HardwareEvent::Nyan(_) => "nyan",
        }
    }

    /// Seite auf die das Event zielt
    pub fn face(&self) -> Face {
        match self {
            HardwareEvent::Activate(a) => a.face,
            HardwareEvent::Nyan(n) => n.face,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn join_neu_und_reconnect() {
        let neu = ClientEvent::from_json(r#"{"event":"join","data":null}"#).unwrap();
        assert_eq!(neu, ClientEvent::Join(None));

        let wieder = ClientEvent::from_json(r#"{"event":"join","data":"abc123"}"#).unwrap();
        assert_eq!(wieder, ClientEvent::Join(Some(SessionId::new("abc123"))));
    }

    #[test]
    fn activate_vom_client() {
        let ev =
            ClientEvent::from_json(r#"{"event":"activate","data":{"coords":{"x":3,"y":4}}}"#)
                .unwrap();
        assert_eq!(
            ev,
            ClientEvent::Activate(ZellPayload {
                coords: Coords::new(3, 4)
            })
        );
        assert_eq!(ev.name(), "activate");
    }

    #[test]
    fn colorselect_ist_camel_case() {
        let ev = ClientEvent::from_json(
            r#"{"event":"colorselect","data":{"isStartColor":false,"colorIndex":6}}"#,
        )
        .unwrap();
        assert_eq!(
            ev,
            ClientEvent::ColorSelect(FarbWahl {
                is_start_color: false,
                color_index: 6
            })
        );
    }

    #[test]
    fn faceselect_mit_seitenname() {
        let ev = ClientEvent::from_json(r#"{"event":"faceselect","data":"left"}"#).unwrap();
        assert_eq!(ev, ClientEvent::FaceSelect(Face::Left));
    }

    #[test]
    fn unbekanntes_event_wird_abgelehnt() {
        assert!(ClientEvent::from_json(r#"{"event":"explode","data":{}}"#).is_err());
    }

    #[test]
    fn restart_hat_keine_daten() {
        let wert: serde_json::Value =
            serde_json::from_str(&ServerEvent::Restart.to_json().unwrap()).unwrap();
        assert_eq!(wert, json!({"event": "restart"}));
    }

    #[test]
    fn welcome_format() {
        let welcome = ServerEvent::Welcome(WelcomeMessage {
            app: APP_KENNUNG.to_string(),
            id: SessionId::new("s1"),
            colors: vec![Rgb::new(255, 0, 0), Rgb::new(0, 0, 255)],
            start_color_index: 0,
            end_color_index: 1,
            face: Face::Front,
        });
        let wert: serde_json::Value = serde_json::from_str(&welcome.to_json().unwrap()).unwrap();
        assert_eq!(
            wert,
            json!({
                "event": "welcome",
                "data": {
                    "app": "DotField",
                    "id": "s1",
                    "colors": [[255, 0, 0], [0, 0, 255]],
                    "startColorIndex": 0,
                    "endColorIndex": 1,
                    "face": "front"
                }
            })
        );
    }

    #[test]
    fn peer_und_hardware_aktivierung_unterscheiden_sich() {
        let peer = serde_json::to_value(ServerEvent::Activate(PeerAktivierung {
            color: 2,
            coords: Coords::new(3, 4),
            face: Face::Front,
        }))
        .unwrap();
        assert_eq!(
            peer,
            json!({"event": "activate", "data": {"color": 2, "coords": {"x": 3, "y": 4}, "face": "front"}})
        );

        let hw = serde_json::to_value(HardwareEvent::Activate(HardwareAktivierung {
            start_color_index: 2,
            end_color_index: 5,
            coords: Coords::new(3, 4),
            face: Face::Front,
        }))
        .unwrap();
        assert_eq!(
            hw,
            json!({"event": "activate", "data": {
                "startColorIndex": 2,
                "endColorIndex": 5,
                "coords": {"x": 3, "y": 4},
                "face": "front"
            }})
        );
    }
}
