//! Event-Broadcast – Sendet Events an alle passenden Sessions
//!
//! Ein `BroadcastFilter` wird pro Zustellung ausgewertet und nie gespeichert.
//!
//! ## Selektives Broadcasting
//! - An alle Sessions: `BroadcastFilter::alle()`
//! - An eine Seite: `BroadcastFilter::seite(face)`
//! - An alle ausser einer: `BroadcastFilter::ausser(id)`
//! - An eine Seite ausser dem Ausloeser: `BroadcastFilter::peers(id, face)`

use dotfield_core::types::{Face, SessionId};
use dotfield_protocol::event::ServerEvent;

use crate::registry::SessionRegistry;
use crate::session::Session;

/// Auswahl der Empfaenger eines Broadcasts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastFilter {
    /// Diese Session bekommt nichts
    pub ausser: Option<SessionId>,
    /// Nur Sessions auf dieser Seite
    pub face: Option<Face>,
}

impl BroadcastFilter {
    pub fn alle() -> Self {
        Self::default()
    }

    pub fn ausser(id: SessionId) -> Self {
        Self {
            ausser: Some(id),
            face: None,
        }
    }

    pub fn seite(face: Face) -> Self {
        Self {
            ausser: None,
            face: Some(face),
        }
    }

    /// Alle anderen Sessions auf derselben Seite
    pub fn peers(id: SessionId, face: Face) -> Self {
        Self {
            ausser: Some(id),
            face: Some(face),
        }
    }

    /// Soll diese Session das Event bekommen?
    pub fn erlaubt(&self, session: &Session) -> bool {
        if self.ausser.as_ref() == Some(&session.id) {
            return false;
        }
        match self.face {
            Some(face) => session.face == face,
            None => true,
        }
    }
}

/// Sendet ein Event an alle Sessions die der Filter durchlaesst
///
/// Gibt die Anzahl erfolgreich eingereihter Events zurueck. Null Empfaenger
/// ist kein Fehler.
pub fn verteilen(registry: &SessionRegistry, event: &ServerEvent, filter: &BroadcastFilter) -> usize {
    let mut gesendet = 0;
    for session in registry.sessions().filter(|s| filter.erlaubt(s)) {
        if session.senden(event.clone()) {
            gesendet += 1;
        }
    }
    tracing::trace!(event = event.name(), gesendet, "Broadcast");
    gesendet
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::FesterZuteiler;
    use crate::palette::Palette;
    use crate::session::ClientSender;
    use dotfield_core::types::Coords;
    use dotfield_protocol::event::ZellAufSeite;
    use tokio::sync::mpsc;

    fn beitreten(
        registry: &mut SessionRegistry,
        face: Face,
        verbindung: u64,
    ) -> (SessionId, mpsc::Receiver<ServerEvent>) {
        let (sender, rx) = ClientSender::kanal(verbindung);
        let beitritt = registry
            .beitreten(
                None,
                sender,
                &mut FesterZuteiler::neu(face, 0, 1),
                &Palette::standard(),
            )
            .unwrap();
        (beitritt.session_id, rx)
    }

    fn test_event() -> ServerEvent {
        ServerEvent::Deactivate(ZellAufSeite {
            coords: Coords::new(1, 1),
            face: Face::Front,
        })
    }

    #[tokio::test]
    async fn an_alle_senden() {
        let mut registry = SessionRegistry::neu();
        let mut receivers: Vec<_> = Face::ALLE
            .iter()
            .enumerate()
            .map(|(i, f)| beitreten(&mut registry, *f, i as u64).1)
            .collect();

        let gesendet = verteilen(&registry, &test_event(), &BroadcastFilter::alle());
        assert_eq!(gesendet, 6);
        for rx in &mut receivers {
            assert!(rx.try_recv().is_ok());
        }
    }

    #[tokio::test]
    async fn nur_an_eine_seite() {
        let mut registry = SessionRegistry::neu();
        let (_, mut front_a) = beitreten(&mut registry, Face::Front, 1);
        let (_, mut front_b) = beitreten(&mut registry, Face::Front, 2);
        let (_, mut top) = beitreten(&mut registry, Face::Top, 3);

        let gesendet = verteilen(&registry, &test_event(), &BroadcastFilter::seite(Face::Front));
        assert_eq!(gesendet, 2);
        assert!(front_a.try_recv().is_ok());
        assert!(front_b.try_recv().is_ok());
        assert!(top.try_recv().is_err(), "top darf nichts empfangen");
    }

    #[tokio::test]
    async fn ausloeser_wird_ausgeschlossen_auch_bei_passender_seite() {
        let mut registry = SessionRegistry::neu();
        let (a, mut rx_a) = beitreten(&mut registry, Face::Front, 1);
        let (_, mut rx_b) = beitreten(&mut registry, Face::Front, 2);

        let gesendet = verteilen(&registry, &test_event(), &BroadcastFilter::peers(a, Face::Front));
        assert_eq!(gesendet, 1);
        assert!(rx_a.try_recv().is_err(), "Ausloeser darf nichts empfangen");
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn leere_registry_ist_kein_fehler() {
        let registry = SessionRegistry::neu();
        assert_eq!(verteilen(&registry, &test_event(), &BroadcastFilter::alle()), 0);
    }

    #[tokio::test]
    async fn ausser_ohne_seite() {
        let mut registry = SessionRegistry::neu();
        let (a, mut rx_a) = beitreten(&mut registry, Face::Left, 1);
        let (_, mut rx_b) = beitreten(&mut registry, Face::Right, 2);

        verteilen(&registry, &test_event(), &BroadcastFilter::ausser(a));
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }
}
