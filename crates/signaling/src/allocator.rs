//! Seiten- und Farbzuteilung fuer Sessions
//!
//! Der Zuteiler legt fest, mit welcher Seite und welchen Farben eine neue
//! Session startet, und setzt die Wuensche aus `faceselect`/`colorselect` um.
//! Die Aenderungen landen direkt in der Session und sind damit im naechsten
//! `welcome` und in allen folgenden Payloads sichtbar.

use dotfield_core::types::{ColorIndex, Face};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::session::Session;

/// Anfangszuteilung einer neuen Session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zuteilung {
    pub face: Face,
    pub start_color_index: ColorIndex,
    pub end_color_index: ColorIndex,
}

/// Zuteilung von Seite und Farben
pub trait SessionZuteiler: Send + 'static {
    /// Zuteilung fuer eine neue Session
    fn zuteilen(&mut self, palette_laenge: usize) -> Zuteilung;

    fn seite_waehlen(&mut self, session: &mut Session, face: Face) {
        tracing::debug!(session_id = %session.id, face = %face, "Seite gewaehlt");
        session.face = face;
    }

    fn farbe_waehlen(&mut self, session: &mut Session, ist_startfarbe: bool, index: ColorIndex) {
        tracing::debug!(
            session_id = %session.id,
            startfarbe = ist_startfarbe,
            index,
            "Farbe gewaehlt"
        );
        if ist_startfarbe {
            session.start_color_index = index;
        } else {
            session.end_color_index = index;
        }
    }
}

// ---------------------------------------------------------------------------
// ZufallsZuteiler
// ---------------------------------------------------------------------------

/// Zufaellige Seite, zufaellige Start- und Endfarbe
pub struct ZufallsZuteiler {
    rng: StdRng,
}

impl ZufallsZuteiler {
    pub fn neu() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproduzierbare Zuteilung (Tests)
    pub fn mit_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for ZufallsZuteiler {
    fn default() -> Self {
        Self::neu()
    }
}

impl SessionZuteiler for ZufallsZuteiler {
    fn zuteilen(&mut self, palette_laenge: usize) -> Zuteilung {
        let laenge = palette_laenge.max(1);
        Zuteilung {
            face: Face::ALLE[self.rng.gen_range(0..Face::ALLE.len())],
            start_color_index: self.rng.gen_range(0..laenge),
            end_color_index: self.rng.gen_range(0..laenge),
        }
    }
}

// ---------------------------------------------------------------------------
// FesterZuteiler
// ---------------------------------------------------------------------------

/// Gibt jeder neuen Session dieselbe Zuteilung
#[derive(Debug, Clone, Copy)]
pub struct FesterZuteiler(pub Zuteilung);

impl FesterZuteiler {
    pub fn neu(face: Face, start_color_index: ColorIndex, end_color_index: ColorIndex) -> Self {
        Self(Zuteilung {
            face,
            start_color_index,
            end_color_index,
        })
    }
}

impl SessionZuteiler for FesterZuteiler {
    fn zuteilen(&mut self, _palette_laenge: usize) -> Zuteilung {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ClientSender;
    use dotfield_core::SessionId;

    #[test]
    fn zufall_bleibt_in_der_palette() {
        let mut zuteiler = ZufallsZuteiler::mit_seed(42);
        for _ in 0..500 {
            let z = zuteiler.zuteilen(4);
            assert!(z.start_color_index < 4);
            assert!(z.end_color_index < 4);
        }
    }

    #[test]
    fn zufall_nutzt_alle_seiten() {
        let mut zuteiler = ZufallsZuteiler::mit_seed(1);
        let mut gesehen = std::collections::HashSet::new();
        for _ in 0..500 {
            gesehen.insert(zuteiler.zuteilen(10).face);
        }
        assert_eq!(gesehen.len(), 6);
    }

    #[test]
    fn auswahl_aendert_session() {
        let mut zuteiler = FesterZuteiler::neu(Face::Top, 0, 1);
        let (sender, _rx) = ClientSender::kanal(1);
        let z = zuteiler.zuteilen(10);
        let mut session = Session {
            id: SessionId::new("s"),
            sender,
            face: z.face,
            start_color_index: z.start_color_index,
            end_color_index: z.end_color_index,
        };

        zuteiler.seite_waehlen(&mut session, Face::Bottom);
        zuteiler.farbe_waehlen(&mut session, true, 7);
        zuteiler.farbe_waehlen(&mut session, false, 3);

        assert_eq!(session.face, Face::Bottom);
        assert_eq!(session.start_color_index, 7);
        assert_eq!(session.end_color_index, 3);
    }
}
