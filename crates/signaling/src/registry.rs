//! Session-Registry – Wer ist bekannt, und das Join/Reconnect-Protokoll
//!
//! Die Registry haelt alle Sessions nur im Speicher. Nach einem Neustart des
//! Servers ist sie leer; Clients die sich mit ihrer alten ID zurueckmelden
//! bekommen einen `restart` und treten danach als neue Session bei.
//!
//! ## Join
//! ```text
//! join(null)          -> neue ID, neue Session, welcome
//! join(bekannte ID)   -> Verbindung neu binden, welcome mit bestehendem Zustand
//! join(unbekannte ID) -> UnbekannteSession (wird zu `restart`), nichts angelegt
//! ```
//!
//! Sessions werden nie entfernt; auch eine getrennte Verbindung laesst die
//! Session stehen.

use dotfield_core::{DotFieldError, Result, SessionId};
use dotfield_protocol::event::WelcomeMessage;
use std::collections::HashMap;

use crate::allocator::SessionZuteiler;
use crate::id::IdGenerator;
use crate::palette::Palette;
use crate::session::{ClientSender, Session};

/// Ergebnis eines erfolgreichen Joins
#[derive(Debug, Clone)]
pub struct Beitritt {
    pub session_id: SessionId,
    pub welcome: WelcomeMessage,
    /// false bei einem Reconnect
    pub neu: bool,
}

/// Alle bekannten Sessions, indiziert nach ID
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
    ids: IdGenerator,
}

impl SessionRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Erzeugt eine frische ID, die weder aktuell noch frueher vergeben war
    pub fn id_generieren(&mut self) -> SessionId {
        self.ids.generieren()
    }

    /// Join/Reconnect-Protokoll
    ///
    /// # Fehler
    /// `UnbekannteSession` wenn `id` gesetzt aber nicht registriert ist.
    /// Die Registry bleibt in diesem Fall unveraendert.
    pub fn beitreten<A: SessionZuteiler + ?Sized>(
        &mut self,
        id: Option<SessionId>,
        sender: ClientSender,
        zuteiler: &mut A,
        palette: &Palette,
    ) -> Result<Beitritt> {
        match id {
            None => {
                let id = self.id_generieren();
                let zuteilung = zuteiler.zuteilen(palette.len());
                let session = Session {
                    id: id.clone(),
                    sender,
                    face: zuteilung.face,
                    start_color_index: zuteilung.start_color_index,
                    end_color_index: zuteilung.end_color_index,
                };
                let welcome = session.welcome(palette);
                self.sessions.insert(id.clone(), session);

                tracing::info!(
                    session_id = %id,
                    face = %zuteilung.face,
                    sessions = self.sessions.len(),
                    "Neue Session"
                );
                Ok(Beitritt {
                    session_id: id,
                    welcome,
                    neu: true,
                })
            }
            Some(id) => match self.sessions.get_mut(&id) {
                Some(session) => {
                    session.transport_binden(sender);
                    tracing::info!(session_id = %id, "Session wiederverbunden");
                    Ok(Beitritt {
                        welcome: session.welcome(palette),
                        session_id: id,
                        neu: false,
                    })
                }
                None => {
                    tracing::warn!(session_id = %id, "Reconnect mit unbekannter Session");
                    Err(DotFieldError::UnbekannteSession(id.0))
                }
            },
        }
    }

    pub fn session(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn session_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn ist_registriert(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn anzahl(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Alle Sessions in beliebiger Reihenfolge
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }
}
