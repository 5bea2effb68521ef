use crate::session::{Session, SessionCaretaker, SessionMemento};
use crate::signing::Signer;
use chrono::{DateTime, Utc};

/// # In-memory session store with signed identifiers and undo history
///
/// The store owns the current collection of sessions plus a
/// [`SessionCaretaker`] holding a memento of the collection after every
/// write. Because there is no external persistence, it is ephemeral and
/// will be cleared on server restart.
///
/// Every write (a) stamps the session with the signature of its id,
/// (b) replaces-or-appends by id, and (c) snapshots the whole collection.
/// Lookups require the id, a matching signature and non-expiry, so a
/// tampered or forged cookie presenting an unsigned or mismatched id reads
/// as "no session".
///
/// Snapshotting the whole collection on every write is O(n) per mutation.
/// That is acceptable for the small session counts this store is meant
/// for; replace the whole-collection snapshots with per-session undo logs
/// before pointing real volume at it.
///
/// The store assumes it is the sole mutator of its collection. Callers
/// serving concurrent traffic must wrap it in a lock so read-modify-write
/// sequences stay atomic; [`SessionMiddleware`](crate::SessionMiddleware)
/// does exactly that.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Vec<Session>,
    caretaker: SessionCaretaker,
    signer: Signer,
}

impl SessionStore {
    /// Create an empty store signing with the given signer.
    /// The history starts with a memento of the empty collection, which
    /// becomes the sticky oldest snapshot.
    pub fn new(signer: Signer) -> Self {
        let mut caretaker = SessionCaretaker::new();
        caretaker.save(SessionMemento::new(Vec::new()));
        Self {
            sessions: Vec::new(),
            caretaker,
            signer,
        }
    }

    /// The signer used to stamp session ids.
    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Swap the signing secret without re-stamping stored sessions.
    ///
    /// Every previously issued signature stops verifying, so all existing
    /// sessions read as "no session" and get replaced on their next
    /// request. This is the blunt instrument for invalidating everything
    /// at once.
    pub fn rotate_secret(&mut self, signer: Signer) {
        self.signer = signer;
    }

    /// Write a session: sign its id, replace-or-append by id, snapshot.
    ///
    /// The caller's session is stamped in place so it carries the same
    /// signature as the stored copy.
    pub fn write(&mut self, session: &mut Session) {
        session.set_signed_id(self.signer.sign(session.id()));
        match self
            .sessions
            .iter_mut()
            .find(|existing| existing.id() == session.id())
        {
            Some(existing) => *existing = session.clone(),
            None => self.sessions.push(session.clone()),
        }
        self.caretaker
            .save(SessionMemento::new(self.sessions.clone()));
        log::debug!(
            "stored session {} (history depth {})",
            session.id(),
            self.caretaker.history_len()
        );
    }

    /// Look up a session by the id a client presented.
    ///
    /// Reads the current memento. Returns `None` if the id is absent, the
    /// stored signature does not match `sign(id)`, or the session has
    /// expired at `now`. All three silently mean "no session".
    pub fn get_session_by_id(&self, session_id: &str, now: DateTime<Utc>) -> Option<Session> {
        let signed_session_id = self.signer.sign(session_id);
        let current = self.caretaker.current()?;
        current
            .state()
            .iter()
            .find(|session| {
                session.id() == session_id
                    && session.signed_id() == Some(signed_session_id.as_str())
                    && !session.is_expired(now)
            })
            .cloned()
    }

    /// Restore the previous memento as the working collection.
    /// A no-op once only the oldest snapshot remains.
    pub fn undo(&mut self) {
        if let Some(memento) = self.caretaker.undo() {
            self.sessions = memento.state().to_vec();
        }
    }

    /// Replay an undone memento as the working collection.
    /// A no-op if nothing was undone since the last write.
    pub fn redo(&mut self) {
        if let Some(memento) = self.caretaker.redo() {
            self.sessions = memento.state().to_vec();
        }
    }

    /// The sessions in the working collection.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// The number of sessions in the working collection.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if the working collection is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
