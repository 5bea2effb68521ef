use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A mutable, expiring, per-user key/value bag with identity rotation.
///
/// A session is identified by a random UUID. Whenever it is written to a
/// [`SessionStore`](crate::SessionStore), the store stamps it with a
/// `signed_id`, the keyed-hash signature of the id; lookups require both
/// the id and a matching signature, which defends against tampered or
/// forged cookies. The signed id is never sent to a client.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: String,
    signed_id: Option<String>,
    user_id: String,
    created_at: DateTime<Utc>,
    last_accessed: DateTime<Utc>,
    expiry_time: DateTime<Utc>,
    data: HashMap<String, serde_json::Value>,
}

impl Session {
    /// Create a fresh session for the given user, expiring `ttl` from now.
    pub fn new(user_id: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            signed_id: None,
            user_id: user_id.into(),
            created_at: now,
            last_accessed: now,
            expiry_time: now + ttl,
            data: HashMap::new(),
        }
    }

    /// The session id. Globally unique at creation.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The signature the owning store stamped onto the id, if any.
    pub fn signed_id(&self) -> Option<&str> {
        self.signed_id.as_deref()
    }

    /// **This method should only be called by a session store!**
    ///
    /// Stamp the signature of the current id onto the session.
    pub fn set_signed_id(&mut self, signed_id: impl Into<String>) {
        self.signed_id = Some(signed_id.into());
    }

    /// The user this session belongs to.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// When the session was created. Id rotation does not reset this.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the session was last read or written through the pipeline.
    pub fn last_accessed(&self) -> DateTime<Utc> {
        self.last_accessed
    }

    /// When the session expires.
    pub fn expiry_time(&self) -> DateTime<Utc> {
        self.expiry_time
    }

    /// Move the expiry. Mostly useful to expire a session on purpose.
    pub fn set_expiry(&mut self, expiry_time: DateTime<Utc>) {
        self.expiry_time = expiry_time;
    }

    /// Returns true if the session has expired at `now`.
    /// Expired sessions are replaced by the store, never repaired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_time < now
    }

    /// How old the session id is at `now`, measured from creation.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created_at)
    }

    /// Bump the last-accessed timestamp.
    pub fn touch(&mut self) {
        self.last_accessed = Utc::now();
    }

    /// Read a value from the session data.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Write a value into the session data.
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
        self.touch();
    }

    /// Remove a value from the session data.
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        let removed = self.data.remove(key);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Drop all session data.
    pub fn clear(&mut self) {
        self.data.clear();
        self.touch();
    }

    /// The number of data entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the session holds no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Replace the id with a fresh UUID, keeping user and data.
    ///
    /// The old signature is cleared; the session is re-signed the next time
    /// it is written to a store. Rotating bounds the lifetime of any single
    /// exposed identifier and limits session-fixation exposure.
    pub fn regenerate_id(&mut self) {
        self.id = Uuid::new_v4().to_string();
        self.signed_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sessions_are_unique_and_unsigned() {
        let first = Session::new("guest", Duration::hours(1));
        let second = Session::new("guest", Duration::hours(1));
        assert_ne!(first.id(), second.id());
        assert_eq!(first.signed_id(), None);
        assert!(!first.is_expired(Utc::now()));
    }

    #[test]
    fn expiry_is_checked_against_a_supplied_clock() {
        let session = Session::new("guest", Duration::seconds(10));
        let now = Utc::now();
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::seconds(11)));
    }

    #[test]
    fn mutators_bump_last_accessed() {
        let mut session = Session::new("guest", Duration::hours(1));
        let before = session.last_accessed();
        session.set("theme", serde_json::json!("dark"));
        assert!(session.last_accessed() >= before);
        assert_eq!(session.get("theme"), Some(&serde_json::json!("dark")));
        session.remove("theme");
        assert!(session.is_empty());
    }

    #[test]
    fn regenerate_id_preserves_user_and_data() {
        let mut session = Session::new("ada", Duration::hours(1));
        session.set("cart", serde_json::json!([1, 2, 3]));
        session.set_signed_id("stamp");
        let old_id = session.id().to_string();

        session.regenerate_id();

        assert_ne!(session.id(), old_id);
        assert_eq!(session.signed_id(), None);
        assert_eq!(session.user_id(), "ada");
        assert_eq!(session.get("cart"), Some(&serde_json::json!([1, 2, 3])));
    }
}
