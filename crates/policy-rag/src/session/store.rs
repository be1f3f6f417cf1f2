//! Registry of live conversation sessions

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{Error, Result};

use super::conversation::Conversation;

/// A session's conversation, locked for the duration of a turn
pub type SessionHandle = Arc<Mutex<Conversation>>;

struct SessionEntry {
    conversation: SessionHandle,
    last_active: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            conversation: Arc::new(Mutex::new(Conversation::new())),
            last_active: Instant::now(),
        }
    }

    /// Idle for at least `ttl` and not held by an in-flight request
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        Arc::strong_count(&self.conversation) == 1 && now.duration_since(self.last_active) >= ttl
    }
}

/// Concurrent map of session id to conversation
///
/// Turns within one session run one at a time behind the session's mutex;
/// different sessions never contend. With an idle timeout set, sessions not
/// touched for that long are dropped on the next sweep.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, SessionEntry>,
    idle_timeout: Option<Duration>,
}

impl SessionStore {
    /// A store that keeps sessions until they are removed
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that evicts sessions idle for `timeout`
    pub fn with_idle_timeout(timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout: Some(timeout),
        }
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    /// Start a new empty session, sweeping idle ones first
    pub fn create(&self) -> Uuid {
        self.evict_idle();

        let id = Uuid::new_v4();
        self.sessions.insert(id, SessionEntry::new());
        tracing::debug!(session = %id, "Session created");
        id
    }

    /// Look up a session and mark it active
    pub fn get(&self, id: &Uuid) -> Result<SessionHandle> {
        self.sessions
            .get_mut(id)
            .map(|mut entry| {
                entry.last_active = Instant::now();
                Arc::clone(&entry.conversation)
            })
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// End a session, dropping its history
    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Drop sessions idle past the timeout; returns how many were dropped
    pub fn evict_idle(&self) -> usize {
        let Some(ttl) = self.idle_timeout else {
            return 0;
        };

        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| !entry.is_expired(ttl, now));
        let evicted = before.saturating_sub(self.sessions.len());

        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
