//! In-memory session states keyed by the caller's session id.

use crate::models::SessionState;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Header carrying the caller's session id.
pub const SESSION_HEADER: &str = "x-session-id";

/// Session id used when a caller sends none.
pub const ANONYMOUS_SESSION: &str = "anonymous";

pub const DEFAULT_MAX_SESSIONS: usize = 1000;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(3600);

struct SessionSlot {
    state: Arc<Mutex<SessionState>>,
    last_used: Instant,
}

/// Each session is guarded by its own lock so one session runs one request
/// at a time while sessions proceed independently.
///
/// The store holds at most `max_sessions` entries. When a new session
/// pushes it over, idle sessions are dropped first, then the least
/// recently used ones.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, SessionSlot>>,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS, DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new(max_sessions: usize, idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            max_sessions: max_sessions.max(1),
            idle_timeout,
        }
    }

    /// Handle to the session, created empty on first use.
    pub fn session(&self, id: &str) -> Arc<Mutex<SessionState>> {
        let now = Instant::now();
        let (state, created) = match self.sessions.entry(id.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().last_used = now;
                (entry.get().state.clone(), false)
            }
            Entry::Vacant(entry) => {
                let state = Arc::new(Mutex::new(SessionState::new()));
                entry.insert(SessionSlot {
                    state: state.clone(),
                    last_used: now,
                });
                (state, true)
            }
        };

        if created && self.sessions.len() > self.max_sessions {
            self.evict(id, now);
        }
        state
    }

    fn evict(&self, keep: &str, now: Instant) {
        let before = self.sessions.len();
        self.sessions.retain(|key, slot| {
            key == keep || now.duration_since(slot.last_used) < self.idle_timeout
        });

        let excess = self.sessions.len().saturating_sub(self.max_sessions);
        if excess > 0 {
            let mut by_age: Vec<(String, Instant)> = self
                .sessions
                .iter()
                .filter(|entry| entry.key() != keep)
                .map(|entry| (entry.key().clone(), entry.value().last_used))
                .collect();
            by_age.sort_by_key(|(_, last_used)| *last_used);
            for (key, _) in by_age.into_iter().take(excess) {
                self.sessions.remove(&key);
            }
        }

        tracing::debug!(
            evicted = before - self.sessions.len(),
            remaining = self.sessions.len(),
            "Evicted sessions"
        );
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }
}
