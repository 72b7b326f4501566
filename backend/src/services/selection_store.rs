//! Per-session selection memory for the HTTP server.
//!
//! Holds one [`SelectionMemory`] per browser session. Concurrent refreshes
//! for the same session are not ordered: the last `store` wins.
//!
//! The map is bounded. Sessions idle for longer than the TTL read as empty
//! and are dropped on the next sweep, and once `max_sessions` is exceeded
//! the least recently stored session is evicted.

use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::selection::SelectionMemory;

const DEFAULT_MAX_SESSIONS: usize = 10_000;
const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy)]
struct SessionEntry {
    memory: SelectionMemory,
    stored_at: Instant,
    /// Store order, used to pick the least recently used entry
    stamp: u64,
}

#[derive(Default)]
struct Sessions {
    entries: HashMap<String, SessionEntry>,
    next_stamp: u64,
}

/// In-memory session to selection map.
#[derive(Clone)]
pub struct SelectionStore {
    sessions: Arc<RwLock<Sessions>>,
    max_sessions: usize,
    idle_ttl: Duration,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_SESSIONS, DEFAULT_IDLE_TTL)
    }
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding at most `max_sessions` entries (at least one), each
    /// forgotten after `idle_ttl` without a store.
    pub fn with_limits(max_sessions: usize, idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(Sessions::default())),
            max_sessions: max_sessions.max(1),
            idle_ttl,
        }
    }

    /// Memory for a session; empty if the session has never refreshed or
    /// has been idle past the TTL.
    pub fn load(&self, session_id: &str) -> SelectionMemory {
        self.sessions
            .read()
            .entries
            .get(session_id)
            .filter(|entry| !self.is_expired(entry))
            .map(|entry| entry.memory)
            .unwrap_or_default()
    }

    /// Replace the memory for a session and mark it as recently used.
    pub fn store(&self, session_id: &str, memory: SelectionMemory) {
        let mut sessions = self.sessions.write();
        let stamp = sessions.next_stamp;
        sessions.next_stamp += 1;

        sessions.entries.insert(
            session_id.to_string(),
            SessionEntry {
                memory,
                stored_at: Instant::now(),
                stamp,
            },
        );

        if sessions.entries.len() > self.max_sessions {
            self.evict(&mut sessions);
        }
    }

    /// Drop a session's memory, e.g. on logout.
    pub fn forget(&self, session_id: &str) -> bool {
        self.sessions.write().entries.remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().entries.is_empty()
    }

    fn is_expired(&self, entry: &SessionEntry) -> bool {
        entry.stored_at.elapsed() >= self.idle_ttl
    }

    fn evict(&self, sessions: &mut Sessions) {
        let before = sessions.entries.len();
        sessions.entries.retain(|_, entry| !self.is_expired(entry));

        while sessions.entries.len() > self.max_sessions {
            let oldest = sessions
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.stamp)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    sessions.entries.remove(&id);
                }
                None => break,
            }
        }

        debug!(
            "evicted {} selection sessions, {} left",
            before - sessions.entries.len(),
            sessions.entries.len()
        );
    }
}
