//! Per-session ring buffer with global TTL and soft-memory-cap LRU eviction,
//! backed by `moka::sync::Cache`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::sync::Cache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::key::SessionKey;

const MAX_TURNS_PER_SESSION: usize = 20;
const DEFAULT_TTL: Duration = Duration::from_secs(2 * 60 * 60);
const DEFAULT_MAX_SESSIONS: u64 = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Scratch {
    turns: VecDeque<Turn>,
}

/// In-memory, best-effort conversation history. Never a system of record:
/// entries are dropped silently on TTL expiry or memory pressure.
pub struct ScratchStore {
    sessions: Cache<String, Arc<Mutex<Scratch>>>,
}

impl ScratchStore {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_SESSIONS, DEFAULT_TTL)
    }

    pub fn with_limits(max_sessions: u64, ttl: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(max_sessions)
                .time_to_idle(ttl)
                .build(),
        }
    }

    fn session(&self, key: &SessionKey) -> Arc<Mutex<Scratch>> {
        self.sessions
            .get_with(key.as_cache_key(), || Arc::new(Mutex::new(Scratch::default())))
    }

    /// Returns a snapshot of the last ≤ `limit` turns, oldest first. Holds
    /// the per-session lock only long enough to clone, per the
    /// lock/snapshot/unlock/LLM-call/lock/append/unlock read-modify-write
    /// pattern: no lock is held across an LLM call.
    pub fn snapshot(&self, key: &SessionKey, limit: usize) -> Vec<Turn> {
        let session = self.session(key);
        let guard = session.lock();
        let skip = guard.turns.len().saturating_sub(limit);
        guard.turns.iter().skip(skip).cloned().collect()
    }

    /// Appends a turn, evicting the oldest if the session is at capacity.
    pub fn append(&self, key: &SessionKey, turn: Turn) {
        let session = self.session(key);
        let mut guard = session.lock();
        if guard.turns.len() >= MAX_TURNS_PER_SESSION {
            guard.turns.pop_front();
        }
        guard.turns.push_back(turn);
    }

    pub fn turn_count(&self, key: &SessionKey) -> usize {
        self.session(key).lock().turns.len()
    }

    pub fn session_count(&self) -> u64 {
        self.sessions.run_pending_tasks();
        self.sessions.entry_count()
    }

    pub fn clear(&self, key: &SessionKey) {
        self.sessions.invalidate(&key.as_cache_key());
    }
}

impl Default for ScratchStore {
    fn default() -> Self {
        Self::new()
    }
}
