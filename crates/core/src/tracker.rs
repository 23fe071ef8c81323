//! Cross-turn conversation state: pending requests keyed by thread.
//!
//! Entries expire lazily on access; there is no background sweep. All
//! mutation goes through the one internal lock, and `apply_round` holds it
//! across a whole read-merge-decide round so concurrent replies to the same
//! thread cannot interleave.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::policy::Outcome;
use crate::requests::SecurityRequest;

pub const DEFAULT_TTL: Duration = Duration::from_secs(1000 * 60 * 60);
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug)]
struct PendingEntry {
    request: SecurityRequest,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct ConversationTracker {
    entries: Mutex<HashMap<String, PendingEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for ConversationTracker {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

impl ConversationTracker {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self { entries: Mutex::new(HashMap::new()), ttl, capacity }
    }

    /// The pending request for `key`, if one was stored and has not aged
    /// past the TTL. Expired entries are removed on read.
    pub fn get(&self, key: &str) -> Option<SecurityRequest> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.request.clone()),
            Some(_) => {
                entries.remove(key);
                tracing::debug!(event_name = "tracker.entry_expired", key, "pending entry expired");
                None
            }
            None => None,
        }
    }

    /// Stores, replaces or removes the pending request according to the
    /// round's outcome: terminal outcomes close the conversation, a
    /// follow-up request keeps it open with a fresh age.
    pub fn upsert_on_outcome(&self, key: &str, request: SecurityRequest, outcome: Outcome) {
        let mut entries = self.lock();
        self.apply_outcome(&mut entries, key, request, outcome);
    }

    /// Runs one reply round atomically: `round` sees the live pending
    /// request (if any) and returns a value plus the request and outcome to
    /// apply; the lock is held throughout.
    pub fn apply_round<T>(
        &self,
        key: &str,
        round: impl FnOnce(Option<&SecurityRequest>) -> (T, SecurityRequest, Outcome),
    ) -> T {
        let mut entries = self.lock();
        if entries.get(key).is_some_and(|entry| entry.stored_at.elapsed() >= self.ttl) {
            entries.remove(key);
        }
        let pending = entries.get(key).map(|entry| entry.request.clone());
        let (value, request, outcome) = round(pending.as_ref());
        self.apply_outcome(&mut entries, key, request, outcome);
        value
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn apply_outcome(
        &self,
        entries: &mut HashMap<String, PendingEntry>,
        key: &str,
        request: SecurityRequest,
        outcome: Outcome,
    ) {
        match outcome {
            Outcome::Accept | Outcome::Reject => {
                entries.remove(key);
            }
            Outcome::RequestFurtherDetails => {
                if !entries.contains_key(key) && entries.len() >= self.capacity {
                    Self::evict_soonest_to_expire(entries);
                }
                entries
                    .insert(key.to_owned(), PendingEntry { request, stored_at: Instant::now() });
            }
            Outcome::Irrelevant => {}
        }
    }

    // With a uniform TTL the soonest-to-expire entry is the oldest stored,
    // so capacity pressure drops conversations in arrival order.
    fn evict_soonest_to_expire(entries: &mut HashMap<String, PendingEntry>) {
        let evicted = entries
            .iter()
            .min_by_key(|(_, entry)| entry.stored_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = evicted {
            entries.remove(&key);
            tracing::debug!(event_name = "tracker.entry_evicted", key, "capacity eviction");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PendingEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
