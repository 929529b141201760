//! In-memory session tracker implementation.

use anyhow::Result;
use parking_lot::Mutex;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::BuildHasher;

use super::traits::SessionTracker;

const DEFAULT_SHARDS: usize = 16;

/// An in-memory session tracker backed by mutex-protected hash map shards.
///
/// Each id always lands on the same shard, so the increment for one id is
/// serialized by that shard's lock while ids on other shards proceed in
/// parallel. Entries are never evicted.
pub struct InMemorySessionTracker {
    shards: Box<[Mutex<HashMap<String, u64>>]>,
    hasher: RandomState,
}

impl InMemorySessionTracker {
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Build a tracker with `shards` lock stripes (at least one).
    pub fn with_shards(shards: usize) -> Self {
        let shards = shards.max(1);
        Self {
            shards: (0..shards).map(|_| Mutex::new(HashMap::new())).collect(),
            hasher: RandomState::new(),
        }
    }

    fn shard(&self, session_id: &str) -> &Mutex<HashMap<String, u64>> {
        let len = self.shards.len() as u64;
        #[allow(clippy::cast_possible_truncation)]
        let idx = (self.hasher.hash_one(session_id) % len) as usize;
        &self.shards[idx]
    }
}

impl Default for InMemorySessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTracker for InMemorySessionTracker {
    fn touch(&self, session_id: &str) -> Result<u64> {
        let mut shard = self.shard(session_id).lock();
        // Avoid allocating the key on the hot path for known sessions.
        if let Some(count) = shard.get_mut(session_id) {
            *count += 1;
            return Ok(*count);
        }
        shard.insert(session_id.to_string(), 1);
        Ok(1)
    }

    fn count(&self, session_id: &str) -> Option<u64> {
        self.shard(session_id).lock().get(session_id).copied()
    }

    fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}
