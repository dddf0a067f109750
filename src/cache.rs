use std::collections::HashMap;
use std::sync::Arc;

use crate::record::LoggerId;

struct Entry {
    bytes: Arc<[u8]>,
    last_used: u64,
}

/// Pre-encoded derived fields keyed by logger identity.
///
/// Entries are never invalidated: a logger's derived fields are fixed for
/// its lifetime, and a logger with different fields must use a new
/// identity. When full, the least recently used entry is evicted.
pub struct DerivedFieldCache {
    capacity: usize,
    entries: HashMap<LoggerId, Entry>,
    clock: u64,
}

impl DerivedFieldCache {
    pub fn new(capacity: usize) -> Self {
        DerivedFieldCache {
            capacity,
            entries: HashMap::with_capacity(capacity),
            clock: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    pub fn get(&mut self, id: LoggerId) -> Option<Arc<[u8]>> {
        let now = self.tick();
        let entry = self.entries.get_mut(&id)?;
        entry.last_used = now;
        Some(Arc::clone(&entry.bytes))
    }

    pub fn set(&mut self, id: LoggerId, bytes: Arc<[u8]>) {
        if self.capacity == 0 {
            return;
        }
        let now = self.tick();
        if !self.entries.contains_key(&id) && self.entries.len() >= self.capacity {
            self.evict_one();
        }
        self.entries.insert(
            id,
            Entry {
                bytes,
                last_used: now,
            },
        );
    }

    fn evict_one(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_used)
            .map(|(id, _)| *id);
        if let Some(id) = oldest {
            self.entries.remove(&id);
            tracing::trace!(logger_id = id.0, "evicted derived fields from cache");
        }
    }
}
