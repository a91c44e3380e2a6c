//! Write-once query cache.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::OnceCell;

/// Per-key storage. Initialised at most once; an empty slot means the query has
/// not resolved successfully yet (or is being resolved right now).
pub(crate) type Slot = Arc<OnceCell<String>>;

/// Session-scoped map from a query string to its first successful result.
///
/// Keys are compared verbatim (case-sensitive, no trimming). A stored value is
/// never replaced, and nothing is ever evicted.
#[derive(Default)]
pub struct QueryCache {
    slots: RwLock<HashMap<String, Slot>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached result for `query`, if one was stored.
    pub fn get(&self, query: &str) -> Option<String> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.get(query).and_then(|slot| slot.get().cloned())
    }

    /// Store `result` under `query` unless a value is already present.
    ///
    /// Returns `true` when this call stored the value. If a lookup for `query`
    /// is in flight, waits for it: a successful lookup keeps its result and the
    /// write is rejected, a failed one leaves the key absent and the write lands.
    pub async fn put(&self, query: impl Into<String>, result: impl Into<String>) -> bool {
        let query = query.into();
        let result = result.into();
        let slot = self.slot(&query);
        let mut stored = false;
        let flag = &mut stored;
        slot.get_or_init(|| async move {
            *flag = true;
            result
        })
        .await;
        stored
    }

    pub fn contains(&self, query: &str) -> bool {
        self.get(query).is_some()
    }

    /// Number of queries with a stored result.
    pub fn len(&self) -> usize {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queries with a stored result, sorted.
    pub fn keys(&self) -> Vec<String> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Slot for `query`, created empty if absent.
    pub(crate) fn slot(&self, query: &str) -> Slot {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(query)
        {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(query.to_string()).or_default())
    }

    /// Drop an empty slot after a failed resolution, unless another caller
    /// still holds it (it will retry on the same slot).
    pub(crate) fn release(&self, query: &str, slot: &Slot) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let unused = slots
            .get(query)
            .map(|stored| Arc::ptr_eq(stored, slot) && Arc::strong_count(stored) == 2)
            .unwrap_or(false);
        if unused && !slot.initialized() {
            slots.remove(query);
        }
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .finish()
    }
}
