//! Memoized resolution outcomes.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::OnceCell;

/// Key → outcome cache populated on demand. Entries are never invalidated.
///
/// Concurrent callers asking for the same key converge on one
/// computation: the slot is created under the write lock, the value is
/// computed outside it.
pub struct ProbingIndex<V> {
    entries: RwLock<HashMap<String, Arc<OnceCell<V>>>>,
}

impl<V: Clone> ProbingIndex<V> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Memoized value for `key`, if one has been computed.
    pub fn get(&self, key: &str) -> Option<V> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .and_then(|cell| cell.get().cloned())
    }

    /// Value for `key`, computing it with `compute` on first use.
    ///
    /// Returns the value and whether this call ran `compute`.
    pub fn get_or_compute(&self, key: &str, compute: impl FnOnce() -> V) -> (V, bool) {
        let cell = self.slot(key);
        let mut computed = false;
        let value = cell
            .get_or_init(|| {
                computed = true;
                compute()
            })
            .clone();
        (value, computed)
    }

    /// Whether `key` has a memoized value.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of memoized keys.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    /// Whether nothing has been memoized.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &str) -> Arc<OnceCell<V>> {
        if let Some(cell) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return cell.clone();
        }

        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.to_string())
            .or_default()
            .clone()
    }
}

impl<V: Clone> Default for ProbingIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn computes_once_per_key() {
        let index = ProbingIndex::new();

        let (first, computed_first) = index.get_or_compute("Foo", || 1);
        let (second, computed_second) = index.get_or_compute("Foo", || 2);

        assert_eq!((first, computed_first), (1, true));
        assert_eq!((second, computed_second), (1, false));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn memoizes_misses() {
        let index: ProbingIndex<Option<u32>> = ProbingIndex::new();
        index.get_or_compute("Missing", || None);

        assert!(index.contains("Missing"));
        assert_eq!(index.get("Missing"), Some(None));
        assert_eq!(index.get("Other"), None);
    }

    #[test]
    fn concurrent_callers_share_one_computation() {
        let index = ProbingIndex::new();
        let calls = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let (value, _) = index.get_or_compute("Shared", || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(5));
                        42
                    });
                    assert_eq!(value, 42);
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
