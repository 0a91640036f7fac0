//!
//! Per-class caching of resolved methods.
//!
//! A cache maps selectors to the method a past lookup resolved them to.
//! Fetches take only a read lock, keeping the hot dispatch path cheap and
//! allocation-free; inserts and flushes serialize on the write lock.
//!

use std::sync::Arc;

use mort_core::HashTable;
use parking_lot::RwLock;

use crate::method::Method;
use crate::selectors::Sel;

/// A usual class resolves a few dozen selectors; start the table there.
const CACHE_CAPACITY: usize = 64;

fn method_selector(method: &Arc<Method>) -> &Sel {
    &method.selector
}

fn same_method(a: &Arc<Method>, b: &Arc<Method>) -> bool {
    Arc::ptr_eq(a, b)
}

/// A selector-to-method cache, lazily created on first insert.
///
/// Flushing swaps the table out under the write lock and destroys it after
/// the lock is released; a concurrent fetch either completed against the old
/// table before the swap or simply misses and re-resolves.
pub struct MethodCache {
    table: RwLock<Option<HashTable<Arc<Method>, Sel>>>,
}

impl MethodCache {
    /// Create an empty (table-less) cache.
    pub fn new() -> Self {
        Self {
            table: RwLock::new(None),
        }
    }

    /// Fetch the cached method for `selector`, if any.
    pub fn fetch(&self, selector: Sel) -> Option<Arc<Method>> {
        self.table.read().as_ref()?.get(&selector).cloned()
    }

    /// Insert a resolved method.
    ///
    /// Upsert-once semantics: if this exact method is already cached for its
    /// selector, the insert is a no-op.
    pub fn insert(&self, method: Arc<Method>) {
        let mut guard = self.table.write();
        guard
            .get_or_insert_with(|| {
                HashTable::with_capacity(CACHE_CAPACITY, method_selector, same_method)
            })
            .insert(method);
    }

    /// Discard all cached resolutions.
    ///
    /// The next miss recreates the table lazily.
    pub fn flush(&self) {
        let old = self.table.write().take();
        // The old table is destroyed only after the lock is released.
        drop(old);
    }

    /// Whether the cache currently holds no table.
    pub fn is_flushed(&self) -> bool {
        self.table.read().is_none()
    }
}

impl Default for MethodCache {
    fn default() -> Self {
        Self::new()
    }
}
