//!
//! This is a growable, indexable array tuned for short lists.
//!
//! Per-class method lists and ivar lists are expected to stay small, so the
//! array grows by 50% of its capacity instead of doubling, trading a few
//! extra copies for a tighter memory footprint.
//!

use std::slice;

/// The capacity used when none is requested.
const DEFAULT_CAPACITY: usize = 4;

/// An indexable, amortized-growth sequence for short metadata lists.
///
/// Removal shifts trailing elements down, so insertion order is stable.
/// This matters: method lists rely on first-match-wins ordering.
#[derive(Debug)]
pub struct GrowArray<T> {
    items: Vec<T>,
}

impl<T> GrowArray<T> {
    /// Create an empty array. No memory is allocated until the first push.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create an array with the given initial capacity (0 selects a default).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Append an element, growing the backing storage by 50% when full.
    pub fn push(&mut self, item: T) {
        if self.items.len() == self.items.capacity() {
            let additional = (self.items.capacity() / 2).max(1);
            self.items.reserve_exact(additional);
        }
        self.items.push(item);
    }

    /// Get the element at `index`.
    ///
    /// An out-of-range index is a programming error, not a reportable one:
    /// this panics rather than returning a sentinel.
    pub fn get(&self, index: usize) -> &T {
        match self.items.get(index) {
            Some(item) => item,
            None => panic!(
                "grow array index out of range ({} / {})",
                index,
                self.items.len()
            ),
        }
    }

    /// Get the element at `index`, or `None` if out of range.
    pub fn get_checked(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Get a mutable reference to the element at `index` (panics like `get`).
    pub fn get_mut(&mut self, index: usize) -> &mut T {
        let len = self.items.len();
        match self.items.get_mut(index) {
            Some(item) => item,
            None => panic!("grow array index out of range ({} / {})", index, len),
        }
    }

    /// Index of the first element matching the predicate.
    pub fn index_of(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.items.iter().position(|item| predicate(item))
    }

    /// Remove the element at `index`, shifting trailing elements down.
    ///
    /// Panics on an out-of-range index, like `get`.
    pub fn remove(&mut self, index: usize) -> T {
        if index >= self.items.len() {
            panic!(
                "grow array index out of range ({} / {})",
                index,
                self.items.len()
            );
        }
        self.items.remove(index)
    }

    /// Remove the first element matching the predicate, if any.
    pub fn remove_item(&mut self, predicate: impl FnMut(&T) -> bool) -> Option<T> {
        let index = self.index_of(predicate)?;
        Some(self.items.remove(index))
    }

    /// The number of elements currently stored.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The current capacity of the backing storage.
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Iterate over the elements in insertion order.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> Default for GrowArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a GrowArray<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
