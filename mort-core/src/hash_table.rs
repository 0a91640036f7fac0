//!
//! This is a generic open-hashing table with compact buckets.
//!
//! Each bucket holds zero, one, or many entries; the single-entry case is
//! stored inline so the common no-collision lookup never chases a pointer
//! list. The table only ever grows, by doubling, and rehashes every bucket
//! from scratch when it does.
//!

use std::mem;
use std::slice;

/// Hashing for table keys.
///
/// String keys use an order-dependent XOR fold of 4-byte chunks; identity
/// keys (interned handles) hash to their own value.
pub trait TableKey {
    /// Compute the hash of this key.
    fn table_hash(&self) -> u32;
}

impl TableKey for str {
    fn table_hash(&self) -> u32 {
        let mut hash = 0u32;
        for chunk in self.as_bytes().chunks(4) {
            for (i, byte) in chunk.iter().enumerate() {
                hash ^= u32::from(*byte) << (8 * i as u32);
            }
        }
        hash
    }
}

impl TableKey for u32 {
    fn table_hash(&self) -> u32 {
        *self
    }
}

/// A bucket holding zero, one (inline) or many entries.
#[derive(Debug)]
enum Bucket<T> {
    Empty,
    One(T),
    Many(Vec<T>),
}

impl<T> Bucket<T> {
    fn as_slice(&self) -> &[T] {
        match self {
            Self::Empty => &[],
            Self::One(item) => slice::from_ref(item),
            Self::Many(items) => items.as_slice(),
        }
    }
}

/// An associative table of entries, keyed by a caller-supplied key getter.
///
/// Entry equality is a caller-supplied predicate as well, so the same table
/// shape backs both the name-keyed class registry and the identity-keyed
/// method caches. Inserting an entry equal to a present one is a no-op.
///
/// The table itself is unsynchronized; owners that share it across threads
/// wrap it in a reader-writer lock.
#[derive(Debug)]
pub struct HashTable<T, K: ?Sized> {
    key_of: fn(&T) -> &K,
    equals: fn(&T, &T) -> bool,
    entry_count: usize,
    buckets: Box<[Bucket<T>]>,
}

impl<T, K> HashTable<T, K>
where
    K: TableKey + PartialEq + ?Sized,
{
    /// Create a table with at least `capacity` buckets (rounded up to a
    /// power of two).
    pub fn with_capacity(
        capacity: usize,
        key_of: fn(&T) -> &K,
        equals: fn(&T, &T) -> bool,
    ) -> Self {
        let bucket_count = capacity.max(1).next_power_of_two();
        Self {
            key_of,
            equals,
            entry_count: 0,
            buckets: Self::allocate_buckets(bucket_count),
        }
    }

    fn allocate_buckets(count: usize) -> Box<[Bucket<T>]> {
        let mut buckets = Vec::with_capacity(count);
        buckets.resize_with(count, || Bucket::Empty);
        buckets.into_boxed_slice()
    }

    fn bucket_index(&self, key: &K) -> usize {
        (key.table_hash() as usize) & (self.buckets.len() - 1)
    }

    /// Insert an entry. If an equal entry is already present, nothing happens.
    pub fn insert(&mut self, obj: T) {
        let equals = self.equals;
        let index = self.bucket_index((self.key_of)(&obj));
        let slot = &mut self.buckets[index];
        match slot {
            Bucket::Empty => {
                *slot = Bucket::One(obj);
                self.entry_count += 1;
            }
            Bucket::One(present) => {
                if equals(present, &obj) {
                    return;
                }
                let taken = match mem::replace(slot, Bucket::Empty) {
                    Bucket::One(taken) => taken,
                    _ => unreachable!(),
                };
                *slot = Bucket::Many(vec![obj, taken]);
                self.entry_count += 1;
            }
            Bucket::Many(items) => {
                if items.iter().any(|present| equals(present, &obj)) {
                    return;
                }
                items.push(obj);
                self.entry_count += 1;
            }
        }

        if self.entry_count > self.buckets.len() {
            self.grow();
        }
    }

    /// Look up the entry stored under `key`, if any.
    pub fn get(&self, key: &K) -> Option<&T> {
        let index = self.bucket_index(key);
        self.buckets[index]
            .as_slice()
            .iter()
            .find(|entry| *key == *(self.key_of)(entry))
    }

    /// Doubles the bucket array and rebuilds every bucket from scratch.
    fn grow(&mut self) {
        let new_count = self.buckets.len() * 2;
        let old_buckets = mem::replace(&mut self.buckets, Self::allocate_buckets(new_count));

        for bucket in Vec::from(old_buckets) {
            match bucket {
                Bucket::Empty => {}
                Bucket::One(item) => self.reinsert(item),
                Bucket::Many(items) => {
                    for item in items {
                        self.reinsert(item);
                    }
                }
            }
        }
    }

    /// Re-slot an entry during growth. Entries are already unique, so no
    /// equality scan and no growth check.
    fn reinsert(&mut self, obj: T) {
        let index = self.bucket_index((self.key_of)(&obj));
        let slot = &mut self.buckets[index];
        match slot {
            Bucket::Empty => *slot = Bucket::One(obj),
            Bucket::One(_) => {
                let taken = match mem::replace(slot, Bucket::Empty) {
                    Bucket::One(taken) => taken,
                    _ => unreachable!(),
                };
                *slot = Bucket::Many(vec![obj, taken]);
            }
            Bucket::Many(items) => items.push(obj),
        }
    }

    /// The number of entries stored.
    pub fn len(&self) -> usize {
        self.entry_count
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// The current number of buckets (always a power of two).
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Iterate over all entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buckets.iter().flat_map(Bucket::as_slice)
    }
}
