use std::cell::Cell;

use crate::reference::Ref;
use crate::utils::{pairing2, pairing3, MyHash};

/// Direct-mapped computed table.
///
/// Each slot keeps the full key, so a hash collision only ever costs an
/// eviction, never a wrong answer.
pub struct Cache<K, V> {
    data: Vec<Option<(K, V)>>,
    bitmask: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl<K, V> Cache<K, V> {
    /// Create a new cache with `2^bits` slots.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Bits should be in the range 0..=31");

        let size = 1 << bits;
        Self {
            data: std::iter::repeat_with(|| None).take(size).collect(),
            bitmask: (size - 1) as u64,
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// Get the number of cache hits.
    pub fn hits(&self) -> usize {
        self.hits.get()
    }
    /// Get the number of cache misses.
    pub fn misses(&self) -> usize {
        self.misses.get()
    }
}

impl<K, V> Cache<K, V>
where
    K: MyHash + Eq,
{
    fn slot(&self, key: &K) -> usize {
        (key.hash() & self.bitmask) as usize
    }

    /// Get the cached result.
    pub fn get(&self, key: &K) -> Option<&V> {
        match &self.data[self.slot(key)] {
            Some((k, v)) if k == key => {
                self.hits.set(self.hits.get() + 1);
                Some(v)
            }
            _ => {
                self.misses.set(self.misses.get() + 1);
                None
            }
        }
    }

    /// Insert a result into the cache, evicting whatever shared its slot.
    pub fn insert(&mut self, key: K, value: V) {
        let slot = self.slot(&key);
        self.data[slot] = Some((key, value));
    }
}

impl MyHash for Ref {
    fn hash(&self) -> u64 {
        self.unsigned() as u64
    }
}

impl MyHash for (Ref, Ref) {
    fn hash(&self) -> u64 {
        pairing2(self.0.unsigned() as u64, self.1.unsigned() as u64)
    }
}

impl MyHash for (Ref, Ref, Ref) {
    fn hash(&self) -> u64 {
        pairing3(
            self.0.unsigned() as u64,
            self.1.unsigned() as u64,
            self.2.unsigned() as u64,
        )
    }
}
