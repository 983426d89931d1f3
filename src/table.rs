use crate::utils::MyHash;

struct Entry<T> {
    value: T,
    next: usize,
}

/// Unique table: a growable arena of values with hash-chained buckets.
///
/// Index `0` is a sentinel and never refers to a stored value, so `0` can
/// double as the "end of chain" marker.
pub struct Table<T> {
    data: Vec<Entry<T>>,
    buckets: Vec<usize>,
    bitmask: u64,
}

impl<T> Table<T>
where
    T: Default,
{
    /// Create a new table with `2^bits` buckets.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Storage bits should be in the range 0..=31");

        let buckets_size = 1 << bits;
        let mut data = Vec::with_capacity(buckets_size);
        data.push(Entry {
            value: T::default(),
            next: 0,
        });

        Self {
            data,
            buckets: vec![0; buckets_size],
            bitmask: (buckets_size - 1) as u64,
        }
    }
}

impl<T> Table<T> {
    /// Number of stored values (the sentinel excluded).
    pub fn size(&self) -> usize {
        self.data.len() - 1
    }

    /// Number of buckets.
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Get the reference to the value at the given index.
    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        &self.data[index].value
    }

    /// Append a value outside of any bucket and return its index.
    pub fn add(&mut self, value: T) -> usize {
        self.data.push(Entry { value, next: 0 });
        self.data.len() - 1
    }
}

impl<T> Table<T>
where
    T: MyHash + Eq,
{
    /// Return the index of `value`, inserting it first if it is not present.
    pub fn put(&mut self, value: T) -> usize {
        let bucket = (value.hash() & self.bitmask) as usize;
        let mut index = self.buckets[bucket];

        if index == 0 {
            let i = self.add(value);
            self.buckets[bucket] = i;
            return i;
        }

        loop {
            if self.data[index].value == value {
                return index;
            }
            let next = self.data[index].next;
            if next == 0 {
                let i = self.add(value);
                self.data[index].next = i;
                return i;
            }
            index = next;
        }
    }
}
