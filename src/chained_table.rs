use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use log::trace;
use crate::error::TableError;

const DEFAULT_BUCKETS: usize = 100;
const LOAD_FACTOR: f64 = 0.7;

/// Separate-chaining hash table storing values under a key extracted from
/// each value. Inserting an equal key replaces the stored value.
pub struct ChainedTable<K: Hash + Eq, T> {
    buckets: Vec<Vec<T>>,
    key_of: Box<dyn Fn(&T) -> K>,
    len: usize,
}

fn bucket_of<K: Hash>(key: &K, buckets: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % buckets as u64) as usize
}

impl<K: Hash + Eq, T> ChainedTable<K, T> {
    pub fn new<F>(key_of: F) -> Self
    where F: Fn(&T) -> K + 'static
    {
        Self::with_buckets(key_of, DEFAULT_BUCKETS)
    }

    pub fn with_buckets<F>(key_of: F, buckets: usize) -> Self
    where F: Fn(&T) -> K + 'static
    {
        let buckets = (0..buckets.max(1)).map(|_| Vec::new()).collect();
        Self{buckets, key_of: Box::new(key_of), len: 0}
    }

    fn resize(&mut self) {
        let new_size = self.buckets.len() * 2;
        trace!("resizing chained table from {} to {} buckets", self.buckets.len(), new_size);
        let mut buckets: Vec<Vec<T>> = (0..new_size).map(|_| Vec::new()).collect();
        for bucket in self.buckets.drain(..) {
            for val in bucket {
                let idx = bucket_of(&(self.key_of)(&val), new_size);
                buckets[idx].push(val);
            }
        }
        self.buckets = buckets;
    }

    pub fn insert(&mut self, val: T) -> Option<T> {
        if self.len as f64 / self.buckets.len() as f64 > LOAD_FACTOR {
            self.resize();
        }

        let key = (self.key_of)(&val);
        let idx = bucket_of(&key, self.buckets.len());
        let key_of = &self.key_of;
        let bucket = &mut self.buckets[idx];
        match bucket.iter().position(|v| key_of(v) == key) {
            Some(pos) => Some(std::mem::replace(&mut bucket[pos], val)),
            None => {
                bucket.push(val);
                self.len += 1;
                None
            }
        }
    }

    pub fn find(&self, key: &K) -> Option<&T> {
        let idx = bucket_of(key, self.buckets.len());
        self.buckets[idx].iter().find(|v| (self.key_of)(*v) == *key)
    }

    pub fn remove(&mut self, key: &K) -> Result<T, TableError> {
        let idx = bucket_of(key, self.buckets.len());
        let key_of = &self.key_of;
        let bucket = &mut self.buckets[idx];
        let pos = bucket.iter().position(|v| key_of(v) == *key).ok_or(TableError::KeyNotFound)?;
        self.len -= 1;
        Ok(bucket.remove(pos))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.buckets.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}


#[test]
fn test_insert_find_remove() {
    let mut t = ChainedTable::new(|v: &(u32, &'static str)| v.0);
    assert_eq!(t.insert((1, "a")), None);
    assert_eq!(t.insert((2, "b")), None);
    assert_eq!(t.insert((1, "c")), Some((1, "a")));
    assert_eq!(t.len(), 2);
    assert_eq!(t.find(&1), Some(&(1, "c")));
    assert_eq!(t.find(&3), None);

    assert_eq!(t.remove(&1), Ok((1, "c")));
    assert_eq!(t.remove(&1), Err(TableError::KeyNotFound));
    assert_eq!(t.len(), 1);
}

#[test]
fn test_resize_keeps_entries() {
    let mut t = ChainedTable::with_buckets(|v: &u64| *v, 4);
    for i in 0..100 {
        t.insert(i);
    }
    assert!(t.bucket_count() >= 128);
    assert_eq!(t.len(), 100);
    for i in 0..100 {
        assert_eq!(t.find(&i), Some(&i));
    }
    assert_eq!(t.values().count(), 100);
}
