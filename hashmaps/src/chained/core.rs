//! Declares core types for [`Chained`].
use crate::hashing::hashers::MixHasher;
use crate::utils::capacity::{capacity_for, growth_threshold, valid_max_load, DEFAULT_CAPACITY};
use hashmaps_core::{Hasher, Map, MapError};
use std::fmt::{Debug, Formatter};
use std::iter::repeat_with;

/// A node of a collision chain. Owned by its predecessor (or the bucket head), so a node's heap
/// address never changes for as long as its key is in the table - growth relinks the boxes
/// instead of copying them.
struct Node<K, V> {
    key: K,
    value: V,
    next: Option<Box<Node<K, V>>>,
}

type Chain<K, V> = Option<Box<Node<K, V>>>;

/// Hash table that resolves collisions with a singly linked chain per bucket.
///
/// The baseline engine: insertion prepends in O(1), lookup and removal scan one chain, and
/// nothing is ever moved - which makes it the right choice when values are large or when
/// mutable borrows obtained through [`Chained::get_mut`] should stay cheap to re-acquire. The
/// trade-off is a heap allocation per entry and a worst case of O(n) for a fully collided
/// chain; no chain length limit is enforced.
///
/// # Examples
///
/// ```rust
/// use hashmaps::chained::Chained;
///
/// let mut ratings = Chained::<&str, u8>::new();
/// ratings.put("Moby Dick", 4);
/// ratings.put("Pride and Prejudice", 5);
///
/// assert_eq!(ratings.get(&"Moby Dick"), Some(&4));
/// assert_eq!(ratings.len(), 2);
/// ```
pub struct Chained<K: Eq, V, H: Hasher<K> = MixHasher<K>> {
    buckets: Vec<Chain<K, V>>,
    hasher: H,
    /// Count of live entries.
    length: usize,
    /// `capacity - 1`; capacity is a power of two, so this doubles as the index mask.
    cap_minus_1: usize,
    /// Entry count at which the next `put` grows the table.
    next_resize: usize,
    max_load: f32,
}

impl<K: Eq, V, H: Hasher<K>> Chained<K, V, H> {
    /// Create an empty table with a default hasher.
    pub fn new() -> Self {
        Self::with_hasher(H::default())
    }

    /// Create an empty table that hashes keys with `hasher`.
    pub fn with_hasher(hasher: H) -> Self {
        // Chains absorb any surplus, so the default threshold is the capacity itself and the
        // table only doubles once every bucket holds one entry on average.
        let max_load = 1.0;
        Self {
            buckets: repeat_with(|| None).take(DEFAULT_CAPACITY).collect(),
            hasher,
            length: 0,
            cap_minus_1: DEFAULT_CAPACITY - 1,
            next_resize: growth_threshold(DEFAULT_CAPACITY, max_load),
            max_load,
        }
    }

    #[inline]
    fn index_of(&self, key: &K) -> usize {
        self.hasher.hash(key) as usize & self.cap_minus_1
    }

    /// Get the value stored for this key.
    pub fn get(&self, key: &K) -> Option<&V> {
        let mut current = self.buckets[self.index_of(key)].as_deref();
        while let Some(node) = current {
            if node.key == *key {
                return Some(&node.value);
            }
            current = node.next.as_deref();
        }
        None
    }

    /// Get a mutable borrow of the value stored for this key.
    ///
    /// Because growth relinks nodes instead of copying them, re-acquiring this borrow after
    /// other insertions observes the same entry until the key is removed.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = self.index_of(key);
        let mut current = self.buckets[idx].as_deref_mut();
        while let Some(node) = current {
            if node.key == *key {
                return Some(&mut node.value);
            }
            current = node.next.as_deref_mut();
        }
        None
    }

    /// Insert `key` with a default value unless present, and return a mutable borrow of the
    /// stored value together with whether the key was newly inserted.
    pub fn insert(&mut self, key: K) -> (&mut V, bool)
    where
        V: Default,
    {
        if self.length >= self.next_resize {
            self.grow();
        }

        let idx = self.index_of(&key);

        let mut present = false;
        let mut current = self.buckets[idx].as_deref();
        while let Some(node) = current {
            if node.key == key {
                present = true;
                break;
            }
            current = node.next.as_deref();
        }

        if !present {
            self.length += 1;
            let next = self.buckets[idx].take();
            let node = self.buckets[idx].insert(Box::new(Node {
                key,
                value: V::default(),
                next,
            }));
            return (&mut node.value, true);
        }

        let mut current = self.buckets[idx].as_deref_mut();
        while let Some(node) = current {
            if node.key == key {
                return (&mut node.value, false);
            }
            current = node.next.as_deref_mut();
        }
        unreachable!("entry disappeared between the presence check and the mutable walk");
    }

    /// Map the given key to the given value, overwriting any previous value.
    ///
    /// Returns `true` if the element is a new item in the table.
    pub fn put(&mut self, key: K, value: V) -> bool {
        if self.length >= self.next_resize {
            self.grow();
        }

        let idx = self.index_of(&key);

        let mut current = self.buckets[idx].as_deref_mut();
        while let Some(node) = current {
            if node.key == key {
                node.value = value;
                return false;
            }
            current = node.next.as_deref_mut();
        }

        self.length += 1;
        let next = self.buckets[idx].take();
        self.buckets[idx] = Some(Box::new(Node { key, value, next }));

        true
    }

    /// Remove the entry for this key. Returns `true` if the key was present.
    pub fn remove(&mut self, key: &K) -> bool {
        let idx = self.index_of(key);

        let mut current = &mut self.buckets[idx];
        loop {
            match current.take() {
                None => return false,
                Some(mut node) => {
                    if node.key == *key {
                        *current = node.next.take();
                        self.length -= 1;
                        return true;
                    }
                    // Not the one; relink and advance to its successor.
                    current = &mut current.insert(node).next;
                }
            }
        }
    }

    /// Pre-size the table for at least `n` entries. Never shrinks.
    pub fn reserve(&mut self, n: usize) {
        let new_cap = capacity_for(n, self.max_load);
        if self.buckets.len() < new_cap {
            self.resize(new_cap);
        }
    }

    /// Remove all entries, keeping the bucket array.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            // Unlink iteratively; letting the chain drop recursively would blow the stack on
            // degenerate chains.
            let mut head = bucket.take();
            while let Some(mut node) = head {
                head = node.next.take();
            }
        }
        self.length = 0;
    }

    /// Get the number of live entries.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Get the load factor: live entries divided by capacity.
    pub fn load_factor(&self) -> f32 {
        self.length as f32 / self.buckets.len() as f32
    }

    /// Change the load factor at which the table grows.
    ///
    /// Fails with [`MapError::LoadFactorOutOfRange`] unless `ratio` is in the open
    /// interval (0, 1); the table is left unchanged in that case.
    pub fn set_max_load(&mut self, ratio: f32) -> Result<(), MapError> {
        if !valid_max_load(ratio) {
            return Err(MapError::LoadFactorOutOfRange(ratio));
        }

        self.max_load = ratio;
        self.next_resize = growth_threshold(self.buckets.len(), ratio);
        Ok(())
    }

    /// Call `visitor` on every entry in no particular order; stop early when it returns `true`.
    pub fn each<F: FnMut(&K, &V) -> bool>(&self, mut visitor: F) {
        for bucket in &self.buckets {
            let mut current = bucket.as_deref();
            while let Some(node) = current {
                if visitor(&node.key, &node.value) {
                    return;
                }
                current = node.next.as_deref();
            }
        }
    }

    fn grow(&mut self) {
        self.resize((self.cap_minus_1 + 1) * 2);
    }

    /// Rehash into `n` buckets by relinking the existing nodes; no entry is reallocated.
    fn resize(&mut self, n: usize) {
        self.cap_minus_1 = n - 1;
        self.next_resize = growth_threshold(n, self.max_load);

        let old_buckets = std::mem::replace(&mut self.buckets, repeat_with(|| None).take(n).collect());
        for mut head in old_buckets {
            while let Some(mut node) = head {
                head = node.next.take();

                let idx = self.hasher.hash(&node.key) as usize & self.cap_minus_1;
                node.next = self.buckets[idx].take();
                self.buckets[idx] = Some(node);
            }
        }
    }
}

impl<K: Eq, V, H: Hasher<K>> Default for Chained<K, V, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq, V, H: Hasher<K>> Drop for Chained<K, V, H> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K: Eq + Clone, V: Clone, H: Hasher<K>> Clone for Chained<K, V, H> {
    fn clone(&self) -> Self {
        let mut copy = Self::with_hasher(self.hasher.clone());
        copy.max_load = self.max_load;
        copy.reserve(self.length);
        self.each(|key, value| {
            copy.put(key.clone(), value.clone());
            false
        });
        copy
    }
}

impl<K, V, H> Debug for Chained<K, V, H>
where
    K: Eq + Debug,
    V: Debug,
    H: Hasher<K>,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        self.each(|key, value| {
            map.entry(key, value);
            false
        });
        map.finish()
    }
}

impl<K: Eq, V, H: Hasher<K>> Map<K, V> for Chained<K, V, H> {
    fn get(&self, key: &K) -> Option<&V> {
        Chained::get(self, key)
    }
    fn put(&mut self, key: K, value: V) -> bool {
        Chained::put(self, key, value)
    }
    fn remove(&mut self, key: &K) -> bool {
        Chained::remove(self, key)
    }
    fn len(&self) -> usize {
        Chained::len(self)
    }
    fn load_factor(&self) -> f32 {
        Chained::load_factor(self)
    }
    fn reserve(&mut self, n: usize) {
        Chained::reserve(self, n)
    }
    fn clear(&mut self) {
        Chained::clear(self)
    }
    fn set_max_load(&mut self, ratio: f32) -> Result<(), MapError> {
        Chained::set_max_load(self, ratio)
    }
    fn each(&self, visitor: &mut dyn FnMut(&K, &V) -> bool) {
        Chained::each(self, |key, value| visitor(key, value))
    }
}
