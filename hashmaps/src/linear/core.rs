//! Declares core types for [`Linear`].
use crate::hashing::hashers::MixHasher;
use crate::utils::capacity::{
    capacity_for, growth_threshold, valid_max_load, DEFAULT_CAPACITY, DEFAULT_MAX_LOAD,
};
use hashmaps_core::{Hasher, Map, MapError};
use std::fmt::{Debug, Formatter};
use std::iter::repeat_with;
use std::mem::MaybeUninit;

/// A bucket of the flat array.
///
/// Occupancy is tracked through the key alone: a slot whose key equals the table's empty
/// sentinel is free and its `value` is uninitialized. Everything touching `value` must check
/// the key first.
struct Slot<K, V> {
    key: K,
    value: MaybeUninit<V>,
}

/// Open addressing hash table that resolves collisions with linear probing.
///
/// The densest layout of the four engines: a bucket is exactly one key and one value, with no
/// per-slot bookkeeping at all. The price is a reserved **empty sentinel** key value that marks
/// free slots and therefore can never be used as a live key - by default the key type's
/// [`Default`] value, or any caller-supplied value via [`Linear::with_empty`].
///
/// Removal uses backward-shifting instead of tombstones: the probe run following the removed
/// entry is re-emplaced so that no empty slot ever interrupts the run of any live key. Lookup
/// cost therefore never degrades as entries churn.
///
/// # Examples
///
/// ```rust
/// use hashmaps::linear::Linear;
///
/// let mut ages = Linear::<u64, u32>::new();
/// ages.put(101, 34);
/// ages.put(205, 27);
///
/// assert_eq!(ages.get(&101), Some(&34));
/// assert_eq!(ages.get(&7), None);
/// ```
pub struct Linear<K: Eq, V, H: Hasher<K> = MixHasher<K>> {
    buckets: Vec<Slot<K, V>>,
    empty: K,
    hasher: H,
    /// Count of live entries.
    length: usize,
    /// `capacity - 1`; capacity is a power of two, so this doubles as the index mask.
    cap_minus_1: usize,
    /// Entry count at which the next `put` grows the table.
    next_resize: usize,
    max_load: f32,
}

impl<K: Eq + Clone, V, H: Hasher<K>> Linear<K, V, H> {
    /// Create an empty table using the key type's default value as the empty sentinel.
    pub fn new() -> Self
    where
        K: Default,
    {
        Self::with_empty(K::default())
    }

    /// Create an empty table with a caller-chosen empty sentinel.
    ///
    /// Use this whenever the key type's default value (`0`, `""`, ...) is a legitimate key.
    pub fn with_empty(empty: K) -> Self {
        Self::with_hasher(empty, H::default())
    }

    /// Create an empty table with a caller-chosen empty sentinel and hasher.
    pub fn with_hasher(empty: K, hasher: H) -> Self {
        Self {
            buckets: Self::new_bucket_array(DEFAULT_CAPACITY, &empty),
            empty,
            hasher,
            length: 0,
            cap_minus_1: DEFAULT_CAPACITY - 1,
            next_resize: growth_threshold(DEFAULT_CAPACITY, DEFAULT_MAX_LOAD),
            max_load: DEFAULT_MAX_LOAD,
        }
    }

    fn new_bucket_array(capacity: usize, empty: &K) -> Vec<Slot<K, V>> {
        repeat_with(|| Slot {
            key: empty.clone(),
            value: MaybeUninit::uninit(),
        })
        .take(capacity)
        .collect()
    }

    /// Fail fast on the one key value that cannot be represented.
    #[inline]
    fn check_key(&self, key: &K) {
        if *key == self.empty {
            panic!("the empty-sentinel key value cannot be used as a live key");
        }
    }

    /// Find the slot holding `key`, probing from its home index to the next free slot.
    #[inline]
    fn slot_of(&self, key: &K) -> Option<usize> {
        let mut idx = self.hasher.hash(key) as usize & self.cap_minus_1;

        while self.buckets[idx].key != self.empty {
            if self.buckets[idx].key == *key {
                return Some(idx);
            }
            idx = (idx + 1) & self.cap_minus_1;
        }

        None
    }

    /// Get the value stored for this key.
    ///
    /// # Panics
    ///
    /// If `key` equals the table's empty sentinel.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.check_key(key);
        self.slot_of(key)
            .map(|idx| unsafe { self.buckets[idx].value.assume_init_ref() })
    }

    /// Map the given key to the given value, overwriting any previous value.
    ///
    /// Returns `true` if the element is a new item in the table.
    ///
    /// # Panics
    ///
    /// If `key` equals the table's empty sentinel.
    pub fn put(&mut self, key: K, value: V) -> bool {
        self.check_key(&key);

        if self.length >= self.next_resize {
            self.resize((self.cap_minus_1 + 1) * 2);
        }

        let mut idx = self.hasher.hash(&key) as usize & self.cap_minus_1;
        while self.buckets[idx].key != self.empty {
            if self.buckets[idx].key == key {
                *unsafe { self.buckets[idx].value.assume_init_mut() } = value;
                return false;
            }
            idx = (idx + 1) & self.cap_minus_1;
        }

        self.buckets[idx].key = key;
        self.buckets[idx].value.write(value);
        self.length += 1;

        true
    }

    /// Write an entry known to be absent into the first free slot of its probe run.
    fn emplace(&mut self, key: K, value: V) {
        let mut idx = self.hasher.hash(&key) as usize & self.cap_minus_1;
        while self.buckets[idx].key != self.empty {
            idx = (idx + 1) & self.cap_minus_1;
        }

        self.buckets[idx].key = key;
        self.buckets[idx].value.write(value);
    }

    /// Remove the entry for this key. Returns `true` if the key was present.
    ///
    /// # Panics
    ///
    /// If `key` equals the table's empty sentinel.
    pub fn remove(&mut self, key: &K) -> bool {
        self.check_key(key);

        let Some(mut idx) = self.slot_of(key) else {
            return false;
        };

        self.buckets[idx].key = self.empty.clone();
        unsafe { self.buckets[idx].value.assume_init_drop() };
        self.length -= 1;

        // Backward-shift: re-emplace the rest of the probe run so that no empty slot
        // interrupts the run of any live key.
        loop {
            idx = (idx + 1) & self.cap_minus_1;
            if self.buckets[idx].key == self.empty {
                break;
            }

            let shifted_key = std::mem::replace(&mut self.buckets[idx].key, self.empty.clone());
            let shifted_value = unsafe { self.buckets[idx].value.assume_init_read() };
            self.emplace(shifted_key, shifted_value);
        }

        true
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
        for slot in &mut self.buckets {
            if slot.key != self.empty {
                slot.key = self.empty.clone();
                unsafe { slot.value.assume_init_drop() };
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
        for slot in &self.buckets {
            if slot.key != self.empty {
                let value = unsafe { slot.value.assume_init_ref() };
                if visitor(&slot.key, value) {
                    return;
                }
            }
        }
    }

    fn resize(&mut self, n: usize) {
        self.cap_minus_1 = n - 1;
        self.next_resize = growth_threshold(n, self.max_load);

        let old_buckets =
            std::mem::replace(&mut self.buckets, Self::new_bucket_array(n, &self.empty));
        for slot in old_buckets {
            if slot.key != self.empty {
                let value = unsafe { slot.value.assume_init_read() };
                self.emplace(slot.key, value);
            }
        }
    }
}

impl<K: Eq + Clone + Default, V, H: Hasher<K>> Default for Linear<K, V, H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deinitializes only the occupied slots and skips the free ones.
impl<K: Eq, V, H: Hasher<K>> Drop for Linear<K, V, H> {
    fn drop(&mut self) {
        for slot in &mut self.buckets {
            if slot.key != self.empty {
                unsafe { slot.value.assume_init_drop() };
            }
        }
    }
}

impl<K: Eq + Clone, V: Clone, H: Hasher<K>> Clone for Linear<K, V, H> {
    fn clone(&self) -> Self {
        let buckets = self
            .buckets
            .iter()
            .map(|slot| Slot {
                key: slot.key.clone(),
                value: if slot.key != self.empty {
                    MaybeUninit::new(unsafe { slot.value.assume_init_ref() }.clone())
                } else {
                    MaybeUninit::uninit()
                },
            })
            .collect();

        Self {
            buckets,
            empty: self.empty.clone(),
            hasher: self.hasher.clone(),
            length: self.length,
            cap_minus_1: self.cap_minus_1,
            next_resize: self.next_resize,
            max_load: self.max_load,
        }
    }
}

impl<K, V, H> Debug for Linear<K, V, H>
where
    K: Eq + Clone + Debug,
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

impl<K: Eq + Clone, V, H: Hasher<K>> Map<K, V> for Linear<K, V, H> {
    fn get(&self, key: &K) -> Option<&V> {
        Linear::get(self, key)
    }
    fn put(&mut self, key: K, value: V) -> bool {
        Linear::put(self, key, value)
    }
    fn remove(&mut self, key: &K) -> bool {
        Linear::remove(self, key)
    }
    fn len(&self) -> usize {
        Linear::len(self)
    }
    fn load_factor(&self) -> f32 {
        Linear::load_factor(self)
    }
    fn reserve(&mut self, n: usize) {
        Linear::reserve(self, n)
    }
    fn clear(&mut self) {
        Linear::clear(self)
    }
    fn set_max_load(&mut self, ratio: f32) -> Result<(), MapError> {
        Linear::set_max_load(self, ratio)
    }
    fn each(&self, visitor: &mut dyn FnMut(&K, &V) -> bool) {
        Linear::each(self, |key, value| visitor(key, value))
    }
}
