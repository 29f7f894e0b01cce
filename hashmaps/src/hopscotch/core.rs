//! Declares core types for [`Hopscotch`].
use super::bucket::{Bucket, MAX_NEIGHBORHOOD};
use crate::hashing::hashers::MixHasher;
use crate::utils::capacity::{
    capacity_for, growth_threshold, valid_max_load, DEFAULT_CAPACITY, DEFAULT_MAX_LOAD,
};
use bitvec::prelude::*;
use hashmaps_core::{Hasher, Map, MapError};
use std::fmt::{Debug, Formatter};
use std::iter::repeat_with;
use std::mem::MaybeUninit;

/// The neighborhood width every table starts with. Must be a power of two.
const DEFAULT_NEIGHBORHOOD: usize = 4;

/// The widest power-of-two neighborhood; the next step is [`MAX_NEIGHBORHOOD`].
const LAST_POW2_NEIGHBORHOOD: usize = 32;

/// Open addressing hash table that confines every entry to a bounded neighborhood.
///
/// Each home bucket tracks, in a bitmap of width H (the neighborhood size), which of the next
/// H slots hold an entry homed at it. Lookup therefore inspects at most H buckets regardless
/// of how loaded the table is - a worst-case constant, by construction.
///
/// Insertion pays for that bound: it probes linearly for a free slot and, when that slot is
/// too far from home, repeatedly relocates a nearer entry into it ("moves the hole closer")
/// until the hole lies within the neighborhood. When no relocation is possible the
/// neighborhood doubles (4 up to 32, then jumping to the hard cap of 63 given one reserved
/// occupancy bit), and as a last resort the whole table grows.
///
/// The backing array carries `neighborhood` extra trailing slots so neighborhoods near the
/// high end never wrap around; probing past the physical end simply grows the table.
///
/// # Examples
///
/// ```rust
/// use hashmaps::hopscotch::Hopscotch;
///
/// let mut index = Hopscotch::<u64, &str>::new();
/// index.put(3, "third");
/// index.put(5, "fifth");
///
/// assert_eq!(index.get(&3), Some(&"third"));
/// assert_eq!(index.get(&4), None);
/// ```
pub struct Hopscotch<K: Eq, V, H: Hasher<K> = MixHasher<K>> {
    buckets: Vec<Bucket<K, V>>,
    hasher: H,
    /// Count of live entries.
    length: usize,
    /// `capacity - 1`; capacity is a power of two, so this doubles as the index mask. The
    /// physical bucket array is `capacity + neighborhood` slots long.
    cap_minus_1: usize,
    /// Current neighborhood width H.
    neighborhood: usize,
    /// Entry count at which the next `put` grows the table.
    next_resize: usize,
    max_load: f32,
}

impl<K: Eq, V, H: Hasher<K>> Hopscotch<K, V, H> {
    /// Create an empty table with a default hasher.
    pub fn new() -> Self {
        Self::with_hasher(H::default())
    }

    /// Create an empty table that hashes keys with `hasher`.
    pub fn with_hasher(hasher: H) -> Self {
        Self {
            buckets: Self::new_bucket_array(DEFAULT_CAPACITY + DEFAULT_NEIGHBORHOOD),
            hasher,
            length: 0,
            cap_minus_1: DEFAULT_CAPACITY - 1,
            neighborhood: DEFAULT_NEIGHBORHOOD,
            next_resize: growth_threshold(DEFAULT_CAPACITY, DEFAULT_MAX_LOAD),
            max_load: DEFAULT_MAX_LOAD,
        }
    }

    fn new_bucket_array(physical_len: usize) -> Vec<Bucket<K, V>> {
        repeat_with(Bucket::vacant).take(physical_len).collect()
    }

    /// Look for `key` within the neighborhood of its home bucket.
    ///
    /// Inspects only the slots whose bits are set in the home bucket's bitmap, so the cost is
    /// bounded by the neighborhood width.
    #[inline]
    fn search(&self, home_idx: usize, key: &K) -> Option<usize> {
        let neighborhood = self.buckets[home_idx].neighborhood();
        for distance in neighborhood.view_bits::<Lsb0>().iter_ones() {
            let idx = home_idx + distance;
            if unsafe { self.buckets[idx].key.assume_init_ref() } == key {
                return Some(idx);
            }
        }
        None
    }

    /// Get the value stored for this key.
    pub fn get(&self, key: &K) -> Option<&V> {
        let home_idx = self.hasher.hash(key) as usize & self.cap_minus_1;
        self.search(home_idx, key)
            .map(|idx| unsafe { self.buckets[idx].value.assume_init_ref() })
    }

    /// Map the given key to the given value, overwriting any previous value.
    ///
    /// Returns `true` if the element is a new item in the table.
    pub fn put(&mut self, key: K, value: V) -> bool {
        if self.length >= self.next_resize {
            self.grow();
        }

        let home_idx = self.hasher.hash(&key) as usize & self.cap_minus_1;
        if let Some(idx) = self.search(home_idx, &key) {
            *unsafe { self.buckets[idx].value.assume_init_mut() } = value;
            return false;
        }

        self.length += 1;
        self.emplace(key, value);

        true
    }

    /// Add an entry known to be absent, restoring the neighborhood invariant as needed.
    ///
    /// Every pass of the outer loop either finishes, widens the neighborhood (bounded by
    /// [`MAX_NEIGHBORHOOD`]), or doubles the capacity - so the retry terminates.
    fn emplace(&mut self, key: K, value: V) {
        'retry: loop {
            let home_idx = self.hasher.hash(&key) as usize & self.cap_minus_1;

            // Linear probing for the next free slot. No wraparound: the trailing region
            // covers neighborhoods at the high end, and running off the physical end just
            // means the table is due to grow.
            let mut empty_idx = home_idx;
            loop {
                if empty_idx == self.buckets.len() {
                    self.grow();
                    continue 'retry;
                }
                if self.buckets[empty_idx].is_empty() {
                    break;
                }
                empty_idx += 1;
            }

            // If the free slot is outside the neighborhood, walk it closer one relocation
            // at a time.
            loop {
                let distance = empty_idx - home_idx;
                if distance < self.neighborhood {
                    let bucket = &mut self.buckets[empty_idx];
                    bucket.occupy();
                    bucket.key.write(key);
                    bucket.value.write(value);
                    self.buckets[home_idx].set_neighbor(distance, true);
                    return;
                }

                if !self.move_closer(&mut empty_idx) {
                    break;
                }
            }

            if !self.increase_neighborhood() {
                // Last resort, should be rare: rehashing into twice the space spreads the
                // cluster that the bitmap could no longer cover.
                self.grow();
            }
        }
    }

    /// Try to move the free slot at `*empty_idx` closer to its requester by relocating an
    /// entry from a nearer neighborhood into it.
    ///
    /// Scans the window `[empty_idx - H + 1, empty_idx)` for a home bucket with an occupant
    /// below `*empty_idx`; the first such occupant moves into the free slot, both bitmaps are
    /// updated, and `*empty_idx` adopts the vacated position. The caller guarantees
    /// `*empty_idx >= H`, since the free slot lies at least a full neighborhood from home.
    fn move_closer(&mut self, empty_idx: &mut usize) -> bool {
        let start = *empty_idx - (self.neighborhood - 1);

        for home in start..*empty_idx {
            let neighborhood = self.buckets[home].neighborhood();
            for distance in neighborhood.view_bits::<Lsb0>().iter_ones() {
                let candidate = home + distance;
                if candidate >= *empty_idx {
                    break;
                }

                let key = unsafe { self.buckets[candidate].key.assume_init_read() };
                let value = unsafe { self.buckets[candidate].value.assume_init_read() };
                self.buckets[candidate].release();

                let target = &mut self.buckets[*empty_idx];
                target.occupy();
                target.key.write(key);
                target.value.write(value);

                self.buckets[home].set_neighbor(distance, false);
                self.buckets[home].set_neighbor(*empty_idx - home, true);

                *empty_idx = candidate;
                return true;
            }
        }

        false
    }

    /// Widen the neighborhood one step: doubling up to 32, then the hard cap of 63.
    fn increase_neighborhood(&mut self) -> bool {
        if self.neighborhood < LAST_POW2_NEIGHBORHOOD {
            self.neighborhood *= 2;
            return true;
        }
        if self.neighborhood == LAST_POW2_NEIGHBORHOOD {
            self.neighborhood = MAX_NEIGHBORHOOD;
            return true;
        }

        false
    }

    /// Remove the entry for this key. Returns `true` if the key was present.
    pub fn remove(&mut self, key: &K) -> bool {
        let home_idx = self.hasher.hash(key) as usize & self.cap_minus_1;
        let Some(idx) = self.search(home_idx, key) else {
            return false;
        };

        self.buckets[home_idx].set_neighbor(idx - home_idx, false);

        let bucket = &mut self.buckets[idx];
        bucket.release();
        unsafe {
            bucket.key.assume_init_drop();
            bucket.value.assume_init_drop();
        }
        self.length -= 1;

        true
    }

    /// Pre-size the table for at least `n` entries. Never shrinks.
    pub fn reserve(&mut self, n: usize) {
        let new_cap = capacity_for(n, self.max_load);
        if self.cap_minus_1 + 1 < new_cap {
            self.resize(new_cap);
        }
    }

    /// Remove all entries, keeping the bucket array.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            if !bucket.is_empty() {
                unsafe {
                    bucket.key.assume_init_drop();
                    bucket.value.assume_init_drop();
                }
            }
            bucket.hop_info = 0;
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
        self.length as f32 / (self.cap_minus_1 + 1) as f32
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
        self.next_resize = growth_threshold(self.cap_minus_1 + 1, ratio);
        Ok(())
    }

    /// Call `visitor` on every entry in no particular order; stop early when it returns `true`.
    pub fn each<F: FnMut(&K, &V) -> bool>(&self, mut visitor: F) {
        for bucket in &self.buckets {
            if !bucket.is_empty() {
                let key = unsafe { bucket.key.assume_init_ref() };
                let value = unsafe { bucket.value.assume_init_ref() };
                if visitor(key, value) {
                    return;
                }
            }
        }
    }

    fn grow(&mut self) {
        self.resize((self.cap_minus_1 + 1) * 2);
    }

    fn resize(&mut self, n: usize) {
        self.cap_minus_1 = n - 1;
        self.next_resize = growth_threshold(n, self.max_load);

        let old_buckets = std::mem::replace(
            &mut self.buckets,
            Self::new_bucket_array(n + self.neighborhood),
        );
        // Re-emplacing can itself grow the table again (nested, with the capacity already
        // doubled); the remaining entries then land in the final array.
        for bucket in old_buckets {
            if !bucket.is_empty() {
                let key = unsafe { bucket.key.assume_init_read() };
                let value = unsafe { bucket.value.assume_init_read() };
                self.emplace(key, value);
            }
        }
    }
}

impl<K: Eq, V, H: Hasher<K>> Default for Hopscotch<K, V, H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deinitializes only the occupied slots and skips the free ones.
impl<K: Eq, V, H: Hasher<K>> Drop for Hopscotch<K, V, H> {
    fn drop(&mut self) {
        for bucket in &mut self.buckets {
            if !bucket.is_empty() {
                unsafe {
                    bucket.key.assume_init_drop();
                    bucket.value.assume_init_drop();
                }
            }
        }
    }
}

impl<K: Eq + Clone, V: Clone, H: Hasher<K>> Clone for Hopscotch<K, V, H> {
    fn clone(&self) -> Self {
        let buckets = self
            .buckets
            .iter()
            .map(|bucket| Bucket {
                hop_info: bucket.hop_info,
                key: if bucket.is_empty() {
                    MaybeUninit::uninit()
                } else {
                    MaybeUninit::new(unsafe { bucket.key.assume_init_ref() }.clone())
                },
                value: if bucket.is_empty() {
                    MaybeUninit::uninit()
                } else {
                    MaybeUninit::new(unsafe { bucket.value.assume_init_ref() }.clone())
                },
            })
            .collect();

        Self {
            buckets,
            hasher: self.hasher.clone(),
            length: self.length,
            cap_minus_1: self.cap_minus_1,
            neighborhood: self.neighborhood,
            next_resize: self.next_resize,
            max_load: self.max_load,
        }
    }
}

impl<K, V, H> Debug for Hopscotch<K, V, H>
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

impl<K: Eq, V, H: Hasher<K>> Map<K, V> for Hopscotch<K, V, H> {
    fn get(&self, key: &K) -> Option<&V> {
        Hopscotch::get(self, key)
    }
    fn put(&mut self, key: K, value: V) -> bool {
        Hopscotch::put(self, key, value)
    }
    fn remove(&mut self, key: &K) -> bool {
        Hopscotch::remove(self, key)
    }
    fn len(&self) -> usize {
        Hopscotch::len(self)
    }
    fn load_factor(&self) -> f32 {
        Hopscotch::load_factor(self)
    }
    fn reserve(&mut self, n: usize) {
        Hopscotch::reserve(self, n)
    }
    fn clear(&mut self) {
        Hopscotch::clear(self)
    }
    fn set_max_load(&mut self, ratio: f32) -> Result<(), MapError> {
        Hopscotch::set_max_load(self, ratio)
    }
    fn each(&self, visitor: &mut dyn FnMut(&K, &V) -> bool) {
        Hopscotch::each(self, |key, value| visitor(key, value))
    }
}
