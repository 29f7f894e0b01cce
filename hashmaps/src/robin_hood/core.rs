//! Declares core types for [`RobinHood`].
//!
//! Background on the probing discipline:
//! - <https://programming.guide/robin-hood-hashing.html>
//! - <https://cs.uwaterloo.ca/research/tr/1986/CS-86-14.pdf>
use crate::hashing::hashers::MixHasher;
use crate::utils::capacity::{
    capacity_for, growth_threshold, valid_max_load, DEFAULT_CAPACITY, DEFAULT_MAX_LOAD,
};
use hashmaps_core::{Hasher, Map, MapError};
use std::fmt::{Debug, Formatter};
use std::iter::repeat_with;
use std::mem::MaybeUninit;

/// Marks a free slot in the `psl` field.
const EMPTY_BUCKET: i8 = -1;

/// A bucket of the flat array.
struct Slot<K, V> {
    /// Probe sequence length: the distance from this slot back to the entry's home index.
    /// [`EMPTY_BUCKET`] marks a free slot, in which case `key` and `value` are uninitialized.
    psl: i8,
    key: MaybeUninit<K>,
    value: MaybeUninit<V>,
}

/// An entry in flight during emplacement: either the one being inserted or an occupant that a
/// swap has displaced.
struct Carried<K, V> {
    psl: i8,
    key: K,
    value: V,
}

/// PSL ceiling for a table of `capacity` buckets: `1.5 * log2(capacity)`, clamped to the `i8`
/// range. An insertion whose probe distance would pass the ceiling grows the table instead.
#[inline]
fn psl_bound(capacity: usize) -> i8 {
    (3 * capacity.ilog2() / 2).min(i8::MAX as u32) as i8
}

/// Hash table that combines linear probing with Robin Hood hashing.
///
/// Every slot remembers its probe sequence length (PSL): how far it sits from the index its
/// hash points at. Insertion walks forward and, whenever the entry in flight is poorer (has
/// accrued a larger distance) than the slot's occupant, the two swap and the displaced occupant
/// carries on probing - "takes from the rich, gives to the poor". This keeps the variance of
/// displacement small; the expected maximum PSL of a loaded table is O(log n).
///
/// Two conditions grow the table: the configurable load-factor threshold, and a safety valve
/// when an insertion's PSL would pass `1.5 * log2(capacity)`, which shields degenerate
/// clustering. Removal backward-shifts the run following the hole so the PSL distribution is
/// exactly as if the remaining keys had been freshly probed.
///
/// A good trade-off between performance and memory consumption: one extra byte per bucket
/// compared to [`Linear`](crate::linear::Linear), with far better probe-length behavior near
/// the load limit.
///
/// # Examples
///
/// ```rust
/// use hashmaps::robin_hood::RobinHood;
///
/// let mut populations = RobinHood::<&str, u64>::new();
/// populations.put("Berlin", 3_878_100);
/// populations.put("Leipzig", 628_718);
///
/// assert_eq!(populations.get(&"Leipzig"), Some(&628_718));
/// assert!(populations.remove(&"Berlin"));
/// ```
pub struct RobinHood<K: Eq, V, H: Hasher<K> = MixHasher<K>> {
    buckets: Vec<Slot<K, V>>,
    hasher: H,
    /// Count of live entries.
    length: usize,
    /// `capacity - 1`; capacity is a power of two, so this doubles as the index mask.
    cap_minus_1: usize,
    /// Entry count at which the next `put` grows the table.
    next_resize: usize,
    /// PSL ceiling for the current capacity.
    max_psl: i8,
    max_load: f32,
}

impl<K: Eq, V, H: Hasher<K>> RobinHood<K, V, H> {
    /// Create an empty table with a default hasher.
    pub fn new() -> Self {
        Self::with_hasher(H::default())
    }

    /// Create an empty table that hashes keys with `hasher`.
    pub fn with_hasher(hasher: H) -> Self {
        Self {
            buckets: Self::new_bucket_array(DEFAULT_CAPACITY),
            hasher,
            length: 0,
            cap_minus_1: DEFAULT_CAPACITY - 1,
            next_resize: growth_threshold(DEFAULT_CAPACITY, DEFAULT_MAX_LOAD),
            max_psl: psl_bound(DEFAULT_CAPACITY),
            max_load: DEFAULT_MAX_LOAD,
        }
    }

    fn new_bucket_array(capacity: usize) -> Vec<Slot<K, V>> {
        repeat_with(|| Slot {
            psl: EMPTY_BUCKET,
            key: MaybeUninit::uninit(),
            value: MaybeUninit::uninit(),
        })
        .take(capacity)
        .collect()
    }

    /// Get the value stored for this key.
    ///
    /// A slot's PSL strictly bounds how far away a matching key could still sit, so the probe
    /// stops at the first slot poorer than the walked distance - no sentinel scan to the next
    /// hole is ever needed.
    pub fn get(&self, key: &K) -> Option<&V> {
        let mut idx = self.hasher.hash(key) as usize & self.cap_minus_1;
        let mut psl: i8 = 0;

        loop {
            let slot = &self.buckets[idx];
            if psl > slot.psl {
                // Covers the empty slot too: its PSL is -1.
                return None;
            }
            if unsafe { slot.key.assume_init_ref() } == key {
                return Some(unsafe { slot.value.assume_init_ref() });
            }

            idx = (idx + 1) & self.cap_minus_1;
            psl += 1;
        }
    }

    /// Map the given key to the given value, overwriting any previous value.
    ///
    /// Returns `true` if the element is a new item in the table.
    pub fn put(&mut self, key: K, value: V) -> bool {
        if self.length >= self.next_resize {
            self.grow();
        }

        let mut idx = self.hasher.hash(&key) as usize & self.cap_minus_1;
        let mut psl: i8 = 0;
        loop {
            let slot = &self.buckets[idx];
            if psl > slot.psl {
                break;
            }
            if unsafe { slot.key.assume_init_ref() } == &key {
                *unsafe { self.buckets[idx].value.assume_init_mut() } = value;
                return false;
            }

            idx = (idx + 1) & self.cap_minus_1;
            psl += 1;
        }

        self.length += 1;
        self.insert_displaced(key, value);

        true
    }

    /// Emplace an entry known to be absent, growing as often as needed to honor the PSL bound.
    ///
    /// Terminates because every retry doubles the capacity and thereby raises the bound.
    fn insert_displaced(&mut self, key: K, value: V) {
        let mut carried = (key, value);
        loop {
            match self.try_emplace(carried.0, carried.1) {
                Ok(()) => return,
                Err(displaced) => {
                    carried = displaced;
                    self.grow();
                }
            }
        }
    }

    /// Walk forward from the home index applying the Robin Hood creed until a free slot takes
    /// the carried entry: "takes from the rich and gives to the poor" - rich means low PSL,
    /// poor means high PSL.
    ///
    /// Fails with the carried entry once its PSL would pass the ceiling; the entry is no
    /// longer in the table in that case and must be re-emplaced after growing.
    fn try_emplace(&mut self, key: K, value: V) -> Result<(), (K, V)> {
        let mut idx = self.hasher.hash(&key) as usize & self.cap_minus_1;
        let mut current = Carried { psl: 0, key, value };

        loop {
            if current.psl > self.max_psl {
                return Err((current.key, current.value));
            }

            let slot = &mut self.buckets[idx];
            if slot.psl == EMPTY_BUCKET {
                slot.psl = current.psl;
                slot.key.write(current.key);
                slot.value.write(current.value);
                return Ok(());
            }

            if current.psl > slot.psl {
                std::mem::swap(&mut current.psl, &mut slot.psl);
                std::mem::swap(&mut current.key, unsafe { slot.key.assume_init_mut() });
                std::mem::swap(&mut current.value, unsafe { slot.value.assume_init_mut() });
            }

            idx = (idx + 1) & self.cap_minus_1;
            current.psl += 1;
        }
    }

    /// Remove the entry for this key. Returns `true` if the key was present.
    pub fn remove(&mut self, key: &K) -> bool {
        let mut idx = self.hasher.hash(key) as usize & self.cap_minus_1;
        let mut psl: i8 = 0;
        loop {
            let slot = &self.buckets[idx];
            if psl > slot.psl {
                return false;
            }
            if unsafe { slot.key.assume_init_ref() } == key {
                break;
            }

            idx = (idx + 1) & self.cap_minus_1;
            psl += 1;
        }

        {
            let slot = &mut self.buckets[idx];
            slot.psl = EMPTY_BUCKET;
            unsafe {
                slot.key.assume_init_drop();
                slot.value.assume_init_drop();
            }
        }
        self.length -= 1;

        // Back-shift the following run: each entry moves one slot closer to home, until a
        // slot that is already home (PSL 0) or empty ends the run.
        let mut hole = idx;
        loop {
            let next = (hole + 1) & self.cap_minus_1;
            if self.buckets[next].psl <= 0 {
                break;
            }

            let shifted_psl = self.buckets[next].psl - 1;
            let shifted_key = unsafe { self.buckets[next].key.assume_init_read() };
            let shifted_value = unsafe { self.buckets[next].value.assume_init_read() };
            self.buckets[next].psl = EMPTY_BUCKET;

            let hole_slot = &mut self.buckets[hole];
            hole_slot.psl = shifted_psl;
            hole_slot.key.write(shifted_key);
            hole_slot.value.write(shifted_value);

            hole = next;
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
            if slot.psl != EMPTY_BUCKET {
                slot.psl = EMPTY_BUCKET;
                unsafe {
                    slot.key.assume_init_drop();
                    slot.value.assume_init_drop();
                }
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
            if slot.psl != EMPTY_BUCKET {
                let key = unsafe { slot.key.assume_init_ref() };
                let value = unsafe { slot.value.assume_init_ref() };
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
        self.max_psl = psl_bound(n);

        let old_buckets = std::mem::replace(&mut self.buckets, Self::new_bucket_array(n));
        for slot in old_buckets {
            if slot.psl != EMPTY_BUCKET {
                let key = unsafe { slot.key.assume_init_read() };
                let value = unsafe { slot.value.assume_init_read() };
                self.insert_displaced(key, value);
            }
        }
    }
}

impl<K: Eq, V, H: Hasher<K>> Default for RobinHood<K, V, H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deinitializes only the occupied slots and skips the free ones.
impl<K: Eq, V, H: Hasher<K>> Drop for RobinHood<K, V, H> {
    fn drop(&mut self) {
        for slot in &mut self.buckets {
            if slot.psl != EMPTY_BUCKET {
                unsafe {
                    slot.key.assume_init_drop();
                    slot.value.assume_init_drop();
                }
            }
        }
    }
}

impl<K: Eq + Clone, V: Clone, H: Hasher<K>> Clone for RobinHood<K, V, H> {
    fn clone(&self) -> Self {
        let buckets = self
            .buckets
            .iter()
            .map(|slot| {
                if slot.psl != EMPTY_BUCKET {
                    Slot {
                        psl: slot.psl,
                        key: MaybeUninit::new(unsafe { slot.key.assume_init_ref() }.clone()),
                        value: MaybeUninit::new(unsafe { slot.value.assume_init_ref() }.clone()),
                    }
                } else {
                    Slot {
                        psl: EMPTY_BUCKET,
                        key: MaybeUninit::uninit(),
                        value: MaybeUninit::uninit(),
                    }
                }
            })
            .collect();

        Self {
            buckets,
            hasher: self.hasher.clone(),
            length: self.length,
            cap_minus_1: self.cap_minus_1,
            next_resize: self.next_resize,
            max_psl: self.max_psl,
            max_load: self.max_load,
        }
    }
}

impl<K, V, H> Debug for RobinHood<K, V, H>
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

impl<K: Eq, V, H: Hasher<K>> Map<K, V> for RobinHood<K, V, H> {
    fn get(&self, key: &K) -> Option<&V> {
        RobinHood::get(self, key)
    }
    fn put(&mut self, key: K, value: V) -> bool {
        RobinHood::put(self, key, value)
    }
    fn remove(&mut self, key: &K) -> bool {
        RobinHood::remove(self, key)
    }
    fn len(&self) -> usize {
        RobinHood::len(self)
    }
    fn load_factor(&self) -> f32 {
        RobinHood::load_factor(self)
    }
    fn reserve(&mut self, n: usize) {
        RobinHood::reserve(self, n)
    }
    fn clear(&mut self) {
        RobinHood::clear(self)
    }
    fn set_max_load(&mut self, ratio: f32) -> Result<(), MapError> {
        RobinHood::set_max_load(self, ratio)
    }
    fn each(&self, visitor: &mut dyn FnMut(&K, &V) -> bool) {
        RobinHood::each(self, |key, value| visitor(key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashmaps_testing::{generate_cross_check_str_tests, generate_cross_check_tests};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    generate_cross_check_tests!(RobinHood, u8, u16, u32, i32, u64, i64, u128);
    generate_cross_check_str_tests!(RobinHood);

    /// Re-derive every slot's home index and check the PSL bookkeeping against it.
    fn check_psl_invariants(table: &RobinHood<u64, u64>) {
        let capacity = table.cap_minus_1 + 1;
        for (idx, slot) in table.buckets.iter().enumerate() {
            if slot.psl == EMPTY_BUCKET {
                continue;
            }

            assert!(
                slot.psl <= table.max_psl,
                "slot {} exceeds the PSL ceiling: {} > {}",
                idx,
                slot.psl,
                table.max_psl
            );

            let key = unsafe { slot.key.assume_init_ref() };
            let home = table.hasher.hash(key) as usize & table.cap_minus_1;
            assert_eq!(
                (home + slot.psl as usize) & table.cap_minus_1,
                idx,
                "slot {} PSL {} does not lead back to home {} (capacity {})",
                idx,
                slot.psl,
                home,
                capacity
            );
        }
    }

    #[test]
    fn test_put_get_remove_scenario() {
        let mut table = RobinHood::<u64, u64>::new();
        assert_eq!(table.len(), 0);

        assert!(table.put(5, 5));
        assert_eq!(table.len(), 1);
        assert!(!table.put(5, 5));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&5), Some(&5));

        assert!(table.remove(&5));
        assert_eq!(table.len(), 0);
        assert!(!table.remove(&5));
        assert_eq!(table.get(&5), None);
    }

    #[test]
    fn test_psl_stays_bounded_under_random_churn() {
        let mut rng = ChaCha20Rng::from_os_rng();
        let mut table = RobinHood::<u64, u64>::new();

        for _ in 0..10_000 {
            let key = rng.random_range(0..4096_u64);
            if rng.random_range(0..3_u8) < 2 {
                table.put(key, key);
            } else {
                table.remove(&key);
            }
        }

        check_psl_invariants(&table);
    }

    #[test]
    fn test_back_shift_restores_psl_distribution() {
        let mut table = RobinHood::<u64, u64>::new();
        for i in 0..500 {
            table.put(i, i);
        }
        for i in (0..500).step_by(3) {
            assert!(table.remove(&i));
        }

        check_psl_invariants(&table);
        for i in 0..500 {
            if i % 3 == 0 {
                assert_eq!(table.get(&i), None);
            } else {
                assert_eq!(table.get(&i), Some(&i));
            }
        }
    }

    #[test]
    fn test_growth_keeps_all_entries() {
        let mut table = RobinHood::<u64, u64>::new();
        for i in 0..1000 {
            assert!(table.put(i, i * 2));
        }
        assert_eq!(table.len(), 1000);
        for i in 0..1000 {
            assert_eq!(table.get(&i), Some(&(i * 2)));
        }
        check_psl_invariants(&table);
    }

    #[test]
    fn test_load_factor_stays_below_threshold() {
        let mut table = RobinHood::<u64, u64>::new();
        for i in 0..1000 {
            table.put(i, i);
            assert!(table.load_factor() < 1.0);
        }
    }

    #[test]
    fn test_clear_drops_owned_values() {
        let mut table = RobinHood::<u64, String>::new();
        for i in 0..100 {
            table.put(i, format!("value {}", i));
        }

        table.clear();
        assert_eq!(table.len(), 0);
        assert_eq!(table.get(&1), None);

        assert!(table.put(1, "fresh".to_string()));
        assert_eq!(table.get(&1).map(String::as_str), Some("fresh"));
    }

    #[test]
    fn test_copy_is_independent() {
        let mut original = RobinHood::<u64, String>::new();
        for i in 0..10 {
            original.put(i, format!("{}", i));
        }

        let mut copy = original.clone();
        copy.put(1, "changed".to_string());
        copy.remove(&5);

        assert_eq!(original.get(&1).map(String::as_str), Some("1"));
        assert_eq!(original.get(&5).map(String::as_str), Some("5"));
        assert_eq!(copy.get(&1).map(String::as_str), Some("changed"));
        assert_eq!(copy.get(&5), None);
    }

    #[test]
    fn test_each_visits_every_entry_once() {
        let mut table = RobinHood::<u64, u64>::new();
        for i in 0..100 {
            table.put(i, i);
        }

        let mut seen = vec![false; 100];
        table.each(|key, value| {
            assert_eq!(key, value);
            assert!(!seen[*key as usize], "key {} visited twice", key);
            seen[*key as usize] = true;
            false
        });
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_each_stops_early() {
        let mut table = RobinHood::<u64, u64>::new();
        for i in 0..100 {
            table.put(i, i);
        }

        let mut visited = 0;
        table.each(|_, _| {
            visited += 1;
            visited == 10
        });
        assert_eq!(visited, 10);
    }

    #[test]
    fn test_reserve_is_monotonic() {
        let mut table = RobinHood::<u64, u64>::new();
        for i in 0..50 {
            table.put(i, i);
        }

        table.reserve(1000);
        let load_after = table.load_factor();
        table.reserve(10);
        assert_eq!(table.load_factor(), load_after);
        for i in 0..50 {
            assert_eq!(table.get(&i), Some(&i));
        }
    }

    #[test]
    fn test_max_load_validation() {
        let mut table = RobinHood::<u64, u64>::new();
        assert!(table.set_max_load(0.9).is_ok());
        assert_eq!(
            table.set_max_load(0.0),
            Err(MapError::LoadFactorOutOfRange(0.0))
        );
        assert_eq!(
            table.set_max_load(1.0),
            Err(MapError::LoadFactorOutOfRange(1.0))
        );
        assert!(table.set_max_load(2.0).is_err());
    }
}
