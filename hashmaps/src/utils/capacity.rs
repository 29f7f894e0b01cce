//! Capacity arithmetic shared by all table engines.
//!
//! Every engine keeps its bucket count at a power of two and stores it as `capacity - 1`, so a
//! hash value is reduced to a bucket index with a single bitwise AND.

/// The bucket count every table starts with.
pub const DEFAULT_CAPACITY: usize = 4;

/// The maximum load factor the open addressing engines start with.
pub const DEFAULT_MAX_LOAD: f32 = 0.7;

/// Compute the smallest power-of-two capacity that holds `n` entries under `max_load`.
///
/// Never returns less than [`DEFAULT_CAPACITY`].
#[inline]
pub fn capacity_for(n: usize, max_load: f32) -> usize {
    let needed = (n as f32 / max_load) as usize;
    needed.next_power_of_two().max(DEFAULT_CAPACITY)
}

/// Compute the entry count at which a table of `capacity` buckets must grow.
#[inline]
pub fn growth_threshold(capacity: usize, max_load: f32) -> usize {
    (capacity as f32 * max_load) as usize
}

/// Check that `ratio` is a usable maximum load factor.
///
/// The open interval (0, 1): a table that may fill up completely cannot terminate unsuccessful
/// probes.
#[inline]
pub fn valid_max_load(ratio: f32) -> bool {
    ratio > 0.0 && ratio < 1.0
}
