//! Implements an alternative hasher backed by the XXH3 algorithm.
//!
//! Available behind the `xxh3` feature. Slower than [`MixHasher`](super::MixHasher) for short
//! integer keys but considerably stronger on long byte strings.

use hashmaps_core::Hasher;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use xxhash_rust::xxh3::xxh3_64;

/// Hasher backed by the 64-bit XXH3 hash function.
pub struct Xxh3Hasher<K: ?Sized> {
    key_type: PhantomData<fn(&K)>,
}

impl<K: ?Sized> Default for Xxh3Hasher<K> {
    fn default() -> Self {
        Self {
            key_type: PhantomData,
        }
    }
}

impl<K: ?Sized> Clone for Xxh3Hasher<K> {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl<K: ?Sized> Copy for Xxh3Hasher<K> {}

impl<K: ?Sized> Debug for Xxh3Hasher<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Xxh3Hasher").finish()
    }
}

macro_rules! impl_xxh3_hasher_int {
    ($($type:ty),*) => {
        $(
            impl Hasher<$type> for Xxh3Hasher<$type> {
                #[inline]
                fn hash(&self, key: &$type) -> u64 {
                    xxh3_64(&key.to_le_bytes())
                }
            }
        )*
    };
}

impl_xxh3_hasher_int!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, usize, isize);

impl Hasher<String> for Xxh3Hasher<String> {
    #[inline]
    fn hash(&self, key: &String) -> u64 {
        xxh3_64(key.as_bytes())
    }
}

impl<'a> Hasher<&'a str> for Xxh3Hasher<&'a str> {
    #[inline]
    fn hash(&self, key: &&'a str) -> u64 {
        xxh3_64(key.as_bytes())
    }
}

impl Hasher<Vec<u8>> for Xxh3Hasher<Vec<u8>> {
    #[inline]
    fn hash(&self, key: &Vec<u8>) -> u64 {
        xxh3_64(key.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let hasher = Xxh3Hasher::<u64>::default();
        assert_eq!(hasher.hash(&42), hasher.hash(&42));

        let hasher = Xxh3Hasher::<String>::default();
        assert_eq!(hasher.hash(&"key".to_string()), hasher.hash(&"key".to_string()));
    }

    #[test]
    fn test_distinct_keys_differ() {
        let hasher = Xxh3Hasher::<u64>::default();
        assert_ne!(hasher.hash(&1), hasher.hash(&2));
    }
}
