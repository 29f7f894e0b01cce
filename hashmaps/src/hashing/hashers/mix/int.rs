//! Implements [`Hasher`] for the fixed-width integer key types.

use super::core::MixHasher;
use crate::hashing::mix::{mix32, mix64};
use hashmaps_core::Hasher;

macro_rules! impl_mix_hasher_32 {
    ($($type:ty),*) => {
        $(
            impl Hasher<$type> for MixHasher<$type> {
                #[inline]
                fn hash(&self, key: &$type) -> u64 {
                    mix32(*key as u32) as u64
                }
            }
        )*
    };
}

macro_rules! impl_mix_hasher_64 {
    ($($type:ty),*) => {
        $(
            impl Hasher<$type> for MixHasher<$type> {
                #[inline]
                fn hash(&self, key: &$type) -> u64 {
                    mix64(*key as u64)
                }
            }
        )*
    };
}

macro_rules! impl_mix_hasher_128 {
    ($($type:ty),*) => {
        $(
            impl Hasher<$type> for MixHasher<$type> {
                #[inline]
                fn hash(&self, key: &$type) -> u64 {
                    // Mix the halves separately and fold; feeding the low mix into the high mix
                    // keeps the two halves from cancelling each other out.
                    let low = mix64(*key as u64);
                    mix64((*key >> 64) as u64 ^ low)
                }
            }
        )*
    };
}

impl_mix_hasher_32!(u8, i8, u16, i16, u32, i32);
impl_mix_hasher_64!(u64, i64, usize, isize);
impl_mix_hasher_128!(u128, i128);

#[cfg(test)]
mod tests {
    use super::*;

    fn spread<K: Eq, H: Hasher<K>>(hasher: &H, keys: impl Iterator<Item = K>) -> usize {
        // Number of distinct 8-bit bucket indices hit - a coarse distribution check.
        let mut seen = [false; 256];
        for key in keys {
            seen[(hasher.hash(&key) & 0xff) as usize] = true;
        }
        seen.iter().filter(|&&s| s).count()
    }

    #[test]
    fn test_hash_is_deterministic() {
        let hasher = MixHasher::<u64>::default();
        assert_eq!(hasher.hash(&42), hasher.hash(&42));
        assert_eq!(hasher.hash(&42), hasher.hash(&42));
    }

    #[test]
    fn test_sequential_keys_spread_over_buckets() {
        // Sequential keys are the common worst case for weak mixers; the finalizers must
        // spread them over almost all of the 256 low buckets.
        assert!(spread(&MixHasher::<u32>::default(), 0_u32..1024) > 240);
        assert!(spread(&MixHasher::<u64>::default(), 0_u64..1024) > 240);
        assert!(spread(&MixHasher::<u128>::default(), 0_u128..1024) > 240);
    }

    #[test]
    fn test_sign_does_not_collide_with_magnitude() {
        let hasher = MixHasher::<i64>::default();
        assert_ne!(hasher.hash(&1), hasher.hash(&-1));
        assert_ne!(hasher.hash(&0), hasher.hash(&i64::MIN));
    }

    #[test]
    fn test_128_bit_halves_both_contribute() {
        let hasher = MixHasher::<u128>::default();
        let base = hasher.hash(&0);
        assert_ne!(hasher.hash(&1), base);
        assert_ne!(hasher.hash(&(1_u128 << 64)), base);
        assert_ne!(hasher.hash(&(1_u128 << 64)), hasher.hash(&1));
    }
}
