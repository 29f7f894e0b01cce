//! Implements [`Hasher`] for string and byte-string key types.

use super::core::MixHasher;
use crate::hashing::mix::mix_bytes;
use hashmaps_core::Hasher;

impl Hasher<String> for MixHasher<String> {
    #[inline]
    fn hash(&self, key: &String) -> u64 {
        mix_bytes(key.as_bytes())
    }
}

impl<'a> Hasher<&'a str> for MixHasher<&'a str> {
    #[inline]
    fn hash(&self, key: &&'a str) -> u64 {
        mix_bytes(key.as_bytes())
    }
}

impl Hasher<Vec<u8>> for MixHasher<Vec<u8>> {
    #[inline]
    fn hash(&self, key: &Vec<u8>) -> u64 {
        mix_bytes(key.as_slice())
    }
}

impl<'a> Hasher<&'a [u8]> for MixHasher<&'a [u8]> {
    #[inline]
    fn hash(&self, key: &&'a [u8]) -> u64 {
        mix_bytes(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_and_string_agree() {
        let str_hasher = MixHasher::<&str>::default();
        let string_hasher = MixHasher::<String>::default();
        for key in ["", "a", "key", "a somewhat longer key value"] {
            assert_eq!(str_hasher.hash(&key), string_hasher.hash(&key.to_string()));
        }
    }

    #[test]
    fn test_prefixes_do_not_collide() {
        let hasher = MixHasher::<&str>::default();
        assert_ne!(hasher.hash(&"abc"), hasher.hash(&"abcd"));
        assert_ne!(hasher.hash(&"abcd"), hasher.hash(&"abcde"));
    }
}
