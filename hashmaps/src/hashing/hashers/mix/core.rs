use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

/// The default hasher for primitive and string key types.
///
/// Stateless: fixed-width integer keys go through the MurmurHash3 finalizers, byte-string keys
/// through a widened FNV-1a round (see [`crate::hashing::mix`]). Every supported key type has
/// its own [`Hasher`](hashmaps_core::Hasher) impl, so the choice of mixing routine is resolved
/// at compile time.
///
/// Floating-point keys are intentionally unsupported: the table engines require `K: Eq`. Hash
/// floats by keying on `f64::to_bits` instead.
pub struct MixHasher<K: ?Sized> {
    pub(super) key_type: PhantomData<fn(&K)>,
}

impl<K: ?Sized> Default for MixHasher<K> {
    fn default() -> Self {
        Self {
            key_type: PhantomData,
        }
    }
}

impl<K: ?Sized> Clone for MixHasher<K> {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl<K: ?Sized> Copy for MixHasher<K> {}

impl<K: ?Sized> Debug for MixHasher<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixHasher").finish()
    }
}
