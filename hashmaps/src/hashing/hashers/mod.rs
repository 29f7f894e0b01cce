//! Ready-made [`Hasher`](hashmaps_core::Hasher) implementations for common key types.
mod mix;
pub use mix::*;
#[cfg(feature = "xxh3")]
mod xxh3;
#[cfg(feature = "xxh3")]
pub use xxh3::*;
