//! Four interchangeable hash-table engines with a uniform operation set.
//!
//! Each engine trades worst-case lookup cost, memory overhead and cache behavior differently:
//!
//! - [`chained::Chained`] - separate chaining, the baseline with the simplest invariants.
//! - [`linear::Linear`] - flat open addressing with an empty-sentinel key and backward-shift
//!   deletion.
//! - [`robin_hood::RobinHood`] - open addressing with probe-sequence-length based eviction.
//! - [`hopscotch::Hopscotch`] - open addressing with a bounded bitmap neighborhood and
//!   worst-case constant-time lookup.
//!
//! All engines implement [`hashmaps_core::Map`] and take a [`hashmaps_core::Hasher`]
//! as a generic parameter, defaulting to [`hashing::hashers::MixHasher`].

pub mod chained;
pub mod factory;
pub mod hashing;
pub mod hopscotch;
pub mod linear;
pub mod robin_hood;
pub mod utils;
