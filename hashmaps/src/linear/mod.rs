//! The linear probing table engine.
mod core;
pub use self::core::*;
