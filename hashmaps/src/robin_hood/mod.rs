//! The Robin Hood probing table engine.
mod core;
pub use self::core::*;
