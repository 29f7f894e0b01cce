//! The hopscotch table engine.
mod bucket;
mod core;
pub use self::core::*;
