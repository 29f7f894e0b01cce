//! The separate chaining table engine.
mod core;
pub use self::core::*;
