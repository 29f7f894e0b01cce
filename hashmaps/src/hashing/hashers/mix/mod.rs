//! Implements the default hasher based on the bit-mixing finalizers (hence Mix).
mod core;
pub use self::core::*;
mod int;
pub use self::int::*;
mod string;
pub use self::string::*;
