//! Hash functions and the hashers built on top of them.
pub mod hashers;
pub mod mix;
