#![allow(dead_code)]

pub mod generate;
pub use generate::*;

pub mod cross_check;
pub use cross_check::*;
