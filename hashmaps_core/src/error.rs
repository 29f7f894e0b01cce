//! Error definitions.
use thiserror::Error;

/// Project-wise error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    /// Occurs when a maximum load factor outside the open interval (0, 1) is requested. An open
    /// addressing table must keep at least one empty slot for probes to terminate, so 1.0 is as
    /// invalid as 0.0.
    #[error("load factor {0} is outside the open interval (0, 1)")]
    LoadFactorOutOfRange(f32),
}
