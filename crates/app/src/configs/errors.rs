//! Delivery configuration errors.

use thiserror::Error;

/// Configuration service error variants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigsServiceError {
    /// The free-delivery minimum must not be negative.
    #[error("free-delivery minimum must not be negative")]
    NegativeMinimum,
}
