//! Error types for offset-engine operations.
//!
//! Detection itself never fails; these errors only arise while building an
//! [`ActivityHistogram`](crate::histogram::ActivityHistogram) from untrusted input.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistogramError {
    #[error("Invalid bucket: {0} (expected a multiple of 0.5 in [0, 24))")]
    InvalidBucket(f64),

    #[error("Invalid bucket key: {0:?}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, HistogramError>;
