//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent business rule violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid IP address: {0:?} (expected dotted quad, e.g. 192.168.1.20)")]
    InvalidIpAddress(String),

    #[error("invalid device serial: {0:?}")]
    InvalidSerial(String),
}
