use thiserror::Error;

/// Crate specific Errors implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Expression is structurally broken: wrong number of fields or an
    /// empty token.
    #[error("invalid cron expression: {0}")]
    Parse(String),
    /// Field position outside of 0..=4.
    #[error("invalid field position: {0}")]
    InvalidField(usize),
    /// Token rejected by its field's validator.
    #[error("invalid value {token:?} for field at position {position}")]
    InvalidValue {
        /// Position of the offending field within the expression.
        position: usize,
        /// The offending token.
        token: String,
    },
    /// Range bounds outside of the field's value range, or decreasing.
    #[error("range out of bounds: {0}")]
    OutOfRange(String),
    /// Search exhausted the iteration cap without finding a run date.
    #[error("impossible cron expression, no run date found within {0} iterations")]
    Infeasible(usize),
    /// Malformed day-of-week hash token.
    #[error("invalid hash token: {0}")]
    InvalidHash(String),
    /// Unrecognized instant string.
    #[error("invalid instant: {0}")]
    InvalidInstant(String),
    /// Unknown timezone name.
    #[error("unknown timezone: {0}")]
    UnknownTimeZone(String),
    /// Job store failure.
    #[error("store error: {0}")]
    Store(String),
}
