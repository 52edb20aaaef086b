//! Errors raised while constructing shared value types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid decimal string: {0:?}")]
    InvalidDecimal(String),

    #[error("expected a positive decimal, got {0}")]
    NotPositive(String),

    #[error("expected a non-negative decimal, got {0}")]
    Negative(String),

    #[error("decimal overflow")]
    DecimalOverflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("timestamp overflow")]
    TimestampOverflow,
}
