use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Invalid decimal: {0}")]
    InvalidDecimal(String),
    #[error("Decimal overflow")]
    DecimalOverflow,
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid denom: {0}")]
    InvalidDenom(String),
    #[error("Invalid share {name}: {share}")]
    InvalidShare { name: String, share: String },
    #[error("Invalid epoch info: {0}")]
    InvalidEpochInfo(String),
    #[error("Invalid epoch identifier: {0:?}")]
    InvalidEpochIdentifier(String),
    #[error("Invalid power index key")]
    InvalidPowerIndexKey,
}
