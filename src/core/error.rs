use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    #[error("malformed projection record: period {period:?} is not MM/YYYY")]
    MalformedRecord { period: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("index {index} out of range for series of length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("percentage change from zero to a non-zero value is undefined")]
    DivisionByZero,
    #[error("decimal arithmetic overflow")]
    Overflow,
}
