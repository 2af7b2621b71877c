use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Operand shapes violate an operation's precondition.
    DimensionMismatch(String),
    /// Degenerate layer widths or a buffer that does not match its declared shape.
    InvalidShape(String),
    InvalidConfig(String),
    /// `backprop` was called without a pending `forward` result.
    InvalidState(String),
    /// Raised by the training driver only, when the caller asked it to abort on NaN.
    NumericAnomaly(String),
    Io(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DimensionMismatch(msg) => write!(f, "dimension mismatch: {msg}"),
            Error::InvalidShape(msg) => write!(f, "invalid shape: {msg}"),
            Error::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Error::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            Error::NumericAnomaly(msg) => write!(f, "numeric anomaly: {msg}"),
            Error::Io(msg) => write!(f, "io error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
