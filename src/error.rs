use thiserror::Error;

/// Custom Result type for qomdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for qomdb
///
/// Compiler errors (`InvalidArgument` through `ParameterCountMismatch`) are
/// fatal and never retried; they indicate a malformed query object or an
/// internal compiler bug. `Sql` carries the driver's error text verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed caller input, e.g. a row without a `uid` on update
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// An operator that cannot be compiled in its current position,
    /// e.g. a relational operator combined with a null bound value
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),
    /// An ordering direction the compiler cannot emit
    #[error("unsupported order: {0}")]
    UnsupportedOrder(String),
    /// A comparison whose second operand is not a bound variable
    #[error("unsupported operand type: {0}")]
    UnsupportedOperandType(String),
    /// Placeholder markers and the parameter list disagree; an internal
    /// compiler bug, treated as an assertion failure
    #[error("placeholder count {placeholders} does not match parameter count {parameters}")]
    ParameterCountMismatch {
        placeholders: usize,
        parameters: usize,
    },
    /// Driver-reported failure after statement execution
    #[error("sql error: {0}")]
    Sql(String),
    /// SQL dialect parsing error (embedded reference handle)
    #[error("parse error: {0}")]
    Parse(String),
    /// Internal error (storage, serialization, etc.)
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::num::ParseIntError> for Error {
    fn from(value: std::num::ParseIntError) -> Self {
        Error::Parse(value.to_string())
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(value: std::num::ParseFloatError) -> Self {
        Error::Parse(value.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for Error {
    fn from(value: Box<bincode::ErrorKind>) -> Self {
        Error::Internal(value.to_string())
    }
}
