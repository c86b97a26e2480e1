//! VM error types

use crate::value::Value;
use thiserror::Error;

/// VM execution errors
#[derive(Debug, Error)]
pub enum VmError {
    /// Type error (e.g., calling non-function)
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Range error (e.g., invalid array length)
    #[error("RangeError: {0}")]
    RangeError(String),

    /// Syntax error (invalid pattern or flags)
    #[error("SyntaxError: {0}")]
    SyntaxError(String),

    /// Internal error
    #[error("InternalError: {0}")]
    InternalError(String),

    /// Native call depth exceeded
    #[error("RangeError: Maximum call stack size exceeded")]
    StackOverflow,

    /// Thrown JS exception
    #[error("Uncaught exception: {0}")]
    Exception(Box<ThrownValue>),
}

/// A thrown JavaScript value
#[derive(Debug)]
pub struct ThrownValue {
    /// The thrown value
    pub value: Value,
    /// The thrown value (as a string representation)
    pub message: String,
}

impl std::fmt::Display for ThrownValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl VmError {
    /// Create a type error
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a range error
    pub fn range_error(msg: impl Into<String>) -> Self {
        Self::RangeError(msg.into())
    }

    /// Create a syntax error
    pub fn syntax_error(msg: impl Into<String>) -> Self {
        Self::SyntaxError(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Create an exception from a thrown JS value
    pub fn exception(value: Value) -> Self {
        let message = value.to_display_string();
        Self::Exception(Box::new(ThrownValue { value, message }))
    }

    /// The thrown value, if this error carries one
    pub fn thrown_value(&self) -> Option<&Value> {
        match self {
            Self::Exception(thrown) => Some(&thrown.value),
            _ => None,
        }
    }

    /// Check whether this is a TypeError
    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::TypeError(_))
    }
}

/// Result type for VM operations
pub type VmResult<T> = Result<T, VmError>;
