//! Error types for coercion, construction and delegate adaptation

use crate::shape::TypeHandle;
use crate::value::Value;

/// Result type for coercion and construction
pub type CoerceResult<T> = Result<T, CoerceError>;

/// Result type for adapted (uniform) callables
pub type AdaptResult<T> = Result<T, AdaptError>;

/// Errors raised by the value coercer and the instance factory
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoerceError {
    /// A value could not be converted to the requested type
    #[error("Cannot convert {from} value '{value}' to {to}")]
    TypeConversion {
        /// Runtime type of the source value ("null" for absent values)
        from: String,
        /// Requested target type
        to: String,
        /// Rendered source value
        value: String,
    },

    /// No constructor matches the supplied arguments
    #[error("No constructor of {ty} accepts ({})", .args.join(", "))]
    UnsupportedConstruction {
        /// Type that was asked to construct
        ty: String,
        /// Runtime types of the supplied arguments
        args: Vec<String>,
    },

    /// The type declares no member with this name
    #[error("{ty} has no member '{member}'")]
    UnknownMember {
        /// Owning type
        ty: String,
        /// Requested member name
        member: String,
    },

    /// The member exists but cannot be assigned
    #[error("Member '{member}' of {ty} is read-only")]
    ReadOnlyMember {
        /// Owning type
        ty: String,
        /// Member name
        member: String,
    },
}

impl CoerceError {
    /// Build a `TypeConversion` error for `value` and `target`.
    pub fn conversion(value: &Value, target: &TypeHandle) -> Self {
        CoerceError::TypeConversion {
            from: value.type_name(),
            to: target.to_string(),
            value: value.to_string(),
        }
    }

    /// Build a `TypeConversion` error from raw names.
    pub fn conversion_named(value: &Value, target: impl Into<String>) -> Self {
        CoerceError::TypeConversion {
            from: value.type_name(),
            to: target.into(),
            value: value.to_string(),
        }
    }
}

/// Errors raised by adapted callables
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdaptError {
    /// Fewer arguments than declared parameters (or no argument list at all)
    #[error("Expected {expected} arguments, got {}", .got.map_or_else(|| "none".to_string(), |n| n.to_string()))]
    ArgumentCount {
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count, `None` when the list was absent
        got: Option<usize>,
    },

    /// A positional argument could not be coerced to its parameter type
    #[error("Argument {index}: cannot convert {from} to {to}")]
    ArgumentConversion {
        /// Zero-based parameter index
        index: usize,
        /// Runtime type of the supplied argument
        from: String,
        /// Declared parameter type
        to: String,
        /// Underlying coercion failure
        #[source]
        source: CoerceError,
    },

    /// The callable returned a value of an unexpected type
    #[error("Return value mismatch: {0}")]
    ReturnConversion(#[source] CoerceError),

    /// No callable is registered under this name
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// The callable itself reported a failure
    #[error("{0}")]
    Failed(String),
}

impl From<String> for AdaptError {
    fn from(s: String) -> Self {
        AdaptError::Failed(s)
    }
}

impl From<&str> for AdaptError {
    fn from(s: &str) -> Self {
        AdaptError::Failed(s.to_string())
    }
}
