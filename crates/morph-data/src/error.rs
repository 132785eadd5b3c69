//! Error types for CSV and SQL marshaling

use morph_core::CoerceError;
use thiserror::Error;

/// CSV import/export errors.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Malformed CSV input or writer failure
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    /// Reading or writing the underlying stream failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A field failed to convert under [`FieldPolicy::Abort`](crate::FieldPolicy::Abort)
    #[error("line {line}, column '{column}': {source}")]
    Field {
        /// 1-based input line
        line: u64,
        /// Member the column maps to
        column: String,
        /// Underlying conversion failure
        #[source]
        source: CoerceError,
    },

    /// Conversion outside a single field (defaults, record extraction)
    #[error(transparent)]
    Coerce(#[from] CoerceError),

    /// The target type has no members to map columns onto
    #[error("{0} is not a struct type")]
    NotAStruct(String),

    /// The configured delimiter is not a single ASCII character
    #[error("invalid delimiter {0:?}: expected an ASCII character")]
    InvalidDelimiter(char),
}

/// Result type for CSV operations
pub type CsvResult<T> = Result<T, CsvError>;

/// SQL client errors.
#[derive(Debug, Error)]
pub enum SqlError {
    /// SQLite driver error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A column value could not be converted to or from a member
    #[error(transparent)]
    Coerce(#[from] CoerceError),

    /// Column name not declared by the entity
    #[error("table '{table}' has no column '{column}'")]
    UnknownColumn {
        /// Entity table
        table: String,
        /// Offending column
        column: String,
    },

    /// Entity type is not a struct
    #[error("{0} is not a struct type")]
    NotAnEntity(String),

    /// Value has no SQL representation
    #[error("cannot bind {0} as a SQL parameter")]
    UnsupportedParameter(String),

    /// Absent value (null or NaN) for a column declared `NOT NULL`
    #[error("column '{column}' of table '{table}' cannot store an absent value")]
    AbsentValue {
        /// Entity table
        table: String,
        /// Column name
        column: String,
    },

    /// Aggregate or scalar query produced no row
    #[error("query returned no rows")]
    NoRows,
}

/// Result type for SQL operations
pub type SqlResult<T> = Result<T, SqlError>;

#[cfg(test)]
mod tests {
    use super::*;
    use morph_core::Value;

    #[test]
    fn test_error_messages() {
        let err = SqlError::UnknownColumn {
            table: "orders".into(),
            column: "nope".into(),
        };
        assert_eq!(err.to_string(), "table 'orders' has no column 'nope'");
        let err = SqlError::AbsentValue {
            table: "orders".into(),
            column: "price".into(),
        };
        assert_eq!(
            err.to_string(),
            "column 'price' of table 'orders' cannot store an absent value"
        );
        assert_eq!(
            CsvError::InvalidDelimiter('§').to_string(),
            "invalid delimiter '§': expected an ASCII character"
        );
    }

    #[test]
    fn test_field_error_keeps_source() {
        let err = CsvError::Field {
            line: 3,
            column: "qty".into(),
            source: CoerceError::conversion_named(&Value::String("abc".into()), "u8"),
        };
        assert!(err.to_string().starts_with("line 3, column 'qty': "));
        assert!(std::error::Error::source(&err).is_some());
    }
}
