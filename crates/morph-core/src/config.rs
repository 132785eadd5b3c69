//! Coercion options
//!
//! Loaded from TOML; every key is optional.
//!
//! ```toml
//! decimal_comma_fallback = false
//! enum_fallback = true
//! date_formats = ["%d/%m/%Y"]
//! true_literals = ["true", "1", "yes", "on"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options controlling the lenient parts of the coercion ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoerceOptions {
    /// Retry failed numeric text parses with a decimal comma (`"3,5"`).
    pub decimal_comma_fallback: bool,

    /// Resolve unknown enum input to the zero variant instead of failing.
    pub enum_fallback: bool,

    /// Trim surrounding whitespace from text before parsing.
    pub trim_strings: bool,

    /// Extra `chrono` formats for dates, tried after ISO-8601.
    pub date_formats: Vec<String>,

    /// Extra `chrono` formats for date-times, tried after ISO-8601.
    pub datetime_formats: Vec<String>,

    /// Text accepted as `true` (case-insensitive).
    pub true_literals: Vec<String>,

    /// Text accepted as `false` (case-insensitive).
    pub false_literals: Vec<String>,
}

impl Default for CoerceOptions {
    fn default() -> Self {
        CoerceOptions {
            decimal_comma_fallback: true,
            enum_fallback: true,
            trim_strings: true,
            date_formats: Vec::new(),
            datetime_formats: Vec::new(),
            true_literals: vec!["true".into(), "1".into(), "yes".into()],
            false_literals: vec!["false".into(), "0".into(), "no".into()],
        }
    }
}

impl CoerceOptions {
    /// Parse options from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load options from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
