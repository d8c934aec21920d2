// cloudscan_core/src/error.rs

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// What was wrong with a settings field's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    NotAnObject,
    ExpectedBool,
    ExpectedNumber,
    ExpectedString,
}

impl fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaErrorKind::NotAnObject => write!(f, "must be an object"),
            SchemaErrorKind::ExpectedBool => write!(f, "must be a boolean"),
            SchemaErrorKind::ExpectedNumber => write!(f, "must be a number"),
            SchemaErrorKind::ExpectedString => write!(f, "must be a string"),
        }
    }
}

/// Errors raised while loading a `LaserScanConfig`.
///
/// None of them leave a partially-populated configuration behind.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings source is not well-formed JSON (or TOML).
    #[error("failed to parse config at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// A recognized field has the wrong primitive type, or the settings
    /// section is not an object.
    #[error("{field} {kind}")]
    Schema {
        field: &'static str,
        kind: SchemaErrorKind,
    },

    /// A field is well-typed but its value cannot drive a projection.
    #[error("{field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    /// The settings field this error is about, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ConfigError::Schema { field, .. } | ConfigError::Invalid { field, .. } => Some(*field),
            ConfigError::Io { .. } | ConfigError::Syntax { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Syntax {
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        }
    }
}
