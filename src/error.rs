//! Error types for the schema registry, dispatcher and event log

use std::path::PathBuf;

use thiserror::Error;

/// Result type for registry and validation operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Registry, dispatch and validation errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema {}: {reason}", .path.display())]
    SchemaLoad { path: PathBuf, reason: String },

    #[error("{}Invalid JSON: {source}", line_prefix(.line))]
    Decode {
        line: Option<usize>,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Unknown kind: {0}")]
    UnknownKind(String),

    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    #[error("Invalid schema {name}: {message}")]
    InvalidSchema { name: String, message: String },

    #[error("{}{message} (at {location})", line_prefix(.line))]
    Validation {
        line: Option<usize>,
        message: String,
        location: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    /// Whether the input document itself was rejected, as opposed to the
    /// registry, filesystem or configuration failing around it.
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            SchemaError::Decode { .. }
                | SchemaError::MissingField { .. }
                | SchemaError::UnknownKind(_)
                | SchemaError::SchemaNotFound(_)
                | SchemaError::Validation { .. }
        )
    }

    /// The 1-based line a sequence error is pinned to, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            SchemaError::Decode { line, .. } | SchemaError::Validation { line, .. } => *line,
            _ => None,
        }
    }

    /// Pin a decode or validation error to a line of a multi-record input.
    pub(crate) fn at_line(self, line_no: usize) -> Self {
        match self {
            SchemaError::Decode { source, .. } => SchemaError::Decode {
                line: Some(line_no),
                source,
            },
            SchemaError::Validation {
                message, location, ..
            } => SchemaError::Validation {
                line: Some(line_no),
                message,
                location,
            },
            other => other,
        }
    }
}

fn line_prefix(line: &Option<usize>) -> String {
    match line {
        Some(n) => format!("Line {}: ", n),
        None => String::new(),
    }
}
