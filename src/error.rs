//! Errors surfaced by the generation side of both pipelines.
//!
//! The declaration parser never fails; everything here comes from loading rule
//! documents, reading inputs, or rendering code from JSON.
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Top-level JSON must be an object")]
    InvalidShape,

    #[error("Unknown language rule: {0}")]
    UnknownRule(String),

    /// The rule document did not deserialize; `path` is the JSON path of the offending node.
    #[error("malformed rule document at {path}: {message}")]
    RuleDocument { path: String, message: String },

    #[error("dialect '{dialect}': invalid pattern `{pattern}`")]
    InvalidPattern {
        dialect: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("dialect '{dialect}': {message}")]
    InvalidRule { dialect: String, message: String },

    #[error("failed to read '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON pointer `{0}` did not match any node")]
    PointerMiss(String),

    #[error("jq: {0}")]
    Jq(String),
}

impl Error {
    pub(crate) fn invalid_rule(dialect: &str, message: impl Into<String>) -> Self {
        Self::InvalidRule {
            dialect: dialect.to_string(),
            message: message.into(),
        }
    }
}
