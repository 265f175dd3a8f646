//! Errors produced while decoding a PLY scene.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during PLY decoding.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed PLY header at line {line}: {message}")]
    MalformedHeader { line: usize, message: String },

    #[error("Unsupported PLY schema: {0}")]
    UnsupportedSchema(String),

    #[error("Invalid SH layout: {rest_count} f_rest properties is not a multiple of 3")]
    InvalidShLayout { rest_count: usize },

    #[error("Truncated vertex data: expected {expected} bytes, found {available}")]
    TruncatedData { expected: usize, available: usize },

    #[error("Import cancelled")]
    Cancelled,
}

impl DecodeError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        DecodeError::MalformedHeader {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        DecodeError::UnsupportedSchema(message.into())
    }

    /// The category of this error, for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::Io(_) => ErrorKind::Io,
            DecodeError::MalformedHeader { .. } => ErrorKind::MalformedHeader,
            DecodeError::UnsupportedSchema(_) => ErrorKind::UnsupportedSchema,
            DecodeError::InvalidShLayout { .. } => ErrorKind::InvalidShLayout,
            DecodeError::TruncatedData { .. } => ErrorKind::TruncatedData,
            DecodeError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Error category without the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Io,
    MalformedHeader,
    UnsupportedSchema,
    InvalidShLayout,
    TruncatedData,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Io => "io",
            ErrorKind::MalformedHeader => "malformed_header",
            ErrorKind::UnsupportedSchema => "unsupported_schema",
            ErrorKind::InvalidShLayout => "invalid_sh_layout",
            ErrorKind::TruncatedData => "truncated_data",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
