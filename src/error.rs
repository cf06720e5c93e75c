//! Muninn error types

use std::fmt;

/// Status codes carried by classified remote errors.
///
/// Numbered exactly as the transport defines them, so `code as i32`
/// matches what the server sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Code {
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl Code {
    /// The canonical SCREAMING_SNAKE_CASE name for this code.
    pub fn name(&self) -> &'static str {
        match self {
            Code::Cancelled => "CANCELLED",
            Code::Unknown => "UNKNOWN",
            Code::InvalidArgument => "INVALID_ARGUMENT",
            Code::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Code::NotFound => "NOT_FOUND",
            Code::AlreadyExists => "ALREADY_EXISTS",
            Code::PermissionDenied => "PERMISSION_DENIED",
            Code::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Code::FailedPrecondition => "FAILED_PRECONDITION",
            Code::Aborted => "ABORTED",
            Code::OutOfRange => "OUT_OF_RANGE",
            Code::Unimplemented => "UNIMPLEMENTED",
            Code::Internal => "INTERNAL",
            Code::Unavailable => "UNAVAILABLE",
            Code::DataLoss => "DATA_LOSS",
            Code::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Muninn error types.
///
/// `Clone` is required: an in-flight cache entry replays its outcome to
/// every joiner, so error payloads are plain strings.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Classified remote failure with a transport status code.
    #[error("rpc error ({code}): {message}")]
    Rpc { code: Code, message: String },

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("invalid resource name: {0}")]
    InvalidName(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Shorthand for a classified remote error.
    pub fn rpc(code: Code, message: impl Into<String>) -> Self {
        Error::Rpc {
            code,
            message: message.into(),
        }
    }

    /// The status code, if this error is a classified remote failure.
    ///
    /// Local errors (encoding, naming, configuration) have no code and
    /// are handled differently by the middleware chain.
    pub fn code(&self) -> Option<Code> {
        match self {
            Error::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Encoding(err.to_string())
    }
}

/// Result type alias for muninn operations
pub type Result<T> = std::result::Result<T, Error>;
