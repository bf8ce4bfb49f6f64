//! Error types for InboxXorcist

use serde::Serialize;

/// Result type alias using InboxXorcist's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], used to pick the HTTP status and
/// the `error` tag of the response payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The classifier backend failed to initialize at startup
    BackendUnavailable,
    /// The request was rejected before any collaborator ran
    Validation,
    /// A collaborator failed while classifying, parsing, or extracting
    Processing,
}

impl ErrorKind {
    /// Stable tag used in response payloads and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BackendUnavailable => "backend_unavailable",
            Self::Validation => "validation_error",
            Self::Processing => "processing_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request validation failures. Display strings are user-facing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Single text was empty or whitespace-only
    #[error("Email text cannot be empty")]
    EmptyInput,

    /// Batch contained no entries at all
    #[error("Email list cannot be empty")]
    EmptyBatch,

    /// Uploaded archive name does not carry an accepted suffix
    #[error("File must be an MBOX file ({allowed})")]
    UnsupportedFormat { filename: String, allowed: String },

    /// Multipart request carried no file field
    #[error("No MBOX file was uploaded")]
    MissingUpload,

    /// Multipart body could not be read
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),

    /// JSON body was missing, unparsable, or lacked a required field
    #[error("Invalid request body: {0}")]
    MalformedRequest(String),
}

impl ValidationError {
    /// Build an [`ValidationError::UnsupportedFormat`] listing the accepted suffixes
    pub fn unsupported_format(filename: impl Into<String>, allowed: &[String]) -> Self {
        Self::UnsupportedFormat {
            filename: filename.into(),
            allowed: allowed.join(" or "),
        }
    }
}

/// Core error type for InboxXorcist operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Classifier backend is not loaded
    #[error("classifier backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Request validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Classifier execution errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Mailbox parsing and extraction errors
    #[error("mailbox error: {0}")]
    Mailbox(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new backend-unavailable error
    pub fn backend_unavailable(reason: impl Into<String>) -> Self {
        Self::BackendUnavailable(reason.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new mailbox error
    pub fn mailbox(msg: impl Into<String>) -> Self {
        Self::Mailbox(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The underlying message without the variant prefix, for user-facing
    /// details
    pub fn message(&self) -> String {
        match self {
            Self::BackendUnavailable(msg)
            | Self::Classifier(msg)
            | Self::Mailbox(msg)
            | Self::Config(msg)
            | Self::Internal(msg) => msg.clone(),
            Self::Validation(e) => e.to_string(),
            Self::Io(e) => e.to_string(),
            Self::Serialization(e) => e.to_string(),
        }
    }

    /// The kind tag this error surfaces as
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Classifier(_)
            | Self::Mailbox(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Internal(_) => ErrorKind::Processing,
        }
    }
}
