//! InboxXorcist Core
//!
//! Types shared across InboxXorcist components.
//!
//! This crate provides:
//! - Error kinds and result handling for the classification services
//! - Per-item, batch, and mailbox result records as they appear on the wire
//! - Health status reporting

pub mod error;
pub mod types;

pub use error::{Error, ErrorKind, Result, ValidationError};
pub use types::{
    BatchResult, ClassificationResult, HealthStatus, Label, MailboxIngestionResult,
    MailboxRecord, now_iso8601,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, ErrorKind, Result, ValidationError};
    pub use crate::types::{BatchResult, ClassificationResult, Label, MailboxIngestionResult};
}
