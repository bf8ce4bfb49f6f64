//! InboxXorcist Server
//!
//! HTTP surface for spam classification: single emails, batches, and mbox
//! archive uploads, plus health and Prometheus metrics endpoints.

pub mod config;
pub mod error;
pub mod ingest;
pub mod routes;
pub mod service;
pub mod state;

pub use config::{Cli, ServiceConfig};
pub use error::AppError;
pub use ingest::{MailboxIngestor, TransientArchive};
pub use routes::create_router;
pub use service::ClassificationService;
pub use state::AppState;
