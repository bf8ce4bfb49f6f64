//! InboxXorcist Mailbox
//!
//! Turns an mbox archive into message records the classifier can consume.
//!
//! - [`MboxReader`] yields messages lazily, one at a time, from any async
//!   buffered reader; it cannot be rewound
//! - [`RawMessage`] exposes unfolded headers and the raw body
//! - [`MessageExtractor`] pulls a readable body out of MIME structure and
//!   cleans header text (RFC 2047 encoded words, whitespace)
//! - [`all_recipients`] collects `To`/`Cc`/`Bcc` addresses

pub mod address;
pub mod decode;
pub mod extract;
pub mod message;
pub mod reader;

pub use address::{all_recipients, parse_address_list};
pub use extract::MessageExtractor;
pub use message::RawMessage;
pub use reader::MboxReader;
