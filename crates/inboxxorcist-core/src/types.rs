//! Result records for InboxXorcist
//!
//! Serialized field names follow the public HTTP contract (`prediction`,
//! `is_spam`, `detected_patterns`, `total_emails`, ...), which predates the
//! Rust names used internally.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a spam classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Positive outcome
    #[serde(rename = "SPAM")]
    Spam,
    /// Negative outcome (legitimate mail)
    #[serde(rename = "HAM")]
    Ham,
}

impl Label {
    /// Whether this is the positive (spam) outcome
    pub fn is_positive(self) -> bool {
        matches!(self, Self::Spam)
    }

    /// Lower-case name, used for metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spam => "spam",
            Self::Ham => "ham",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spam => f.write_str("SPAM"),
            Self::Ham => f.write_str("HAM"),
        }
    }
}

/// Current wall-clock time as an ISO-8601 string
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Classification of one email text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Spam or ham
    #[serde(rename = "prediction")]
    pub label: Label,

    /// `true` for spam
    #[serde(rename = "is_spam")]
    pub is_positive: bool,

    /// Confidence percentage, rounded to one decimal
    pub confidence: f64,

    /// Fixed summary sentence for the outcome
    pub message: String,

    /// Up to four human-readable explanations
    #[serde(rename = "detected_patterns")]
    pub patterns: Vec<String>,

    /// Assembly time (ISO-8601)
    pub timestamp: String,
}

/// Aggregate of a batch classification.
///
/// Counts are derived from `results` when the value is built and cannot be
/// changed afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    results: Vec<ClassificationResult>,

    #[serde(rename = "total_emails")]
    total: usize,

    #[serde(rename = "spam_count")]
    positive_count: usize,

    #[serde(rename = "safe_count")]
    negative_count: usize,
}

impl BatchResult {
    /// Build a batch result, deriving all counts from `results`
    pub fn from_results(results: Vec<ClassificationResult>) -> Self {
        let total = results.len();
        let positive_count = results.iter().filter(|r| r.is_positive).count();
        Self {
            results,
            total,
            positive_count,
            negative_count: total - positive_count,
        }
    }

    pub fn results(&self) -> &[ClassificationResult] {
        &self.results
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn positive_count(&self) -> usize {
        self.positive_count
    }

    pub fn negative_count(&self) -> usize {
        self.negative_count
    }
}

/// One classified message from a mailbox archive
#[derive(Debug, Clone, Serialize)]
pub struct MailboxRecord {
    /// Zero-based position of the message in the archive
    pub index: usize,

    /// Cleaned `From` header
    pub sender: String,

    /// Addresses from `To`, `Cc` and `Bcc`
    pub recipients: Vec<String>,

    /// Cleaned `Subject` header
    pub subject: String,

    /// Cleaned `Date` header, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Leading slice of the extracted body
    pub body_preview: String,

    /// Extracted body length in characters
    pub body_length: usize,

    #[serde(flatten)]
    pub classification: ClassificationResult,
}

/// Aggregate of a mailbox ingestion
#[derive(Debug, Clone, Serialize)]
pub struct MailboxIngestionResult {
    success: bool,

    #[serde(rename = "total_emails")]
    total: usize,

    #[serde(rename = "spam_count")]
    positive_count: usize,

    #[serde(rename = "safe_count")]
    negative_count: usize,

    results: Vec<MailboxRecord>,
}

impl MailboxIngestionResult {
    /// Build an ingestion result, deriving all counts from `records`
    pub fn from_records(records: Vec<MailboxRecord>) -> Self {
        let total = records.len();
        let positive_count = records
            .iter()
            .filter(|r| r.classification.is_positive)
            .count();
        Self {
            success: true,
            total,
            positive_count,
            negative_count: total - positive_count,
            results: records,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn positive_count(&self) -> usize {
        self.positive_count
    }

    pub fn negative_count(&self) -> usize {
        self.negative_count
    }

    pub fn records(&self) -> &[MailboxRecord] {
        &self.results
    }
}

/// Snapshot of service health
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    /// Service can classify
    pub healthy: bool,

    /// Classifier backend initialized at startup
    pub backend_loaded: bool,

    /// Name of the loaded backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,

    /// Time of the check (ISO-8601)
    pub timestamp: String,
}
