//! Classifier trait and common types

use async_trait::async_trait;
use inboxxorcist_core::{Label, Result};

/// Contract every spam classification backend implements.
///
/// Implementations are loaded once at startup and shared read-only across
/// requests, so `classify` takes `&self` and must not rely on interior state.
#[async_trait]
pub trait SpamClassifier: Send + Sync {
    /// Classify the given text
    async fn classify(&self, text: &str) -> Result<Prediction>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Raw backend output for one text
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Spam or ham
    pub label: Label,

    /// Confidence percentage (0-100), if the backend produces one
    pub confidence: Option<f64>,

    /// Backend latency in microseconds, recorded by the service as a histogram
    pub latency_us: u64,
}

impl Prediction {
    /// Create a prediction without a confidence score
    pub fn new(label: Label) -> Self {
        Self {
            label,
            confidence: None,
            latency_us: 0,
        }
    }

    /// Attach a confidence percentage, clamped to 0-100
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 100.0));
        self
    }

    /// Record how long the backend took
    pub fn with_latency_us(mut self, latency_us: u64) -> Self {
        self.latency_us = latency_us;
        self
    }

    /// Whether the backend labelled the text as spam
    pub fn is_positive(&self) -> bool {
        self.label.is_positive()
    }
}
