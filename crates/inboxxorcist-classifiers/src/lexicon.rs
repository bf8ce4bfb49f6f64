//! Keyword lexicon backend
//!
//! Counts fixed spam terms in the text; a quarter point per term, spam at
//! half a point. No confidence is reported.

use crate::classifier::{Prediction, SpamClassifier};
use inboxxorcist_core::{Label, Result};
use std::time::Instant;

const SPAM_LEXICON: [&str; 20] = [
    "winner", "prize", "lottery", "urgent", "click here", "bank details", "congratulations",
    "free", "act now", "verify", "suspended", "limited time", "claim", "cash", "$",
    "guaranteed", "risk-free", "wire transfer", "password", "unsubscribe",
];

/// Lexicon-based spam classifier
pub struct LexiconClassifier {
    name: String,
    threshold: f32,
}

impl LexiconClassifier {
    /// Create a new lexicon classifier
    pub fn new() -> Self {
        Self {
            name: "lexicon".to_string(),
            threshold: 0.5,
        }
    }

    fn score(&self, text: &str) -> f32 {
        let text_lower = text.to_lowercase();

        let matches = SPAM_LEXICON
            .iter()
            .filter(|term| text_lower.contains(**term))
            .count() as f32;

        (matches * 0.25).min(0.95)
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SpamClassifier for LexiconClassifier {
    async fn classify(&self, text: &str) -> Result<Prediction> {
        let start = Instant::now();

        let label = if self.score(text) >= self.threshold {
            Label::Spam
        } else {
            Label::Ham
        };

        Ok(Prediction::new(label).with_latency_us(start.elapsed().as_micros() as u64))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
