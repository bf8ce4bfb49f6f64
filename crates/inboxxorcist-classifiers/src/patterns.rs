//! Pattern explanation engine
//!
//! Turns a classification outcome into at most [`MAX_PATTERNS`] short,
//! human-readable justifications. Spam explanations come from a fixed keyword
//! table matched against the case-folded text; ham explanations are a fixed
//! list that ignores the text entirely.

use aho_corasick::{AhoCorasick, MatchKind};
use inboxxorcist_core::{Error, Result};

/// Upper bound on explanations returned for one text
pub const MAX_PATTERNS: usize = 4;

/// Keyword table for spam outcomes, in output order
pub const SPAM_KEYWORDS: [(&str, &str); 12] = [
    ("winner", "Lottery/prize scam language"),
    ("prize", "Prize notification pattern"),
    ("urgent", "Urgency manipulation tactics"),
    ("click here", "Suspicious call-to-action"),
    ("bank details", "Phishing attempt detected"),
    ("congratulations", "Fake congratulatory message"),
    ("$", "Monetary incentive pattern"),
    ("free", "Free offer scam pattern"),
    ("act now", "Pressure tactics detected"),
    ("verify", "Account verification phishing"),
    ("suspended", "Account threat scam"),
    ("limited time", "Artificial urgency pattern"),
];

/// Used for spam outcomes when no keyword matched
pub const SPAM_FALLBACK: [&str; 3] = [
    "Suspicious language patterns",
    "High spam probability score",
    "Unverified sender characteristics",
];

/// Returned for every ham outcome
pub const HAM_RATIONALES: [&str; 4] = [
    "Verified sender domain",
    "Normal communication patterns",
    "No malicious links detected",
    "Legitimate content structure",
];

/// Keyword matcher over [`SPAM_KEYWORDS`]
pub struct PatternExplainer {
    keywords: AhoCorasick,
}

impl PatternExplainer {
    /// Build the matcher for the fixed keyword table
    pub fn new() -> Result<Self> {
        let keywords = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(SPAM_KEYWORDS.iter().map(|(keyword, _)| *keyword))
            .map_err(|e| Error::classifier(format!("Failed to build keyword matcher: {}", e)))?;

        Ok(Self { keywords })
    }

    /// Explain a classification outcome for `text`.
    ///
    /// Output depends only on the arguments, and spam explanations keep table
    /// order with each keyword counted once.
    pub fn explain(&self, text: &str, is_positive: bool) -> Vec<String> {
        if !is_positive {
            return HAM_RATIONALES.iter().map(|s| s.to_string()).collect();
        }

        let folded = text.to_lowercase();
        let mut matched = [false; SPAM_KEYWORDS.len()];
        for m in self.keywords.find_overlapping_iter(&folded) {
            matched[m.pattern().as_usize()] = true;
        }

        let mut patterns: Vec<String> = SPAM_KEYWORDS
            .iter()
            .zip(matched)
            .filter(|(_, hit)| *hit)
            .map(|((_, explanation), _)| explanation.to_string())
            .take(MAX_PATTERNS)
            .collect();

        if patterns.is_empty() {
            patterns = SPAM_FALLBACK.iter().map(|s| s.to_string()).collect();
        }

        patterns.truncate(MAX_PATTERNS);
        patterns
    }
}
