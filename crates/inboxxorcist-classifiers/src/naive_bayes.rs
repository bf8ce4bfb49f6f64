//! Multinomial naive Bayes backend
//!
//! The model file is JSON holding per-class document counts and token
//! counts. Log-probabilities are derived once at load time with additive
//! (Laplace) smoothing, so classification is a single pass over the tokens.

use crate::classifier::{Prediction, SpamClassifier};
use inboxxorcist_core::{Error, Label, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Serialized model: raw counts as produced by the training side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaiveBayesModel {
    /// Number of spam documents seen in training
    pub spam_documents: u64,

    /// Number of ham documents seen in training
    pub ham_documents: u64,

    /// Token frequencies across spam documents
    #[serde(default)]
    pub spam_tokens: HashMap<String, u64>,

    /// Token frequencies across ham documents
    #[serde(default)]
    pub ham_tokens: HashMap<String, u64>,

    /// Additive smoothing constant
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

fn default_alpha() -> f64 {
    1.0
}

impl NaiveBayesModel {
    /// Read a model from a JSON file
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            Error::config(format!("Failed to read model file {}: {}", path.display(), e))
        })?;
        let model: Self = serde_json::from_slice(&bytes)?;
        Ok(model)
    }
}

/// Per-class log-probabilities
struct ClassWeights {
    log_prior: f64,
    log_unseen: f64,
    log_likelihood: HashMap<String, f64>,
}

impl ClassWeights {
    fn score(&self, tokens: &[String], vocabulary: &HashSet<String>) -> f64 {
        tokens
            .iter()
            .filter(|t| vocabulary.contains(t.as_str()))
            .map(|t| {
                self.log_likelihood
                    .get(t.as_str())
                    .copied()
                    .unwrap_or(self.log_unseen)
            })
            .sum::<f64>()
            + self.log_prior
    }
}

/// Naive Bayes spam classifier
pub struct NaiveBayesClassifier {
    name: String,
    vocabulary: HashSet<String>,
    spam: ClassWeights,
    ham: ClassWeights,
}

impl NaiveBayesClassifier {
    /// Build a classifier from model counts
    pub fn new(model: NaiveBayesModel) -> Result<Self> {
        if model.spam_documents == 0 || model.ham_documents == 0 {
            return Err(Error::config(
                "naive Bayes model needs at least one document per class",
            ));
        }
        if !(model.alpha.is_finite() && model.alpha > 0.0) {
            return Err(Error::config(format!(
                "smoothing constant must be positive, got {}",
                model.alpha
            )));
        }

        let vocabulary: HashSet<String> = model
            .spam_tokens
            .keys()
            .chain(model.ham_tokens.keys())
            .cloned()
            .collect();
        let vocab_size = vocabulary.len() as f64;
        let documents = (model.spam_documents + model.ham_documents) as f64;

        let weights = |docs: u64, counts: &HashMap<String, u64>| {
            let total = counts.values().sum::<u64>() as f64;
            let denominator = total + model.alpha * vocab_size;
            ClassWeights {
                log_prior: (docs as f64 / documents).ln(),
                log_unseen: (model.alpha / denominator).ln(),
                log_likelihood: counts
                    .iter()
                    .map(|(token, count)| {
                        (token.clone(), ((*count as f64 + model.alpha) / denominator).ln())
                    })
                    .collect(),
            }
        };

        let spam = weights(model.spam_documents, &model.spam_tokens);
        let ham = weights(model.ham_documents, &model.ham_tokens);

        debug!(vocabulary = vocabulary.len(), "naive Bayes model prepared");

        Ok(Self {
            name: "naive_bayes".to_string(),
            vocabulary,
            spam,
            ham,
        })
    }

    /// Load and prepare a model file
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(NaiveBayesModel::from_file(path).await?)
    }

    /// Number of distinct tokens the model knows
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Posterior probability of spam for the given text
    pub fn spam_probability(&self, text: &str) -> f64 {
        let tokens = tokenize(text);
        let spam = self.spam.score(&tokens, &self.vocabulary);
        let ham = self.ham.score(&tokens, &self.vocabulary);
        1.0 / (1.0 + (ham - spam).exp())
    }
}

#[async_trait::async_trait]
impl SpamClassifier for NaiveBayesClassifier {
    async fn classify(&self, text: &str) -> Result<Prediction> {
        let start = Instant::now();

        let p_spam = self.spam_probability(text);
        if !p_spam.is_finite() {
            return Err(Error::classifier("naive Bayes produced a non-finite score"));
        }

        let (label, probability) = if p_spam > 0.5 {
            (Label::Spam, p_spam)
        } else {
            (Label::Ham, 1.0 - p_spam)
        };

        Ok(Prediction::new(label)
            .with_confidence(probability * 100.0)
            .with_latency_us(start.elapsed().as_micros() as u64))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Split text into lower-cased word tokens.
///
/// Words are runs of alphanumerics (apostrophes kept inside words); `$` and
/// `!` are emitted as tokens of their own.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if ch.is_alphanumeric() || (ch == '\'' && !current.is_empty()) {
            current.extend(ch.to_lowercase());
            continue;
        }
        if !current.is_empty() {
            tokens.push(current.trim_end_matches('\'').to_string());
            current.clear();
        }
        if ch == '$' || ch == '!' {
            tokens.push(ch.to_string());
        }
    }
    if !current.is_empty() {
        tokens.push(current.trim_end_matches('\'').to_string());
    }

    tokens
}
