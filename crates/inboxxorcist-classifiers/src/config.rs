//! Configuration for the classifier backend

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which backend to load at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Naive Bayes model read from `model_path`
    #[default]
    NaiveBayes,
    /// Built-in keyword lexicon, no model file
    Lexicon,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "naive_bayes" | "nb" => Ok(Self::NaiveBayes),
            "lexicon" => Ok(Self::Lexicon),
            other => Err(format!("unknown classifier backend '{}'", other)),
        }
    }
}

/// Classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Backend implementation
    #[serde(default)]
    pub backend: BackendKind,

    /// Model file for model-backed implementations
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            model_path: default_model_path(),
        }
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/spam_model.json")
}
