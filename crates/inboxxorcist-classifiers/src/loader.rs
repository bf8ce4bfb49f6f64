//! Classifier loading and the process-wide handle

use crate::classifier::SpamClassifier;
use crate::config::{BackendKind, ClassifierConfig};
use crate::lexicon::LexiconClassifier;
use crate::naive_bayes::NaiveBayesClassifier;
use inboxxorcist_core::{Error, Result};
use std::sync::Arc;
use tracing::{error, info};

/// The classifier loaded at startup, or the reason it could not be loaded.
///
/// Built once, then only cloned and read. There is no reload path.
#[derive(Clone)]
pub enum ClassifierHandle {
    /// Backend ready for use
    Loaded(Arc<dyn SpamClassifier>),
    /// Initialization failed
    Unavailable { reason: Arc<str> },
}

impl ClassifierHandle {
    /// Wrap a ready classifier
    pub fn loaded(classifier: impl SpamClassifier + 'static) -> Self {
        Self::Loaded(Arc::new(classifier))
    }

    /// Record a failed initialization
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: Arc::from(reason.into()),
        }
    }

    /// Attempt to load the configured backend. Never fails: a load error
    /// produces [`ClassifierHandle::Unavailable`].
    pub async fn load(config: &ClassifierConfig) -> Self {
        match load_classifier(config).await {
            Ok(classifier) => {
                info!("Classifier backend '{}' initialized", classifier.name());
                Self::Loaded(classifier)
            }
            Err(e) => {
                error!("Failed to initialize classifier backend: {}", e);
                Self::unavailable(e.to_string())
            }
        }
    }

    /// Whether a backend is available
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Name of the loaded backend
    pub fn backend_name(&self) -> Option<&str> {
        match self {
            Self::Loaded(classifier) => Some(classifier.name()),
            Self::Unavailable { .. } => None,
        }
    }

    /// Borrow the classifier, or fail with a backend-unavailable error
    pub fn classifier(&self) -> Result<&Arc<dyn SpamClassifier>> {
        match self {
            Self::Loaded(classifier) => Ok(classifier),
            Self::Unavailable { reason } => Err(Error::backend_unavailable(reason.as_ref())),
        }
    }
}

impl std::fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loaded(classifier) => f.debug_tuple("Loaded").field(&classifier.name()).finish(),
            Self::Unavailable { reason } => {
                f.debug_struct("Unavailable").field("reason", reason).finish()
            }
        }
    }
}

/// Instantiate the backend named in the configuration
pub async fn load_classifier(config: &ClassifierConfig) -> Result<Arc<dyn SpamClassifier>> {
    match config.backend {
        BackendKind::NaiveBayes => {
            info!("Loading naive Bayes model from {}", config.model_path.display());
            let classifier = NaiveBayesClassifier::from_file(&config.model_path).await?;
            info!("Model vocabulary: {} tokens", classifier.vocabulary_size());
            Ok(Arc::new(classifier))
        }
        BackendKind::Lexicon => Ok(Arc::new(LexiconClassifier::new())),
    }
}
