//! InboxXorcist Classifiers
//!
//! Spam classification backends and the explanation engine that justifies
//! their verdicts.
//!
//! - [`SpamClassifier`] is the narrow contract the services call through
//! - [`ClassifierHandle`] holds the backend loaded at startup, or the reason
//!   it is missing
//! - [`PatternExplainer`] maps an outcome to short human-readable patterns
//!
//! Backends run on CPU with no external services.

pub mod classifier;
pub mod config;
pub mod lexicon;
pub mod loader;
pub mod naive_bayes;
pub mod patterns;

pub use classifier::{Prediction, SpamClassifier};
pub use config::{BackendKind, ClassifierConfig};
pub use lexicon::LexiconClassifier;
pub use loader::{load_classifier, ClassifierHandle};
pub use naive_bayes::{NaiveBayesClassifier, NaiveBayesModel};
pub use patterns::{PatternExplainer, HAM_RATIONALES, MAX_PATTERNS, SPAM_FALLBACK, SPAM_KEYWORDS};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{Prediction, SpamClassifier};
    pub use crate::lexicon::LexiconClassifier;
    pub use crate::loader::ClassifierHandle;
    pub use crate::naive_bayes::NaiveBayesClassifier;
    pub use crate::patterns::PatternExplainer;
}
