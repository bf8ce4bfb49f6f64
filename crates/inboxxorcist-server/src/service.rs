//! Single-item and batch classification

use inboxxorcist_classifiers::{ClassifierHandle, PatternExplainer, Prediction, SpamClassifier};
use inboxxorcist_core::{
    now_iso8601, BatchResult, ClassificationResult, HealthStatus, Result, ValidationError,
};
use std::sync::Arc;
use tracing::debug;

/// Confidence reported when the backend does not produce one
pub const DEFAULT_CONFIDENCE: f64 = 95.0;

/// Summary sentence for spam verdicts
pub const SPAM_MESSAGE: &str =
    "This email contains suspicious patterns commonly associated with spam.";

/// Summary sentence for ham verdicts
pub const HAM_MESSAGE: &str = "This email appears to be legitimate and safe.";

/// Classifies texts through the startup-loaded backend and assembles
/// presentable results
pub struct ClassificationService {
    classifier: ClassifierHandle,
    explainer: Arc<PatternExplainer>,
}

impl ClassificationService {
    pub fn new(classifier: ClassifierHandle, explainer: Arc<PatternExplainer>) -> Self {
        Self {
            classifier,
            explainer,
        }
    }

    /// Fail with a backend-unavailable error unless a classifier is loaded
    pub fn ensure_available(&self) -> Result<&Arc<dyn SpamClassifier>> {
        self.classifier.classifier()
    }

    /// Classify one email text
    pub async fn classify_one(&self, text: &str) -> Result<ClassificationResult> {
        let classifier = self.ensure_available()?;
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyInput.into());
        }

        let prediction = classifier.classify(text).await?;

        metrics::histogram!("inboxxorcist_classify_latency_us").record(prediction.latency_us as f64);
        metrics::counter!(
            "inboxxorcist_classifications_total",
            "label" => prediction.label.as_str()
        )
        .increment(1);
        debug!(
            backend = classifier.name(),
            label = %prediction.label,
            latency_us = prediction.latency_us,
            "Classified text"
        );

        Ok(self.assemble(text, &prediction))
    }

    /// Classify a list of texts. Blank entries are skipped; the first
    /// failing entry fails the whole batch.
    pub async fn classify_batch(&self, texts: &[String]) -> Result<BatchResult> {
        self.ensure_available()?;
        if texts.is_empty() {
            return Err(ValidationError::EmptyBatch.into());
        }

        let mut results = Vec::with_capacity(texts.len());
        for text in texts.iter().filter(|t| !t.trim().is_empty()) {
            results.push(self.classify_one(text).await?);
        }

        let batch = BatchResult::from_results(results);
        debug!(
            submitted = texts.len(),
            classified = batch.total(),
            spam = batch.positive_count(),
            "Batch classified"
        );
        Ok(batch)
    }

    /// Current health. Never fails.
    pub fn status(&self) -> HealthStatus {
        let loaded = self.classifier.is_loaded();
        HealthStatus {
            healthy: loaded,
            backend_loaded: loaded,
            backend: self.classifier.backend_name().map(str::to_string),
            timestamp: now_iso8601(),
        }
    }

    fn assemble(&self, text: &str, prediction: &Prediction) -> ClassificationResult {
        let is_positive = prediction.is_positive();
        let confidence = prediction.confidence.unwrap_or(DEFAULT_CONFIDENCE);
        let message = if is_positive { SPAM_MESSAGE } else { HAM_MESSAGE };

        ClassificationResult {
            label: prediction.label,
            is_positive,
            confidence: round_one_decimal(confidence),
            message: message.to_string(),
            patterns: self.explainer.explain(text, is_positive),
            timestamp: now_iso8601(),
        }
    }
}

/// Round half away from zero to one decimal place
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use inboxxorcist_classifiers::LexiconClassifier;
    use inboxxorcist_core::{Error, ErrorKind, Label};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Labels text as spam when it mentions "free" or "win"
    struct KeywordClassifier {
        confidence: Option<f64>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SpamClassifier for KeywordClassifier {
        async fn classify(&self, text: &str) -> Result<Prediction> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("explode") {
                return Err(Error::classifier("backend exploded"));
            }
            let lower = text.to_lowercase();
            let label = if lower.contains("free") || lower.contains("win") {
                Label::Spam
            } else {
                Label::Ham
            };
            let prediction = Prediction::new(label);
            Ok(match self.confidence {
                Some(c) => prediction.with_confidence(c),
                None => prediction,
            })
        }

        fn name(&self) -> &str {
            "keyword"
        }
    }

    fn service_with(confidence: Option<f64>) -> (ClassificationService, Arc<KeywordClassifier>) {
        let classifier = Arc::new(KeywordClassifier {
            confidence,
            calls: AtomicUsize::new(0),
        });
        let handle = ClassifierHandle::Loaded(classifier.clone());
        let explainer = Arc::new(PatternExplainer::new().unwrap());
        (ClassificationService::new(handle, explainer), classifier)
    }

    fn unavailable_service() -> ClassificationService {
        ClassificationService::new(
            ClassifierHandle::unavailable("model file missing"),
            Arc::new(PatternExplainer::new().unwrap()),
        )
    }

    #[tokio::test]
    async fn test_spam_result() {
        let (service, _) = service_with(Some(97.46));
        let result = service
            .classify_one("Congratulations! You have won a FREE prize! Click here to claim now!")
            .await
            .unwrap();

        assert_eq!(result.label, Label::Spam);
        assert!(result.is_positive);
        assert_eq!(result.confidence, 97.5);
        assert_eq!(result.message, SPAM_MESSAGE);
        assert_eq!(
            result.patterns,
            vec![
                "Prize notification pattern",
                "Suspicious call-to-action",
                "Fake congratulatory message",
                "Free offer scam pattern",
            ]
        );
        assert!(!result.timestamp.is_empty());
    }

    #[tokio::test]
    async fn test_missing_confidence_defaults() {
        let (service, _) = service_with(None);
        let result = service
            .classify_one("Hi team, the meeting is moved to 3pm.")
            .await
            .unwrap();

        assert_eq!(result.label, Label::Ham);
        assert_eq!(result.confidence, 95.0);
        assert_eq!(result.message, HAM_MESSAGE);
        assert_eq!(result.patterns.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_input_rejected_before_backend() {
        let (service, classifier) = service_with(None);
        let err = service.classify_one("   \n\t").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Email text cannot be empty");
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unavailable_checked_before_validation() {
        let service = unavailable_service();
        let err = service.classify_one("").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);

        let err = service.classify_batch(&[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    }

    #[tokio::test]
    async fn test_backend_failure_is_processing_error() {
        let (service, _) = service_with(None);
        let err = service.classify_one("this will explode").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Processing);
    }

    #[tokio::test]
    async fn test_batch_skips_blank_entries() {
        let (service, classifier) = service_with(Some(88.0));
        let texts = vec![
            "You win a free cruise".to_string(),
            "   ".to_string(),
            "Lunch tomorrow?".to_string(),
        ];
        let batch = service.classify_batch(&texts).await.unwrap();

        assert_eq!(batch.total(), 2);
        assert_eq!(batch.positive_count(), 1);
        assert_eq!(batch.negative_count(), 1);
        assert_eq!(batch.results()[0].label, Label::Spam);
        assert_eq!(batch.results()[1].label, Label::Ham);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_all_blank_batch_is_empty_success() {
        let (service, _) = service_with(None);
        let batch = service
            .classify_batch(&["".to_string(), " ".to_string()])
            .await
            .unwrap();
        assert_eq!(batch.total(), 0);
        assert_eq!(batch.positive_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let (service, _) = service_with(None);
        let err = service.classify_batch(&[]).await.unwrap_err();
        assert_eq!(err.to_string(), "Email list cannot be empty");
    }

    #[tokio::test]
    async fn test_batch_fails_on_first_error() {
        let (service, classifier) = service_with(None);
        let texts = vec![
            "first".to_string(),
            "please explode".to_string(),
            "never reached".to_string(),
        ];
        let err = service.classify_batch(&texts).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Processing);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_lexicon_backend_uses_default_confidence() {
        let service = ClassificationService::new(
            ClassifierHandle::loaded(LexiconClassifier::new()),
            Arc::new(PatternExplainer::new().unwrap()),
        );
        let result = service.classify_one("See you at dinner").await.unwrap();
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_status() {
        let (service, _) = service_with(None);
        let status = service.status();
        assert!(status.healthy);
        assert!(status.backend_loaded);
        assert_eq!(status.backend.as_deref(), Some("keyword"));

        let status = unavailable_service().status();
        assert!(!status.healthy);
        assert!(!status.backend_loaded);
        assert_eq!(status.backend, None);
    }

    #[test]
    fn test_round_one_decimal() {
        assert_eq!(round_one_decimal(97.46), 97.5);
        assert_eq!(round_one_decimal(97.44), 97.4);
        assert_eq!(round_one_decimal(95.0), 95.0);
        assert_eq!(round_one_decimal(0.04), 0.0);
    }

    proptest! {
        #[test]
        fn prop_batch_counts_add_up(entries in prop::collection::vec(
            prop_oneof![
                Just("".to_string()),
                Just("   ".to_string()),
                Just("win big money".to_string()),
                "[a-v ]{1,20}[a-v]",
            ],
            1..20,
        )) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (service, _) = service_with(None);
            let batch = runtime.block_on(service.classify_batch(&entries)).unwrap();

            let non_blank = entries.iter().filter(|e| !e.trim().is_empty()).count();
            prop_assert_eq!(batch.total(), non_blank);
            prop_assert_eq!(batch.positive_count() + batch.negative_count(), batch.total());
            prop_assert_eq!(
                batch.positive_count(),
                batch.results().iter().filter(|r| r.is_positive).count()
            );
        }

        #[test]
        fn prop_confidence_has_one_decimal(raw in 0.0f64..=100.0) {
            let rounded = round_one_decimal(raw);
            prop_assert!((rounded - raw).abs() <= 0.05 + 1e-9);
            prop_assert!(((rounded * 10.0).round() - rounded * 10.0).abs() < 1e-9);
        }
    }
}
