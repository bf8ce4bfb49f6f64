//! Shared application state

use crate::config::ServiceConfig;
use crate::ingest::MailboxIngestor;
use crate::service::ClassificationService;
use inboxxorcist_classifiers::{ClassifierHandle, PatternExplainer};
use inboxxorcist_core::Result;
use inboxxorcist_mailbox::MessageExtractor;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Application state shared across handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub service: Arc<ClassificationService>,
    pub ingestor: Arc<MailboxIngestor>,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the services around an already-loaded classifier handle
    pub fn new(
        config: ServiceConfig,
        classifier: ClassifierHandle,
        metrics_handle: Option<PrometheusHandle>,
    ) -> Result<Self> {
        let explainer = Arc::new(PatternExplainer::new()?);
        let extractor = Arc::new(MessageExtractor::new()?);

        let service = Arc::new(ClassificationService::new(classifier, explainer));
        let ingestor = Arc::new(MailboxIngestor::new(
            service.clone(),
            extractor,
            config.mailbox.clone(),
            config.server.max_upload_bytes as u64,
        ));

        Ok(Self {
            config: Arc::new(config),
            service,
            ingestor,
            metrics_handle,
        })
    }
}
