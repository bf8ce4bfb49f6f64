//! Mailbox archive ingestion
//!
//! Uploads are streamed to a uniquely named transient file, read back one
//! message at a time, and classified through [`ClassificationService`]. The
//! transient file is removed when the [`TransientArchive`] guard drops, which
//! covers success, failure, and a cancelled request future alike.

use crate::config::MailboxConfig;
use crate::service::ClassificationService;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use inboxxorcist_core::{
    ClassificationResult, Error, MailboxIngestionResult, MailboxRecord, Result, ValidationError,
};
use inboxxorcist_mailbox::{all_recipients, MboxReader, MessageExtractor, RawMessage};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// A transient on-disk copy of an uploaded archive.
///
/// The file is deleted on drop. Deletion failures are logged and swallowed.
pub struct TransientArchive {
    path: PathBuf,
    file: Option<tokio::fs::File>,
}

impl TransientArchive {
    /// Create an empty, uniquely named file in `dir` (or the system temp dir)
    pub fn create(dir: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("inboxxorcist-").suffix(".mbox");
        let named = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        // Removal is handled by our own Drop so it can be logged.
        let (file, path) = named.keep().map_err(|e| Error::Io(e.error))?;
        debug!(path = %path.display(), "Created transient archive");

        Ok(Self {
            path,
            file: Some(tokio::fs::File::from_std(file)),
        })
    }

    /// Location of the transient file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy every chunk of `stream` into the file, failing once more than
    /// `limit` bytes arrive. Returns the number of bytes written.
    pub async fn write_stream<S, E>(&mut self, stream: S, limit: u64) -> Result<u64>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Display,
    {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| Error::internal("transient archive was already written"))?;
        let mut stream = std::pin::pin!(stream);
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::mailbox(format!("Failed to read upload: {}", e)))?;
            written += chunk.len() as u64;
            if written > limit {
                return Err(Error::mailbox(format!(
                    "Upload exceeds the {} byte limit",
                    limit
                )));
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        Ok(written)
    }
}

impl Drop for TransientArchive {
    fn drop(&mut self) {
        // Close the handle before unlinking.
        self.file.take();
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed transient archive"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                "Failed to remove transient archive: {}", e
            ),
        }
    }
}

/// Classifies every message of an uploaded mbox archive
pub struct MailboxIngestor {
    service: Arc<ClassificationService>,
    extractor: Arc<MessageExtractor>,
    config: MailboxConfig,
    max_upload_bytes: u64,
}

impl MailboxIngestor {
    pub fn new(
        service: Arc<ClassificationService>,
        extractor: Arc<MessageExtractor>,
        config: MailboxConfig,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            service,
            extractor,
            config,
            max_upload_bytes,
        }
    }

    /// Reject `filename` unless it ends with an accepted suffix
    pub fn validate_filename(&self, filename: &str) -> Result<()> {
        let lower = filename.to_ascii_lowercase();
        let accepted = self
            .config
            .allowed_extensions
            .iter()
            .any(|ext| lower.ends_with(&ext.to_ascii_lowercase()));

        if accepted {
            Ok(())
        } else {
            Err(ValidationError::unsupported_format(filename, &self.config.allowed_extensions).into())
        }
    }

    /// Persist the uploaded archive, classify each message, and report
    /// aggregate counts
    pub async fn classify_mailbox<S, E>(
        &self,
        stream: S,
        filename: &str,
    ) -> Result<MailboxIngestionResult>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Display,
    {
        self.service.ensure_available()?;
        self.validate_filename(filename)?;

        let mut archive = TransientArchive::create(self.config.temp_dir.as_deref())?;
        let bytes = archive.write_stream(stream, self.max_upload_bytes).await?;
        info!(filename, bytes, "Stored mailbox upload");

        self.classify_archive(archive.path()).await
    }

    async fn classify_archive(&self, path: &Path) -> Result<MailboxIngestionResult> {
        let mut reader = MboxReader::open(path).await?;
        let mut records = Vec::new();

        while let Some(message) = reader.next_message().await? {
            let index = reader.messages_read() - 1;
            let body = self.extractor.extract_body(&message);
            if body.trim().is_empty() {
                debug!(index, "Skipping message without a readable body");
                continue;
            }

            let classification = self.service.classify_one(&body).await?;
            records.push(self.record(index, &message, &body, classification));
        }

        let result = MailboxIngestionResult::from_records(records);
        info!(
            messages = reader.messages_read(),
            classified = result.total(),
            spam = result.positive_count(),
            "Mailbox classified"
        );
        Ok(result)
    }

    fn record(
        &self,
        index: usize,
        message: &RawMessage,
        body: &str,
        classification: ClassificationResult,
    ) -> MailboxRecord {
        let clean = |name: &str| {
            message
                .header(name)
                .map(|value| self.extractor.clean_text(value))
                .filter(|value| !value.is_empty())
        };

        let sender = clean("from")
            .or_else(|| message.envelope_sender().map(str::to_string))
            .unwrap_or_default();

        MailboxRecord {
            index,
            sender,
            recipients: all_recipients(message),
            subject: clean("subject").unwrap_or_default(),
            date: clean("date"),
            body_preview: preview(
                &self.extractor.collapse_whitespace(body),
                self.config.body_preview_chars,
            ),
            body_length: body.chars().count(),
            classification,
        }
    }
}

/// First `max_chars` characters of `text`, with an ellipsis when cut
fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use inboxxorcist_classifiers::{ClassifierHandle, LexiconClassifier, PatternExplainer};
    use inboxxorcist_core::ErrorKind;
    use std::convert::Infallible;

    const ARCHIVE: &str = "From promo@deals.example Mon Jan  1 00:00:00 2024\n\
From: =?UTF-8?B?RGVhbHM=?= <promo@deals.example>\n\
To: Alice <alice@example.com>, bob@example.com\n\
Subject: Act now!\n\
Date: Mon, 1 Jan 2024 00:00:00 +0000\n\
\n\
Congratulations winner! Click here to claim your free prize.\n\
\n\
From carol@example.com Tue Jan  2 00:00:00 2024\n\
From: Carol <carol@example.com>\n\
To: alice@example.com\n\
Subject: Lunch\n\
\n\
Are we still on for lunch tomorrow?\n\
\n\
From nobody@example.com Wed Jan  3 00:00:00 2024\n\
Subject: empty\n\
\n\
\n";

    fn ingestor(dir: &Path, handle: ClassifierHandle) -> MailboxIngestor {
        let service = Arc::new(ClassificationService::new(
            handle,
            Arc::new(PatternExplainer::new().unwrap()),
        ));
        let config = MailboxConfig {
            temp_dir: Some(dir.to_path_buf()),
            ..MailboxConfig::default()
        };
        MailboxIngestor::new(
            service,
            Arc::new(MessageExtractor::new().unwrap()),
            config,
            1024 * 1024,
        )
    }

    fn lexicon() -> ClassifierHandle {
        ClassifierHandle::loaded(LexiconClassifier::new())
    }

    fn chunks(text: &'static str) -> impl Stream<Item = std::result::Result<Bytes, Infallible>> {
        stream::iter(
            text.as_bytes()
                .chunks(37)
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect::<Vec<_>>(),
        )
    }

    fn is_empty_dir(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_classifies_archive() {
        let dir = tempfile::tempdir().unwrap();
        let result = ingestor(dir.path(), lexicon())
            .classify_mailbox(chunks(ARCHIVE), "inbox.mbox")
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(result.total(), 2);
        assert_eq!(result.positive_count(), 1);
        assert_eq!(result.negative_count(), 1);

        let first = &result.records()[0];
        assert_eq!(first.index, 0);
        assert_eq!(first.sender, "Deals <promo@deals.example>");
        assert_eq!(first.recipients, vec!["alice@example.com", "bob@example.com"]);
        assert_eq!(first.subject, "Act now!");
        assert_eq!(first.date.as_deref(), Some("Mon, 1 Jan 2024 00:00:00 +0000"));
        assert!(first.classification.is_positive);

        let second = &result.records()[1];
        assert_eq!(second.index, 1);
        assert_eq!(second.subject, "Lunch");
        assert_eq!(second.date, None);
        assert!(!second.classification.is_positive);

        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_rejects_unsupported_filename_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let err = ingestor(dir.path(), lexicon())
            .classify_mailbox(chunks(ARCHIVE), "archive.pdf")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "File must be an MBOX file (.mbox or .txt)");
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_unavailable_backend_checked_first() {
        let dir = tempfile::tempdir().unwrap();
        let err = ingestor(dir.path(), ClassifierHandle::unavailable("no model"))
            .classify_mailbox(chunks(ARCHIVE), "archive.pdf")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    }

    #[tokio::test]
    async fn test_stream_error_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let upload = stream::iter(vec![
            Ok(Bytes::from_static(b"From a@x.com Mon\n")),
            Err("connection reset"),
        ]);
        let err = ingestor(dir.path(), lexicon())
            .classify_mailbox(upload, "inbox.mbox")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Processing);
        assert!(err.to_string().contains("connection reset"));
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_upload_limit_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let mut ingestor = ingestor(dir.path(), lexicon());
        ingestor.max_upload_bytes = 64;

        let err = ingestor
            .classify_mailbox(chunks(ARCHIVE), "inbox.mbox")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Processing);
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_cancelled_ingestion_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = ingestor(dir.path(), lexicon());
        let upload = stream::iter(vec![Ok::<_, Infallible>(Bytes::from_static(
            b"From a@x.com Mon\nSubject: x\n\n",
        ))])
        .chain(stream::pending());

        let outcome = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            ingestor.classify_mailbox(upload, "inbox.mbox"),
        )
        .await;

        assert!(outcome.is_err());
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let result = ingestor(dir.path(), lexicon())
            .classify_mailbox(stream::empty::<std::result::Result<Bytes, Infallible>>(), "empty.txt")
            .await
            .unwrap();
        assert_eq!(result.total(), 0);
        assert!(result.success());
    }

    #[test]
    fn test_validate_filename_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = ingestor(dir.path(), lexicon());
        assert!(ingestor.validate_filename("Export.MBOX").is_ok());
        assert!(ingestor.validate_filename("notes.txt").is_ok());
        assert!(ingestor.validate_filename("mbox").is_err());
        assert!(ingestor.validate_filename("").is_err());
    }

    #[tokio::test]
    async fn test_transient_archive_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let archive = TransientArchive::create(Some(dir.path())).unwrap();
        let path = archive.path().to_path_buf();
        assert!(path.exists());
        assert!(path.file_name().unwrap().to_string_lossy().ends_with(".mbox"));

        drop(archive);
        assert!(!path.exists());
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("exactly ten", 11), "exactly ten");
        assert_eq!(preview("héllo world", 5), "héllo...");
    }
}
