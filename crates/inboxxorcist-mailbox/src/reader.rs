//! Lazy mbox reader
//!
//! Messages start at a `From ` line that opens the file or follows a blank
//! line. Body lines escaped as `>From ` (any number of `>`) lose one `>`.
//! Text before the first separator is kept as a message of its own when it
//! is not blank, so a single bare message uploads as one record.
//! This is stricter than plain mboxo splitting, which breaks on every `From `
//! line and drops any preamble.

use crate::message::RawMessage;
use inboxxorcist_core::Result;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Forward-only reader over an mbox stream
pub struct MboxReader<R> {
    reader: R,
    buf: Vec<u8>,
    pending_from: Option<String>,
    at_start: bool,
    finished: bool,
    yielded: usize,
}

impl MboxReader<BufReader<File>> {
    /// Open an mbox file on disk
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref()).await?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin> MboxReader<R> {
    /// Wrap an async buffered reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            pending_from: None,
            at_start: true,
            finished: false,
            yielded: 0,
        }
    }

    /// Number of messages returned so far
    pub fn messages_read(&self) -> usize {
        self.yielded
    }

    /// Read the next message, or `None` once the archive is exhausted
    pub async fn next_message(&mut self) -> Result<Option<RawMessage>> {
        if self.finished && self.pending_from.is_none() {
            return Ok(None);
        }

        let mut from_line = self.pending_from.take();
        let mut lines: Vec<String> = Vec::new();
        let mut prev_blank = false;

        while !self.finished {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
                self.finished = true;
                break;
            }

            let raw = String::from_utf8_lossy(&self.buf).into_owned();
            let line = raw.trim_end_matches(['\r', '\n']);

            let is_separator = line.starts_with("From ") && (self.at_start || prev_blank);
            self.at_start = false;

            if is_separator {
                if from_line.is_some() || has_content(&lines) {
                    self.pending_from = Some(line.to_string());
                    break;
                }
                // First separator in the file; anything before it was blank.
                from_line = Some(line.to_string());
                lines.clear();
                prev_blank = false;
                continue;
            }

            prev_blank = line.trim().is_empty();
            lines.push(unescape_from(line).to_string());
        }

        if from_line.is_none() && !has_content(&lines) {
            return Ok(None);
        }

        // The blank line before the next separator belongs to the separator.
        if lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }

        self.yielded += 1;
        Ok(Some(RawMessage::parse(from_line, &lines.join("\n"))))
    }
}

fn has_content(lines: &[String]) -> bool {
    lines.iter().any(|l| !l.trim().is_empty())
}

fn unescape_from(line: &str) -> &str {
    let quoted = line.trim_start_matches('>');
    if quoted.len() < line.len() && quoted.starts_with("From ") {
        &line[1..]
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCHIVE: &str = "From alice@example.com Mon Jan  1 00:00:00 2024\n\
Subject: First\n\
\n\
Hello there.\n\
>From the desk of Alice\n\
\n\
From bob@example.com Tue Jan  2 00:00:00 2024\n\
Subject: Second\n\
\n\
Second body.\n";

    async fn collect(input: &str) -> Vec<RawMessage> {
        let mut reader = MboxReader::new(input.as_bytes());
        let mut out = Vec::new();
        while let Some(msg) = reader.next_message().await.unwrap() {
            out.push(msg);
        }
        out
    }

    #[tokio::test]
    async fn test_reads_messages_in_order() {
        let messages = collect(ARCHIVE).await;

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].header("subject"), Some("First"));
        assert_eq!(messages[0].body(), "Hello there.\nFrom the desk of Alice");
        assert_eq!(messages[1].header("subject"), Some("Second"));
        assert_eq!(messages[1].envelope_sender(), Some("bob@example.com"));
    }

    #[tokio::test]
    async fn test_from_inside_paragraph_is_not_a_separator() {
        let input = "From a@x.com Mon Jan  1 00:00:00 2024\nSubject: s\n\nline one\nFrom here on, text\n";
        let messages = collect(input).await;
        assert_eq!(messages.len(), 1);
        assert!(messages[0].body().contains("From here on, text"));
    }

    #[tokio::test]
    async fn test_crlf_archive() {
        let input = "From a@x.com Mon\r\nSubject: one\r\n\r\nbody one\r\n\r\nFrom b@x.com Tue\r\nSubject: two\r\n\r\nbody two\r\n";
        let messages = collect(input).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].body(), "body one");
        assert_eq!(messages[1].header("Subject"), Some("two"));
    }

    #[tokio::test]
    async fn test_bare_message_without_separator() {
        let messages = collect("Subject: lone\n\nJust one message.\n").await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].from_line(), None);
        assert_eq!(messages[0].body(), "Just one message.");
    }

    #[tokio::test]
    async fn test_empty_input() {
        assert!(collect("").await.is_empty());
        assert!(collect("\n\n  \n").await.is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_reader_stays_exhausted() {
        let mut reader = MboxReader::new(ARCHIVE.as_bytes());
        while reader.next_message().await.unwrap().is_some() {}
        assert_eq!(reader.messages_read(), 2);
        assert!(reader.next_message().await.unwrap().is_none());
        assert!(reader.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inbox.mbox");
        tokio::fs::write(&path, ARCHIVE).await.unwrap();

        let mut reader = MboxReader::open(&path).await.unwrap();
        let first = reader.next_message().await.unwrap().unwrap();
        assert_eq!(first.header("subject"), Some("First"));
    }

    #[test]
    fn test_unescape_from() {
        assert_eq!(unescape_from(">From x"), "From x");
        assert_eq!(unescape_from(">>From x"), ">From x");
        assert_eq!(unescape_from(">quoted"), ">quoted");
        assert_eq!(unescape_from("From x"), "From x");
    }
}
