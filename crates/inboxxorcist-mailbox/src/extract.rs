//! Body extraction and header text cleaning

use crate::decode::{decode_base64_lenient, decode_charset, decode_quoted_printable, decode_transfer};
use crate::message::{header_value, split_entity, RawMessage};
use inboxxorcist_core::{Error, Result};
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Nested multiparts deeper than this are not descended into
const MAX_MIME_DEPTH: usize = 16;

/// Extracts readable text from messages
pub struct MessageExtractor {
    encoded_word_regex: Regex,
    adjacent_words_regex: Regex,
    hidden_block_regex: Regex,
    tag_regex: Regex,
    entity_regex: Regex,
    whitespace_regex: Regex,
}

#[derive(Default)]
struct TextParts {
    plain: Vec<String>,
    html: Vec<String>,
}

impl MessageExtractor {
    /// Create a new extractor
    pub fn new() -> Result<Self> {
        let compile = |name: &str, pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| Error::mailbox(format!("Failed to compile {} regex: {}", name, e)))
        };

        Ok(Self {
            encoded_word_regex: compile("encoded word", r"=\?([^?\s]+)\?([bBqQ])\?([^?\s]*)\?=")?,
            adjacent_words_regex: compile("adjacent word", r"\?=\s+=\?")?,
            hidden_block_regex: compile("hidden block", r"(?is)<(script|style|head)\b.*?</(script|style|head)\s*>")?,
            tag_regex: compile("tag", r"<[^>]*>")?,
            entity_regex: compile("entity", r"&(?:#(\d+)|#[xX]([0-9A-Fa-f]+)|([a-zA-Z]+));")?,
            whitespace_regex: compile("whitespace", r"\s+")?,
        })
    }

    /// Readable body text of a message.
    ///
    /// Walks multipart structure, preferring `text/plain` parts and falling
    /// back to tag-stripped `text/html`. Attachments are skipped.
    pub fn extract_body(&self, message: &RawMessage) -> String {
        let mut parts = TextParts::default();
        self.collect_parts(message.headers(), message.body(), 0, &mut parts);

        if !parts.plain.is_empty() {
            return parts.plain.join("\n").trim().to_string();
        }
        let html = parts
            .html
            .iter()
            .map(|h| self.strip_html(h))
            .collect::<Vec<_>>()
            .join("\n");
        html.trim().to_string()
    }

    /// Decode RFC 2047 encoded words, collapse whitespace, and trim
    pub fn clean_text(&self, raw: &str) -> String {
        let joined = self.adjacent_words_regex.replace_all(raw, "?==?");
        let decoded = self
            .encoded_word_regex
            .replace_all(&joined, |caps: &Captures| {
                let charset = caps.get(1).map(|m| m.as_str());
                let payload = caps.get(3).map_or("", |m| m.as_str());
                let bytes = match caps.get(2).map(|m| m.as_str()) {
                    Some("b" | "B") => decode_base64_lenient(payload),
                    _ => Some(decode_quoted_printable(payload, true)),
                };
                match bytes {
                    Some(bytes) => decode_charset(&bytes, charset),
                    None => caps[0].to_string(),
                }
            });
        self.collapse_whitespace(&decoded)
    }

    /// Collapse runs of whitespace to single spaces and trim
    pub fn collapse_whitespace(&self, text: &str) -> String {
        self.whitespace_regex.replace_all(text, " ").trim().to_string()
    }

    fn collect_parts(
        &self,
        headers: &[(String, String)],
        body: &str,
        depth: usize,
        parts: &mut TextParts,
    ) {
        let disposition = header_value(headers, "content-disposition").unwrap_or("");
        if disposition.trim_start().to_ascii_lowercase().starts_with("attachment") {
            return;
        }

        let (mime, params) = parse_content_type(header_value(headers, "content-type"));

        if mime.starts_with("multipart/") {
            if depth >= MAX_MIME_DEPTH {
                return;
            }
            match params.get("boundary") {
                Some(boundary) => {
                    for part in split_multipart(body, boundary) {
                        let (part_headers, part_body) = split_entity(part);
                        self.collect_parts(&part_headers, &part_body, depth + 1, parts);
                    }
                }
                // Malformed multipart: treat the body as plain text.
                None => parts.plain.push(body.to_string()),
            }
            return;
        }

        if mime == "message/rfc822" {
            if depth < MAX_MIME_DEPTH {
                let (inner_headers, inner_body) = split_entity(body);
                self.collect_parts(&inner_headers, &inner_body, depth + 1, parts);
            }
            return;
        }

        let decode = || {
            let bytes = decode_transfer(body, header_value(headers, "content-transfer-encoding"));
            decode_charset(&bytes, params.get("charset").map(String::as_str))
        };

        match mime.as_str() {
            "text/plain" => parts.plain.push(decode()),
            "text/html" => parts.html.push(decode()),
            _ => {}
        }
    }

    fn strip_html(&self, html: &str) -> String {
        let text = self.hidden_block_regex.replace_all(html, " ");
        let text = self.tag_regex.replace_all(&text, " ");
        let text = self.entity_regex.replace_all(&text, |caps: &Captures| {
            let decoded = if let Some(decimal) = caps.get(1) {
                decimal.as_str().parse::<u32>().ok().and_then(char::from_u32)
            } else if let Some(hex) = caps.get(2) {
                u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
            } else {
                match caps.get(3).map(|m| m.as_str()) {
                    Some("amp") => Some('&'),
                    Some("lt") => Some('<'),
                    Some("gt") => Some('>'),
                    Some("quot") => Some('"'),
                    Some("apos") => Some('\''),
                    Some("nbsp") => Some(' '),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        });
        self.collapse_whitespace(&text)
    }
}

/// Lower-cased MIME type and parameters. Missing header means `text/plain`.
fn parse_content_type(value: Option<&str>) -> (String, HashMap<String, String>) {
    let value = value.unwrap_or("text/plain");
    let mut segments = value.split(';');
    let mime = segments
        .next()
        .map(|m| m.trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "text/plain".to_string());

    let params = segments
        .filter_map(|segment| {
            let (key, val) = segment.split_once('=')?;
            Some((
                key.trim().to_ascii_lowercase(),
                val.trim().trim_matches('"').to_string(),
            ))
        })
        .collect();

    (mime, params)
}

/// Split a multipart body on its boundary, dropping preamble and epilogue
fn split_multipart<'a>(body: &'a str, boundary: &str) -> Vec<&'a str> {
    let delimiter = format!("--{}", boundary);
    let mut parts = Vec::new();
    let mut current_start: Option<usize> = None;
    let mut offset = 0;

    for line in body.split_inclusive('\n') {
        let content = line.trim_end_matches(['\r', '\n']).trim_end();
        let rest = content.strip_prefix(delimiter.as_str());
        if let Some(rest @ ("" | "--")) = rest {
            let closing = rest == "--";
            if let Some(start) = current_start.take() {
                parts.push(trim_part(&body[start..offset]));
            }
            if closing {
                return parts;
            }
            current_start = Some(offset + line.len());
        }
        offset += line.len();
    }

    if let Some(start) = current_start {
        parts.push(trim_part(&body[start..]));
    }
    parts
}

/// The line break before a delimiter belongs to the delimiter
fn trim_part(part: &str) -> &str {
    part.strip_suffix("\r\n")
        .or_else(|| part.strip_suffix('\n'))
        .unwrap_or(part)
}
