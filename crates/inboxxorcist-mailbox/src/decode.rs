//! Content-Transfer-Encoding and charset decoding

use base64::{engine::general_purpose, Engine as _};
use tracing::debug;

/// Decode a MIME body according to its `Content-Transfer-Encoding`.
///
/// Undecodable base64 is passed through unchanged rather than failing the
/// whole message.
pub fn decode_transfer(body: &str, encoding: Option<&str>) -> Vec<u8> {
    match encoding.map(|e| e.trim().to_ascii_lowercase()).as_deref() {
        Some("base64") => decode_base64_lenient(body).unwrap_or_else(|| {
            debug!("base64 body failed to decode, keeping raw text");
            body.as_bytes().to_vec()
        }),
        Some("quoted-printable") => decode_quoted_printable(body, false),
        _ => body.as_bytes().to_vec(),
    }
}

/// Decode base64 ignoring embedded whitespace and line breaks
pub fn decode_base64_lenient(input: &str) -> Option<Vec<u8>> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    general_purpose::STANDARD
        .decode(compact.as_bytes())
        .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(compact.trim_end_matches('=')))
        .ok()
}

/// Decode quoted-printable text. With `header_mode`, `_` stands for a space
/// (the RFC 2047 "Q" variant).
pub fn decode_quoted_printable(input: &str, header_mode: bool) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'=' => {
                // Soft line break
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 2;
                    continue;
                }
                if bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n') {
                    i += 3;
                    continue;
                }
                let hex = bytes.get(i + 1..i + 3).and_then(|h| std::str::from_utf8(h).ok());
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    None => {
                        out.push(b'=');
                        i += 1;
                    }
                }
            }
            b'_' if header_mode => {
                out.push(b' ');
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }

    out
}

/// Convert bytes to text using the declared charset.
///
/// Latin-1 family charsets map bytes straight to code points; everything else
/// is treated as UTF-8 with replacement characters for invalid sequences.
pub fn decode_charset(bytes: &[u8], charset: Option<&str>) -> String {
    let charset = charset.map(|c| c.trim().trim_matches('"').to_ascii_lowercase());
    match charset.as_deref() {
        Some("iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "windows-1252" | "cp1252") => {
            bytes.iter().map(|&b| b as char).collect()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}
