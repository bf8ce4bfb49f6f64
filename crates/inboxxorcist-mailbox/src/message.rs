//! Raw message structure: headers and body

/// One message as read from an archive, before any MIME decoding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMessage {
    from_line: Option<String>,
    headers: Vec<(String, String)>,
    body: String,
}

impl RawMessage {
    /// Split message text into headers and body.
    ///
    /// `from_line` is the mbox separator line that introduced the message, if any.
    pub fn parse(from_line: Option<String>, text: &str) -> Self {
        let (headers, body) = split_entity(text);
        Self {
            from_line,
            headers,
            body,
        }
    }

    /// The mbox `From ` separator line
    pub fn from_line(&self) -> Option<&str> {
        self.from_line.as_deref()
    }

    /// Envelope sender taken from the separator line
    pub fn envelope_sender(&self) -> Option<&str> {
        self.from_line
            .as_deref()
            .and_then(|line| line.strip_prefix("From "))
            .and_then(|rest| rest.split_whitespace().next())
    }

    /// All headers in order of appearance, unfolded
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    /// Every value of a repeated header, in order
    pub fn header_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Raw, undecoded body
    pub fn body(&self) -> &str {
        &self.body
    }
}

pub(crate) fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Split a MIME entity into unfolded headers and body.
///
/// Headers end at the first blank line, or at the first line that is neither
/// a `Name: value` pair nor a continuation; text without any header block is
/// all body.
pub(crate) fn split_entity(text: &str) -> (Vec<(String, String)>, String) {
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\r', '\n']);

        if content.is_empty() {
            offset += line.len();
            return (headers, text[offset..].to_string());
        }

        if content.starts_with([' ', '\t']) {
            if let Some((_, value)) = headers.last_mut() {
                let continuation = content.trim();
                if !continuation.is_empty() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(continuation);
                }
                offset += line.len();
                continue;
            }
        }

        match parse_header_line(content) {
            Some((name, value)) => headers.push((name.to_string(), value.to_string())),
            None => break,
        }
        offset += line.len();
    }

    (headers, text[offset..].to_string())
}

fn parse_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let valid_name = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_graphic() && b != b':');
    valid_name.then(|| (name, value.trim()))
}
