//! Recipient extraction

use crate::message::RawMessage;

const RECIPIENT_HEADERS: [&str; 3] = ["to", "cc", "bcc"];

/// Every recipient address from `To`, `Cc` and `Bcc`, in header order,
/// without duplicates (compared case-insensitively).
pub fn all_recipients(message: &RawMessage) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    RECIPIENT_HEADERS
        .iter()
        .flat_map(|name| message.header_all(*name))
        .flat_map(parse_address_list)
        .filter(|addr| seen.insert(addr.to_ascii_lowercase()))
        .collect()
}

/// Parse an address-list header value into bare addresses.
///
/// Handles `Name <addr>`, quoted display names containing commas, bare
/// addresses, and trailing `(comments)`. Group syntax (`team: a@x, b@x;`)
/// yields the member addresses.
pub fn parse_address_list(value: &str) -> Vec<String> {
    split_top_level(value)
        .into_iter()
        .filter_map(|entry| parse_mailbox(entry))
        .collect()
}

fn split_top_level(value: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut in_quotes = false;
    let mut angle_depth = 0usize;
    let mut paren_depth = 0usize;
    let mut start = 0;
    let mut escaped = false;

    for (i, ch) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => angle_depth += 1,
            '>' if !in_quotes => angle_depth = angle_depth.saturating_sub(1),
            '(' if !in_quotes => paren_depth += 1,
            ')' if !in_quotes => paren_depth = paren_depth.saturating_sub(1),
            ',' | ';' if !in_quotes && angle_depth == 0 && paren_depth == 0 => {
                entries.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&value[start..]);
    entries
}

fn parse_mailbox(entry: &str) -> Option<String> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }

    if let (Some(open), Some(close)) = (entry.rfind('<'), entry.rfind('>')) {
        if open < close {
            let addr = entry[open + 1..close].trim();
            return (!addr.is_empty()).then(|| addr.to_string());
        }
    }

    // Group prefix: "team: a@x" leaves "a@x" for the first member.
    let entry = match entry.split_once(':') {
        Some((_, rest)) if !entry.starts_with('"') => rest.trim(),
        _ => entry,
    };

    let bare = match entry.find('(') {
        Some(pos) => entry[..pos].trim(),
        None => entry,
    };
    let bare = bare.trim_matches('"');

    (bare.contains('@') && !bare.contains(char::is_whitespace)).then(|| bare.to_string())
}
