//! Topic Resolver — recovers the subject of a request once control phrases
//! are removed, falling back to the client's last topic for pure follow-ups.

use std::sync::LazyLock;

use regex::Regex;

use crate::generation::intent::strip_change_phrases;

/// Substituted when no topic can be recovered from the request or memory.
pub const PLACEHOLDER_TOPIC: &str = "professional growth and lessons learned at work";

static FILLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:please|pls|thanks|thank\s+you|instead|this\s+time|for\s+me|(?:can|could|would)\s+you)\b")
        .expect("Invalid regex: filler words")
});

static EDGE_CONNECTORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:and|also|but|then|so|now|just)\b|[\s,.;:!?&-])+|(?:\band|[\s,.;:!?&-])+$")
        .expect("Invalid regex: edge connectors")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace"));

/// Removes change-intent phrases and, when any were present, the filler
/// around them. Whitespace is collapsed and the result trimmed.
pub fn clean_request(text: &str) -> String {
    let (stripped, had_control_phrase) = strip_change_phrases(text);
    let cleaned = if had_control_phrase {
        let without_filler = FILLER.replace_all(&stripped, " ");
        let collapsed = collapse_whitespace(&without_filler);
        EDGE_CONNECTORS.replace_all(&collapsed, "").into_owned()
    } else {
        stripped
    };
    collapse_whitespace(&cleaned)
}

/// Resolves the topic for a request. Never returns an empty string.
///
/// `reuse_previous` is set when any change intent was detected; only then may
/// the client's stored topic stand in for an empty remainder.
pub fn resolve_topic(raw: &str, last_topic: Option<&str>, reuse_previous: bool) -> String {
    let cleaned = clean_request(raw);
    if !cleaned.is_empty() {
        return cleaned;
    }

    let fallback = if reuse_previous {
        last_topic.map(str::trim).unwrap_or_default()
    } else {
        raw.trim()
    };
    if !fallback.is_empty() {
        return fallback.to_string();
    }

    PLACEHOLDER_TOPIC.to_string()
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}
