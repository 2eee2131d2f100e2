//! Pull-request title cleanup.
//!
//! Titles are decoded (when CI sends them encoded), marker tokens such as
//! `[draft]` become prefixes, and leftover brackets are removed so they cannot
//! break the Markdown link the title ends up in.

use std::sync::LazyLock;

use base64::{Engine, engine::general_purpose::STANDARD};
use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::base::{config::TitleEncoding, types::Res};

/// Marker tokens and their replacements, matched case-insensitively, in order.
const TITLE_MARKERS: &[(&str, &str)] = &[("[draft]", "DRAFT:"), ("[epic]", "EPIC:")];

static MARKER_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    TITLE_MARKERS
        .iter()
        .map(|(marker, replacement)| {
            let pattern = RegexBuilder::new(&regex::escape(marker)).case_insensitive(true).build().expect("escaped marker is a valid pattern");
            (pattern, *replacement)
        })
        .collect()
});

/// Turns raw titles from webhook payloads into display text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleSanitizer {
    encoding: TitleEncoding,
}

impl TitleSanitizer {
    pub fn new(encoding: TitleEncoding) -> Self {
        Self { encoding }
    }

    /// Decode and clean `raw`.
    ///
    /// A title that fails to decode is logged and rendered as empty text.
    pub fn sanitize(&self, raw: &str) -> String {
        clean_title(&self.decode(raw))
    }

    /// Undo the wire encoding, or log and return an empty title.
    pub fn decode(&self, raw: &str) -> String {
        match self.encoding {
            TitleEncoding::Plain => raw.to_string(),
            TitleEncoding::Base64 => decode_base64(raw).unwrap_or_else(|err| {
                warn!("Failed to decode title `{}`: {}", raw, err);
                String::new()
            }),
        }
    }
}

fn decode_base64(raw: &str) -> Res<String> {
    let compact: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact)?;

    Ok(String::from_utf8(bytes)?)
}

/// Rewrite marker tokens, then strip `[` and turn `]` into `:`.
pub fn clean_title(title: &str) -> String {
    let marked = MARKER_PATTERNS
        .iter()
        .fold(title.to_string(), |acc, (pattern, replacement)| pattern.replace_all(&acc, *replacement).into_owned());

    marked.replace('[', "").replace(']', ":")
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(title: &str) -> String {
        STANDARD.encode(title)
    }

    #[test]
    fn test_markers_become_prefixes() {
        assert_eq!(clean_title("[draft] Fix bug"), "DRAFT: Fix bug");
        assert_eq!(clean_title("[EPIC] Rollout"), "EPIC: Rollout");
        assert_eq!(clean_title("[Draft][Epic] Both"), "DRAFT:EPIC: Both");
    }

    #[test]
    fn test_plain_titles_are_unchanged() {
        assert_eq!(clean_title("plain title"), "plain title");
        assert_eq!(clean_title(""), "");
    }

    #[test]
    fn test_leftover_brackets_are_stripped() {
        assert_eq!(clean_title("a [b] c"), "a b: c");
        assert_eq!(clean_title("[JIRA-42] Add cache"), "JIRA-42: Add cache");
    }

    #[test]
    fn test_sanitize_decodes_base64() {
        let sanitizer = TitleSanitizer::new(TitleEncoding::Base64);

        assert_eq!(sanitizer.sanitize(&encode("[draft] Починить тесты")), "DRAFT: Починить тесты");
    }

    #[test]
    fn test_sanitize_ignores_wrapped_base64() {
        let sanitizer = TitleSanitizer::new(TitleEncoding::Base64);
        let encoded = encode("A rather long pull request title that base64 wraps over several lines");
        let wrapped = format!("{}\n{}\n", &encoded[..40], &encoded[40..]);

        assert_eq!(sanitizer.sanitize(&wrapped), "A rather long pull request title that base64 wraps over several lines");
    }

    #[test]
    fn test_invalid_encoded_title_becomes_empty() {
        let sanitizer = TitleSanitizer::new(TitleEncoding::Base64);

        assert_eq!(sanitizer.sanitize("not base64 at all!"), "");
        assert_eq!(sanitizer.sanitize(&STANDARD.encode([0xff, 0xfe, 0xfd])), "");
    }

    #[test]
    fn test_plain_encoding_skips_decoding() {
        let sanitizer = TitleSanitizer::new(TitleEncoding::Plain);

        assert_eq!(sanitizer.sanitize("[epic] Rollout"), "EPIC: Rollout");
    }

    #[test]
    fn test_every_marker_is_matched() {
        assert_eq!(MARKER_PATTERNS.len(), TITLE_MARKERS.len());

        for (marker, replacement) in TITLE_MARKERS {
            assert_eq!(clean_title(&marker.to_uppercase()), *replacement);
        }
    }
}
