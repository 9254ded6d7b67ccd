//! Playground helpers: template variables, token and cost estimates, and
//! history retention.
//!
//! A playground run takes a list of message templates, substitutes the
//! user-supplied variable values, streams the model response, and stores the
//! finished exchange as a test history record. Everything here is pure so the
//! same rules apply to the server and to any client driving a session.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default placeholder opening delimiter.
pub const DEFAULT_VARIABLE_PREFIX: &str = "{{";

/// Default placeholder closing delimiter.
pub const DEFAULT_VARIABLE_SUFFIX: &str = "}}";

/// Multiplier for rough token estimation from word count.
const TOKEN_ESTIMATE_MULTIPLIER: f64 = 1.3;

/// Prices are quoted per this many tokens.
pub const PRICE_UNIT_TOKENS: f64 = 1_000_000.0;

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// Opening and closing markers around a template variable name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDelimiters {
    pub prefix: String,
    pub suffix: String,
}

impl Default for VariableDelimiters {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_VARIABLE_PREFIX.to_string(),
            suffix: DEFAULT_VARIABLE_SUFFIX.to_string(),
        }
    }
}

impl VariableDelimiters {
    /// Build delimiters, rejecting empty markers.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Result<Self, CoreError> {
        let delimiters = Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        };
        if delimiters.prefix.is_empty() || delimiters.suffix.is_empty() {
            return Err(CoreError::Validation(
                "Variable prefix and suffix must not be empty".to_string(),
            ));
        }
        Ok(delimiters)
    }

    /// Resolve optional markers, falling back to the defaults per side.
    pub fn from_parts(prefix: Option<&str>, suffix: Option<&str>) -> Result<Self, CoreError> {
        Self::new(
            prefix.unwrap_or(DEFAULT_VARIABLE_PREFIX),
            suffix.unwrap_or(DEFAULT_VARIABLE_SUFFIX),
        )
    }
}

/// A placeholder occurrence: byte range of the whole token plus the trimmed name.
struct Placeholder<'a> {
    start: usize,
    end: usize,
    name: &'a str,
}

fn scan_placeholders<'a>(template: &'a str, delimiters: &VariableDelimiters) -> Vec<Placeholder<'a>> {
    let prefix = delimiters.prefix.as_str();
    let suffix = delimiters.suffix.as_str();
    let mut found = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = template[cursor..].find(prefix) {
        let start = cursor + offset;
        let inner_start = start + prefix.len();
        let Some(inner_len) = template[inner_start..].find(suffix) else {
            break;
        };
        let inner = &template[inner_start..inner_start + inner_len];

        // An unclosed prefix followed by a real placeholder: restart at the inner one.
        if inner.contains(prefix) {
            cursor = inner_start;
            continue;
        }

        let end = inner_start + inner_len + suffix.len();
        let name = inner.trim();
        if !name.is_empty() {
            found.push(Placeholder { start, end, name });
        }
        cursor = end;
    }

    found
}

/// Extract variable names from a set of templates.
///
/// Names are trimmed, de-duplicated, and returned in order of first
/// appearance across all templates.
pub fn extract_variables<'a, I>(templates: I, delimiters: &VariableDelimiters) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for template in templates {
        for placeholder in scan_placeholders(template, delimiters) {
            if seen.insert(placeholder.name) {
                names.push(placeholder.name.to_string());
            }
        }
    }
    names
}

/// Variables used by a list of chat messages.
pub fn extract_message_variables(
    messages: &[ChatMessage],
    delimiters: &VariableDelimiters,
) -> Vec<String> {
    extract_variables(messages.iter().map(|m| m.content.as_str()), delimiters)
}

/// Replace every placeholder that has a value. Unknown placeholders are kept verbatim.
pub fn substitute_variables(
    template: &str,
    values: &BTreeMap<String, String>,
    delimiters: &VariableDelimiters,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for placeholder in scan_placeholders(template, delimiters) {
        if let Some(value) = values.get(placeholder.name) {
            out.push_str(&template[last..placeholder.start]);
            out.push_str(value);
            last = placeholder.end;
        }
    }
    out.push_str(&template[last..]);
    out
}

/// Substitute variables into every message, preserving roles and order.
pub fn render_messages(
    messages: &[ChatMessage],
    values: &BTreeMap<String, String>,
    delimiters: &VariableDelimiters,
) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|m| ChatMessage {
            role: m.role,
            content: substitute_variables(&m.content, values, delimiters),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Token and cost estimation
// ---------------------------------------------------------------------------

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}'   // Hiragana, Katakana
        | '\u{3400}'..='\u{4DBF}' // CJK extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
        | '\u{AC00}'..='\u{D7AF}' // Hangul syllables
        | '\u{F900}'..='\u{FAFF}' // CJK compatibility ideographs
    )
}

/// Local tokenizer approximation.
///
/// Each CJK character counts as one token; remaining text counts as
/// `ceil(words * 1.3)`.
pub fn estimate_tokens(text: &str) -> usize {
    let cjk = text.chars().filter(|c| is_cjk(*c)).count();
    let words = text
        .split(|c: char| c.is_whitespace() || is_cjk(c))
        .filter(|w| !w.is_empty())
        .count();
    cjk + (words as f64 * TOKEN_ESTIMATE_MULTIPLIER).ceil() as usize
}

/// Token estimate for a whole message list.
pub fn estimate_message_tokens(messages: &[ChatMessage]) -> usize {
    messages.iter().map(|m| estimate_tokens(&m.content)).sum()
}

/// Monetary cost of an exchange. Prices are per [`PRICE_UNIT_TOKENS`] tokens;
/// a missing price counts as free.
pub fn estimate_cost(
    input_tokens: usize,
    output_tokens: usize,
    input_price: Option<f64>,
    output_price: Option<f64>,
) -> f64 {
    let input = input_tokens as f64 * input_price.unwrap_or(0.0);
    let output = output_tokens as f64 * output_price.unwrap_or(0.0);
    (input + output) / PRICE_UNIT_TOKENS
}

// ---------------------------------------------------------------------------
// Retention
// ---------------------------------------------------------------------------

/// Keep at most `max` records, evicting the oldest first.
///
/// On return `records` is ordered newest first. The evicted records are
/// returned oldest last.
pub fn retain_latest<T, K, F>(records: &mut Vec<T>, max: usize, created_at: F) -> Vec<T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    records.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    if records.len() <= max {
        return Vec::new();
    }
    records.split_off(max)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // -- delimiters --

    #[test]
    fn empty_delimiters_rejected() {
        assert_matches!(VariableDelimiters::new("", "}}"), Err(CoreError::Validation(_)));
        assert_matches!(VariableDelimiters::new("{{", ""), Err(CoreError::Validation(_)));
    }

    #[test]
    fn partial_delimiters_fall_back_per_side() {
        let d = VariableDelimiters::from_parts(Some("${"), None).unwrap();
        assert_eq!(d.prefix, "${");
        assert_eq!(d.suffix, DEFAULT_VARIABLE_SUFFIX);
    }

    // -- extract_variables --

    #[test]
    fn extracts_in_first_appearance_order() {
        let d = VariableDelimiters::default();
        let names = extract_variables(
            ["Translate {{text}} into {{ language }}", "Keep {{text}} short"],
            &d,
        );
        assert_eq!(names, vec!["text", "language"]);
    }

    #[test]
    fn custom_delimiters() {
        let d = VariableDelimiters::new("[[", "]]").unwrap();
        let names = extract_variables(["Hi [[name]], ignore {{other}}"], &d);
        assert_eq!(names, vec!["name"]);
    }

    #[test]
    fn blank_and_unclosed_placeholders_ignored() {
        let d = VariableDelimiters::default();
        let names = extract_variables(["{{  }} then {{open"], &d);
        assert!(names.is_empty());
    }

    #[test]
    fn stray_prefix_before_placeholder() {
        let d = VariableDelimiters::default();
        let names = extract_variables(["{{ oops {{name}}"], &d);
        assert_eq!(names, vec!["name"]);
    }

    // -- substitute_variables --

    #[test]
    fn substitutes_known_and_keeps_unknown() {
        let d = VariableDelimiters::default();
        let out = substitute_variables(
            "Say {{greeting}} to {{ who }} in {{lang}}",
            &values(&[("greeting", "hello"), ("who", "Ada")]),
            &d,
        );
        assert_eq!(out, "Say hello to Ada in {{lang}}");
    }

    #[test]
    fn render_preserves_roles() {
        let d = VariableDelimiters::default();
        let messages = vec![
            ChatMessage::system("You are {{persona}}"),
            ChatMessage::user("Hi"),
        ];
        let rendered = render_messages(&messages, &values(&[("persona", "a poet")]), &d);
        assert_eq!(rendered[0], ChatMessage::system("You are a poet"));
        assert_eq!(rendered[1], ChatMessage::user("Hi"));
    }

    // -- estimation --

    #[test]
    fn token_estimate_for_words() {
        assert_eq!(estimate_tokens(""), 0);
        // 5 words * 1.3 = 6.5, ceil = 7
        assert_eq!(estimate_tokens("a beautiful sunset over ocean"), 7);
    }

    #[test]
    fn token_estimate_counts_cjk_per_character() {
        assert_eq!(estimate_tokens("你好世界"), 4);
        // 2 CJK + 1 word (ceil 1.3 = 2)
        assert_eq!(estimate_tokens("你好 world"), 4);
    }

    #[test]
    fn cost_is_per_million_tokens() {
        let cost = estimate_cost(1_000_000, 500_000, Some(2.0), Some(4.0));
        assert!((cost - 4.0).abs() < 1e-9);
        assert_eq!(estimate_cost(1000, 1000, None, None), 0.0);
    }

    // -- retention --

    #[test]
    fn retention_evicts_oldest_first() {
        let mut records = vec![(1, "oldest"), (3, "newer"), (2, "older"), (4, "newest")];
        let evicted = retain_latest(&mut records, 2, |r| r.0);
        assert_eq!(records, vec![(4, "newest"), (3, "newer")]);
        assert_eq!(evicted, vec![(2, "older"), (1, "oldest")]);
    }

    #[test]
    fn retention_under_limit_keeps_everything() {
        let mut records = vec![1, 2];
        let evicted = retain_latest(&mut records, 5, |r| *r);
        assert_eq!(records.len(), 2);
        assert!(evicted.is_empty());
    }

    #[test]
    fn retention_of_zero_clears() {
        let mut records = vec![1, 2, 3];
        let evicted = retain_latest(&mut records, 0, |r| *r);
        assert!(records.is_empty());
        assert_eq!(evicted.len(), 3);
    }
}
