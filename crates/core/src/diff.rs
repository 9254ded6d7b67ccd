//! Text diff between two prompt versions.
//!
//! Uses Myers' algorithm (via `similar`) over word or line tokens, counts
//! inserted and deleted units, and renders an HTML fragment that highlights
//! the changes.

use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff};

/// CSS class wrapping inserted runs in [`DiffResult::diff_html`].
pub const ADDED_CLASS: &str = "diff-added";

/// CSS class wrapping deleted runs in [`DiffResult::diff_html`].
pub const DELETED_CLASS: &str = "diff-deleted";

/// Token unit used for the diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffGranularity {
    /// Whitespace-separated words. Whitespace runs are tokens but not units.
    #[default]
    Word,
    /// Whole lines, newline included.
    Line,
}

/// Summary and rendering of a diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Units present in the new text only.
    pub additions: usize,
    /// Units present in the old text only.
    pub deletions: usize,
    /// `(additions + deletions) / (units(old) + units(new))`, in `[0, 1]`.
    pub change_rate: f64,
    /// HTML-escaped text with changed runs wrapped in `<span>`s.
    pub diff_html: String,
}

/// Compute the diff from `old` to `new`.
///
/// Deterministic: identical inputs always produce identical results.
pub fn compute_diff(old: &str, new: &str, granularity: DiffGranularity) -> DiffResult {
    let mut config = TextDiff::configure();
    config.algorithm(Algorithm::Myers);
    let diff = match granularity {
        DiffGranularity::Word => config.diff_words(old, new),
        DiffGranularity::Line => config.diff_lines(old, new),
    };

    let mut additions = 0;
    let mut deletions = 0;
    let mut html = HtmlBuilder::default();

    for change in diff.iter_all_changes() {
        let value = change.value();
        match change.tag() {
            ChangeTag::Insert => additions += count_units(value, granularity),
            ChangeTag::Delete => deletions += count_units(value, granularity),
            ChangeTag::Equal => {}
        }
        html.push(change.tag(), value);
    }

    let total = count_units(old, granularity) + count_units(new, granularity);
    let change_rate = if total == 0 {
        0.0
    } else {
        (additions + deletions) as f64 / total as f64
    };

    DiffResult {
        additions,
        deletions,
        change_rate,
        diff_html: html.finish(),
    }
}

fn count_units(text: &str, granularity: DiffGranularity) -> usize {
    match granularity {
        DiffGranularity::Word => text.split_whitespace().count(),
        DiffGranularity::Line => text.lines().count(),
    }
}

// ---------------------------------------------------------------------------
// HTML rendering
// ---------------------------------------------------------------------------

/// Accumulates changes, merging consecutive runs with the same tag into one span.
#[derive(Default)]
struct HtmlBuilder {
    out: String,
    run: String,
    run_tag: Option<ChangeTag>,
}

impl HtmlBuilder {
    fn push(&mut self, tag: ChangeTag, value: &str) {
        if self.run_tag != Some(tag) {
            self.flush();
            self.run_tag = Some(tag);
        }
        self.run.push_str(value);
    }

    fn flush(&mut self) {
        let Some(tag) = self.run_tag.take() else {
            return;
        };
        let escaped = escape_html(&self.run);
        match tag {
            ChangeTag::Equal => self.out.push_str(&escaped),
            ChangeTag::Insert => {
                self.out
                    .push_str(&format!(r#"<span class="{ADDED_CLASS}">{escaped}</span>"#));
            }
            ChangeTag::Delete => {
                self.out
                    .push_str(&format!(r#"<span class="{DELETED_CLASS}">{escaped}</span>"#));
            }
        }
        self.run.clear();
    }

    fn finish(mut self) -> String {
        self.flush();
        self.out
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
