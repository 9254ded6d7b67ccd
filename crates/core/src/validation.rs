//! Field validation shared by the request handlers.

use crate::error::CoreError;

/// Maximum length for project names, in characters.
pub const MAX_PROJECT_NAME_LENGTH: usize = 100;

/// Maximum length for prompt names, in characters.
pub const MAX_PROMPT_NAME_LENGTH: usize = 100;

/// Maximum length for tag and category names, in characters.
pub const MAX_LABEL_NAME_LENGTH: usize = 50;

/// Color assigned to tags created without one.
pub const DEFAULT_TAG_COLOR: &str = "#3b82f6";

/// Color assigned to categories created without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#6366f1";

/// Validate a required name: non-blank and at most `max` characters.
pub fn validate_name(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    let len = value.chars().count();
    if len > max {
        return Err(CoreError::Validation(format!(
            "{field} exceeds maximum length of {max} characters (got {len})"
        )));
    }
    Ok(())
}

/// Validate an optional name: only checked when present.
pub fn validate_optional_name(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<(), CoreError> {
    match value {
        Some(v) => validate_name(field, v, max),
        None => Ok(()),
    }
}

/// Validate a `#rgb` / `#rrggbb` hex color.
pub fn validate_color(value: &str) -> Result<(), CoreError> {
    let hex = value.strip_prefix('#').unwrap_or("");
    let valid = matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(CoreError::Validation(format!(
            "color must be a hex value like #3b82f6 (got '{value}')"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_rejected() {
        let err = validate_name("name", "   ", 10).unwrap_err();
        assert!(err.to_string().contains("name is required"));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(validate_name("name", "提示词管理", 5).is_ok());
        assert!(validate_name("name", "提示词管理器", 5).is_err());
    }

    #[test]
    fn optional_name_skipped_when_absent() {
        assert!(validate_optional_name("name", None, 1).is_ok());
        assert!(validate_optional_name("name", Some(""), 1).is_err());
    }

    #[test]
    fn colors() {
        assert!(validate_color(DEFAULT_TAG_COLOR).is_ok());
        assert!(validate_color("#fff").is_ok());
        assert!(validate_color("3b82f6").is_err());
        assert!(validate_color("#3b82fz").is_err());
    }
}
