//! Input payload: the article and its generated summary bullets.

use serde_json::Value;
use std::path::Path;

use crate::error::{Result, XaiError};

const BULLET_MARKERS: [char; 3] = ['-', '•', '*'];

/// A validated article together with its non-empty list of summary bullets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryPayload {
    article: String,
    bullets: Vec<String>,
}

impl SummaryPayload {
    /// Validate and build a payload. The article is trimmed; bullets are
    /// trimmed and blank ones dropped.
    pub fn new(article: impl Into<String>, bullets: Vec<String>) -> Result<Self> {
        let article = article.into().trim().to_string();
        if article.is_empty() {
            return Err(XaiError::invalid_payload(
                "the input payload must contain a non-empty 'article' field",
            ));
        }

        let bullets: Vec<String> = bullets
            .into_iter()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();
        if bullets.is_empty() {
            return Err(XaiError::invalid_payload(
                "the input payload must provide at least one summary bullet under 'summary'",
            ));
        }

        Ok(Self { article, bullets })
    }

    /// Build a payload from an already parsed JSON document.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| XaiError::invalid_payload("the input payload must be a JSON object"))?;

        let article = match object.get("article") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => {
                return Err(XaiError::invalid_payload(format!(
                    "'article' must be a string, got {}",
                    json_type_name(other)
                )));
            }
        };

        let bullets = match object.get("summary") {
            Some(summary) => normalize_bullets(summary)?,
            None => Vec::new(),
        };

        Self::new(article, bullets)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    pub fn article(&self) -> &str {
        &self.article
    }

    pub fn bullets(&self) -> &[String] {
        &self.bullets
    }
}

/// Read and validate a payload file.
pub fn load_payload(path: &Path) -> Result<SummaryPayload> {
    let content = std::fs::read_to_string(path)?;
    let payload = SummaryPayload::from_json_str(&content)?;
    tracing::info!(
        path = %path.display(),
        bullets = payload.bullets().len(),
        article_chars = payload.article().chars().count(),
        "Loaded summary payload"
    );
    Ok(payload)
}

/// Turn a `summary` value into trimmed, non-blank bullets.
///
/// Arrays keep one bullet per element; non-string elements become their JSON
/// text. Strings are split into lines and any leading bullet markers are
/// stripped. A `null` summary yields no bullets.
pub fn normalize_bullets(summary: &Value) -> Result<Vec<String>> {
    match summary {
        Value::Array(items) => Ok(items
            .iter()
            .map(stringify_item)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()),
        Value::String(text) => Ok(split_bullet_lines(text)),
        Value::Null => Ok(Vec::new()),
        other => Err(XaiError::invalid_payload(format!(
            "'summary' must be an array of strings or a string, got {}",
            json_type_name(other)
        ))),
    }
}

fn split_bullet_lines(text: &str) -> Vec<String> {
    text.split(is_line_break)
        .map(|line| line.trim().trim_start_matches(BULLET_MARKERS).trim())
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

// Unicode line boundaries. A "\r\n" pair
// yields an empty piece in between, which is dropped as blank.
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{1C}' | '\u{1D}' | '\u{1E}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

fn stringify_item(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_string_summary_with_markers() {
        let payload = SummaryPayload::from_value(&json!({
            "article": "Some article.",
            "summary": "- A\n- B\n"
        }))
        .unwrap();
        assert_eq!(payload.bullets(), &["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_string_summary_mixed_markers_and_crlf() {
        let bullets = normalize_bullets(&json!("• First point\r\n* Second point\r\n\r\n  -- Third  \n")).unwrap();
        assert_eq!(
            bullets,
            vec!["First point", "Second point", "Third"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_array_summary_trims_and_drops_blank() {
        let payload = SummaryPayload::from_value(&json!({
            "article": "  Body text.  ",
            "summary": ["  One. ", "", "   ", "Two."]
        }))
        .unwrap();
        assert_eq!(payload.article(), "Body text.");
        assert_eq!(payload.bullets(), &["One.".to_string(), "Two.".to_string()]);
    }

    #[test]
    fn test_array_items_are_stringified() {
        let bullets = normalize_bullets(&json!([42, true, null, "x"])).unwrap();
        assert_eq!(bullets, vec!["42", "true", "null", "x"]);
    }

    #[test]
    fn test_null_item_is_a_bullet() {
        let payload =
            SummaryPayload::from_value(&json!({"article": "x y", "summary": [null]})).unwrap();
        assert_eq!(payload.bullets(), &["null".to_string()]);
    }

    #[test]
    fn test_missing_article_fails() {
        let err = SummaryPayload::from_value(&json!({"summary": ["A"]})).unwrap_err();
        assert!(matches!(err, XaiError::InvalidPayload(_)));
    }

    #[test]
    fn test_whitespace_article_fails() {
        let err = SummaryPayload::from_value(&json!({"article": " \n\t ", "summary": ["A"]}))
            .unwrap_err();
        assert!(err.to_string().contains("article"));
    }

    #[test]
    fn test_non_string_article_fails() {
        let err = SummaryPayload::from_value(&json!({"article": 12, "summary": ["A"]})).unwrap_err();
        assert!(matches!(err, XaiError::InvalidPayload(_)));
    }

    #[test]
    fn test_empty_summary_array_fails() {
        let err = SummaryPayload::from_value(&json!({"article": "x", "summary": []})).unwrap_err();
        assert!(err.to_string().contains("summary"));
    }

    #[test]
    fn test_marker_only_summary_string_fails() {
        let result = SummaryPayload::from_value(&json!({"article": "x", "summary": "-\n • \n*\n  "}));
        assert!(matches!(result, Err(XaiError::InvalidPayload(_))));
    }

    #[test]
    fn test_missing_summary_fails() {
        assert!(SummaryPayload::from_value(&json!({"article": "x"})).is_err());
    }

    #[test]
    fn test_summary_object_rejected() {
        let result = SummaryPayload::from_value(&json!({"article": "x", "summary": {"a": 1}}));
        assert!(matches!(result, Err(XaiError::InvalidPayload(_))));
    }

    #[test]
    fn test_top_level_array_rejected() {
        assert!(SummaryPayload::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn test_invalid_json_is_serde_error() {
        let err = SummaryPayload::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, XaiError::Serde(_)));
    }

    #[test]
    fn test_load_payload_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.json");
        std::fs::write(
            &path,
            r#"{"article": "The council met.", "summary": ["Council met."]}"#,
        )
        .unwrap();
        let payload = load_payload(&path).unwrap();
        assert_eq!(payload.article(), "The council met.");
        assert_eq!(payload.bullets().len(), 1);
    }
}
