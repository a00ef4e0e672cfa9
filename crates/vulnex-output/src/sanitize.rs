//! Per-format value sanitizers.
//!
//! Flattened rows still carry lists of primitives and the odd very long
//! string. Spreadsheet cells have hard limits; columnar stores want scalars.

use serde_json::Value;

/// Excel URL length limit
pub const MAX_URL_LENGTH: usize = 2079;

/// Excel cell content limit
pub const MAX_CELL_LENGTH: usize = 32767;

/// Sanitize a value for a spreadsheet cell.
///
/// Lists are JSON-stringified; strings that look like URLs are truncated to
/// the URL limit, everything else to the cell limit.
pub fn sheet_value(value: &Value, column: &str) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => {
            let text = value.to_string();
            Value::String(truncate(text, MAX_CELL_LENGTH, column))
        }
        Value::String(s) => {
            if (s.starts_with("http://") || s.starts_with("https://"))
                && s.chars().count() > MAX_URL_LENGTH
            {
                Value::String(truncate(s.clone(), MAX_URL_LENGTH, column))
            } else {
                Value::String(truncate(s.clone(), MAX_CELL_LENGTH, column))
            }
        }
        other => other.clone(),
    }
}

/// Sanitize a value for columnar storage: lists and objects become JSON
/// strings, scalars pass through.
pub fn columnar_value(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        other => other.clone(),
    }
}

fn truncate(s: String, limit: usize, column: &str) -> String {
    if s.chars().count() <= limit {
        return s;
    }
    log::debug!(
        "Truncating value in column {column} from {} to {limit} characters",
        s.chars().count()
    );
    s.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn short_string_untouched() {
        assert_eq!(sheet_value(&json!("hello"), "c"), json!("hello"));
    }

    #[test]
    fn url_truncated_to_url_limit() {
        let url = format!("https://example.com/{}", "a".repeat(3000));
        let out = sheet_value(&json!(url), "c");
        assert_eq!(out.as_str().unwrap().chars().count(), MAX_URL_LENGTH);
    }

    #[test]
    fn url_at_limit_untouched() {
        let url = format!("https://{}", "a".repeat(MAX_URL_LENGTH - 8));
        let out = sheet_value(&json!(url.clone()), "c");
        assert_eq!(out.as_str().unwrap(), url);
    }

    #[test]
    fn long_non_url_truncated_to_cell_limit() {
        let s = "x".repeat(MAX_CELL_LENGTH + 100);
        let out = sheet_value(&json!(s), "c");
        assert_eq!(out.as_str().unwrap().chars().count(), MAX_CELL_LENGTH);
    }

    #[test]
    fn list_stringified_for_sheet() {
        let out = sheet_value(&json!(["a", "b"]), "c");
        assert_eq!(out, json!("[\"a\",\"b\"]"));
    }

    #[test]
    fn numbers_and_bools_pass_through_sheet() {
        assert_eq!(sheet_value(&json!(5), "c"), json!(5));
        assert_eq!(sheet_value(&json!(true), "c"), json!(true));
        assert_eq!(sheet_value(&Value::Null, "c"), Value::Null);
    }

    #[test]
    fn columnar_stringifies_lists() {
        assert_eq!(columnar_value(&json!([1, 2])), json!("[1,2]"));
        assert_eq!(columnar_value(&json!([])), json!("[]"));
    }

    #[test]
    fn columnar_scalars_pass_through() {
        assert_eq!(columnar_value(&json!(1.5)), json!(1.5));
        assert_eq!(columnar_value(&json!("s")), json!("s"));
        assert_eq!(columnar_value(&Value::Null), Value::Null);
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let s: String = "é".repeat(MAX_CELL_LENGTH + 10);
        let out = sheet_value(&json!(s), "c");
        assert_eq!(out.as_str().unwrap().chars().count(), MAX_CELL_LENGTH);
    }
}
