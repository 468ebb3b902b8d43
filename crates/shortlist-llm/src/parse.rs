//! Decoding model replies into JSON.

use serde_json::{Map, Value};
use shortlist_core::ExtractionError;

/// Strip a surrounding markdown code fence (```` ``` ```` or ```` ```json ````).
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string on the opening fence line.
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Parse a reply as a JSON object.
///
/// Code fences are removed first. If the remainder still is not JSON, the
/// outermost `{ ... }` span is tried before giving up.
///
/// # Errors
///
/// Returns [`ExtractionError::Malformed`] when no JSON object can be read.
pub fn parse_json_object(origin: &str, reply: &str) -> Result<Map<String, Value>, ExtractionError> {
    let body = strip_code_fences(reply);
    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(first_err) => outermost_object(body)
            .and_then(|span| serde_json::from_str::<Value>(span).ok())
            .ok_or_else(|| malformed(origin, &first_err.to_string()))?,
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(malformed(
            origin,
            &format!("expected a JSON object, got {}", kind(&other)),
        )),
    }
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn malformed(origin: &str, detail: &str) -> ExtractionError {
    ExtractionError::Malformed {
        origin: origin.to_string(),
        detail: detail.to_string(),
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  ```\n{}\n```  "), "{}");
        assert_eq!(strip_code_fences("{\"plain\": true}"), "{\"plain\": true}");
    }

    #[test]
    fn unterminated_fence_keeps_body() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn parses_fenced_object() {
        let map = parse_json_object("a.txt", "```json\n{\"name\": \"Ada\"}\n```").expect("object");
        assert_eq!(map["name"], "Ada");
    }

    #[test]
    fn recovers_object_wrapped_in_prose() {
        let map = parse_json_object("a.txt", "Here you go:\n{\"name\": \"Ada\"}\nThanks!")
            .expect("object");
        assert_eq!(map["name"], "Ada");
    }

    #[test]
    fn rejects_non_json() {
        let err = parse_json_object("a.txt", "I could not read the resume.").unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed { ref origin, .. } if origin == "a.txt"));
    }

    #[test]
    fn rejects_non_object_json() {
        let err = parse_json_object("a.txt", "[1, 2]").unwrap_err();
        assert!(err.to_string().contains("an array"), "{err}");
    }
}
