use serde_json::Value;

use crate::parsers::TextExtractor;

/// Collects text fragments from a generic `output` list:
/// `{"output": [{"content": [{"type": "output_text", "text": "..."}]}]}`.
/// Fragments are joined with newlines in source order.
///
/// Each content element is inspected on its own; malformed elements are
/// skipped without discarding their siblings.
pub struct OutputFragments;

/// Text contributed by one content element, if any.
fn fragment(element: &Value) -> Option<String> {
    let is_output_text = element.get("type").and_then(Value::as_str) == Some("output_text");
    match element.get("text").and_then(Value::as_str) {
        Some(text) if is_output_text || !text.is_empty() => Some(text.to_string()),
        None if is_output_text => Some(String::new()),
        _ => None,
    }
}

impl TextExtractor for OutputFragments {
    fn name(&self) -> &'static str {
        "output[].content[]"
    }

    fn extract(&self, response: &Value) -> Option<String> {
        let items = response.get("output")?.as_array()?;

        let parts: Vec<String> = items
            .iter()
            .filter_map(|item| item.get("content").and_then(Value::as_array))
            .flatten()
            .filter_map(fragment)
            .collect();

        if parts.is_empty() {
            return None;
        }

        Some(parts.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_fragments_with_newlines_in_order() {
        let v = json!({
            "output": [
                {"type": "message", "content": [
                    {"type": "output_text", "text": "first"},
                    {"type": "refusal"},
                    {"type": "other", "text": "second"}
                ]},
                {"type": "reasoning"},
                {"content": [{"type": "output_text", "text": "third"}]}
            ]
        });
        assert_eq!(OutputFragments.extract(&v), Some("first\nsecond\nthird".to_string()));
    }

    #[test]
    fn no_fragments_yields_none() {
        assert_eq!(OutputFragments.extract(&json!({"output": []})), None);
        assert_eq!(
            OutputFragments.extract(&json!({"output": [{"content": [{"type": "x", "text": ""}]}]})),
            None
        );
        assert_eq!(OutputFragments.extract(&json!({"output": "not a list"})), None);
    }

    #[test]
    fn malformed_siblings_do_not_hide_valid_fragments() {
        let v = json!({
            "output": [{"content": ["stray", {"type": "output_text", "text": "a"}]}]
        });
        assert_eq!(OutputFragments.extract(&v), Some("a".to_string()));

        let v = json!({
            "output": [{"content": [
                {"type": "image", "text": 5},
                {"type": "output_text", "text": "b"},
                {"text": "c"}
            ]}]
        });
        assert_eq!(OutputFragments.extract(&v), Some("b\nc".to_string()));
    }
}
