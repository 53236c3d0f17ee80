use serde_json::Value;

use crate::parsers::TextExtractor;

/// Top-level `output_text`: the aggregated full text some APIs expose.
pub struct OutputTextField;

/// Top-level `text`.
pub struct TextField;

fn non_empty_str(response: &Value, key: &str) -> Option<String> {
    response
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl TextExtractor for OutputTextField {
    fn name(&self) -> &'static str {
        "output_text"
    }

    fn extract(&self, response: &Value) -> Option<String> {
        non_empty_str(response, "output_text")
    }
}

impl TextExtractor for TextField {
    fn name(&self) -> &'static str {
        "text"
    }

    fn extract(&self, response: &Value) -> Option<String> {
        non_empty_str(response, "text")
    }
}
