use serde::Serialize;
use serde_json::Value;

use crate::parsers;

/// Raw provider reply. Shapes differ between API versions, so the body is
/// kept as untyped JSON and only read through the extractor chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    body: Value,
}

impl ProviderResponse {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// Response carrying only a plain `text` field.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(serde_json::json!({ "text": text.into() }))
    }

    pub fn text(&self) -> String {
        parsers::extract_text(&self.body)
    }
}

/// The answer plus what is known about how it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub text: String,
    pub model_used: String,
    /// Length of the user question in chars (instructions excluded).
    pub prompt_length: usize,
    /// Length of `text` in chars.
    pub response_length: usize,
    pub possibly_truncated: bool,
}

impl GenerationResult {
    pub fn new(text: String, model_used: String, prompt: &str, max_output_tokens: u32) -> Self {
        let response_length = text.chars().count();
        Self {
            possibly_truncated: possibly_truncated(response_length, max_output_tokens),
            text,
            model_used,
            prompt_length: prompt.chars().count(),
            response_length,
        }
    }
}

/// True when the response reached 90% of the output-token cap.
pub fn possibly_truncated(response_length: usize, max_output_tokens: u32) -> bool {
    // response_length >= 0.9 * max, kept in integers.
    (response_length as u64) * 10 >= u64::from(max_output_tokens) * 9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_boundary() {
        assert!(possibly_truncated(90, 100));
        assert!(!possibly_truncated(89, 100));
        assert!(possibly_truncated(100, 100));
        // 0.9 * 65536 = 58982.4
        assert!(!possibly_truncated(58_982, 65_536));
        assert!(possibly_truncated(58_983, 65_536));
    }

    #[test]
    fn lengths_count_chars() {
        let r = GenerationResult::new("Brasília".to_string(), "m".to_string(), "capital?", 100);
        assert_eq!(r.response_length, 8);
        assert_eq!(r.prompt_length, 8);
        assert!(!r.possibly_truncated);
    }

    #[test]
    fn from_text_round_trips_through_extraction() {
        assert_eq!(ProviderResponse::from_text("hi").text(), "hi");
    }
}
