use serde::Deserialize;
use serde_json::Value;

use crate::parsers::TextExtractor;

/// First entry of `candidates`, reading its `content`.
///
/// `content` is either a plain string or the generateContent wire shape
/// `{"parts": [{"text": ...}, ...]}`, whose texts are concatenated.
pub struct FirstCandidateContent;

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CandidateContent {
    Plain(String),
    Parts { parts: Vec<Part> },
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl TextExtractor for FirstCandidateContent {
    fn name(&self) -> &'static str {
        "candidates[0].content"
    }

    fn extract(&self, response: &Value) -> Option<String> {
        let first = response.get("candidates")?.as_array()?.first()?;
        let candidate = Candidate::deserialize(first).ok()?;

        let text = match candidate.content? {
            CandidateContent::Plain(s) => s,
            CandidateContent::Parts { parts } => {
                parts.into_iter().filter_map(|p| p.text).collect::<String>()
            }
        };

        (!text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_parts_of_first_candidate_only() {
        let v = json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Bras"}, {"text": "ília"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        });
        assert_eq!(FirstCandidateContent.extract(&v), Some("Brasília".to_string()));
    }

    #[test]
    fn plain_string_content() {
        let v = json!({"candidates": [{"content": "answer"}]});
        assert_eq!(FirstCandidateContent.extract(&v), Some("answer".to_string()));
    }

    #[test]
    fn missing_or_empty_content_yields_none() {
        assert_eq!(FirstCandidateContent.extract(&json!({"candidates": []})), None);
        assert_eq!(
            FirstCandidateContent.extract(&json!({"candidates": [{"finishReason": "SAFETY"}]})),
            None
        );
        assert_eq!(
            FirstCandidateContent.extract(&json!({"candidates": [{"content": {"parts": []}}]})),
            None
        );
    }
}
