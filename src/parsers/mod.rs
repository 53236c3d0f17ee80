pub mod fields;
pub mod gemini;
pub mod output;

use serde_json::Value;

/// One strategy for pulling answer text out of a provider response.
/// Returns `None` when the response does not have the shape it looks for.
pub trait TextExtractor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn extract(&self, response: &Value) -> Option<String>;
}

/// Extractors in priority order. The first non-empty result wins.
pub fn default_chain() -> [&'static dyn TextExtractor; 4] {
    [
        &fields::OutputTextField,
        &fields::TextField,
        &gemini::FirstCandidateContent,
        &output::OutputFragments,
    ]
}

/// Run the chain, falling back to the compact JSON rendering of the response.
pub fn extract_text(response: &Value) -> String {
    for extractor in default_chain() {
        if let Some(text) = extractor.extract(response) {
            tracing::debug!(extractor = extractor.name(), "extracted response text");
            return text;
        }
    }
    tracing::debug!("no extractor matched; using raw response");
    response.to_string()
}
