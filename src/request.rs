use std::collections::HashSet;

use crate::error::AskError;

/// Sampling temperature sent with every attempt.
pub const DEFAULT_TEMPERATURE: f64 = 0.6;

/// Output-token cap when the caller does not configure one.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 65_536;

/// A validated question plus everything needed to ask it.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    model_candidates: Vec<String>,
    max_output_tokens: u32,
    temperature: f64,
    instructions: Option<String>,
}

impl GenerationRequest {
    /// Build a request from a primary model and an ordered fallback list.
    ///
    /// Candidate names are trimmed, blanks are skipped and duplicates are
    /// dropped keeping their first position, so the primary always comes first.
    pub fn new(
        prompt: impl Into<String>,
        primary: &str,
        fallbacks: &[String],
        max_output_tokens: u32,
    ) -> Result<Self, AskError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(AskError::InvalidRequest("prompt is empty".to_string()));
        }
        if max_output_tokens == 0 {
            return Err(AskError::InvalidRequest(
                "max_output_tokens must be positive".to_string(),
            ));
        }

        let model_candidates =
            candidate_models(std::iter::once(primary).chain(fallbacks.iter().map(String::as_str)));
        if model_candidates.is_empty() {
            return Err(AskError::InvalidRequest(
                "at least one model name is required".to_string(),
            ));
        }

        Ok(Self {
            prompt,
            model_candidates,
            max_output_tokens,
            temperature: DEFAULT_TEMPERATURE,
            instructions: None,
        })
    }

    /// Attach instruction text. Blank instructions are treated as absent.
    pub fn with_instructions(mut self, instructions: Option<String>) -> Self {
        self.instructions = instructions.filter(|i| !i.trim().is_empty());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Result<Self, AskError> {
        if !(0.0..=1.0).contains(&temperature) {
            return Err(AskError::InvalidRequest(format!(
                "temperature must be between 0.0 and 1.0, got {temperature}"
            )));
        }
        self.temperature = temperature;
        Ok(self)
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn model_candidates(&self) -> &[String] {
        &self.model_candidates
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    /// The text actually sent to the model.
    ///
    /// Instructions go inline instead of as a system/role message, since not
    /// every model endpoint accepts one.
    pub fn compose_prompt(&self) -> String {
        match &self.instructions {
            Some(instructions) => format!(
                "INSTRUCTIONS:\n{instructions}\n\nUSER_QUESTION:\n{}",
                self.prompt
            ),
            None => self.prompt.clone(),
        }
    }
}

/// Ordered, de-duplicated, non-blank model names.
pub fn candidate_models<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .filter(|n| seen.insert(*n))
        .map(str::to_string)
        .collect()
}

/// Split a comma-separated model list, dropping blank entries.
pub fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
