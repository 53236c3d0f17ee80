use tracing::Instrument;

use crate::dispatch::{GenerateCall, GenerationProvider};
use crate::error::{AskError, ErrorClass, ProviderError};
use crate::observer::{AttemptInfo, NoopObserver, Observer, instruction_snippet};
use crate::request::GenerationRequest;
use crate::response::GenerationResult;

/// Max model suggestions attached to an exhausted-candidates error.
pub const MAX_SUGGESTIONS: usize = 6;

/// Asks each candidate model in turn until one answers.
///
/// Attempts run strictly one after another: a later candidate is only
/// contacted after every earlier one failed with a retryable error. The
/// requester holds no mutable state and may be shared between callers.
pub struct AnswerRequester<P, O = NoopObserver> {
    provider: P,
    observer: O,
}

impl<P: GenerationProvider> AnswerRequester<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            observer: NoopObserver,
        }
    }
}

impl<P: GenerationProvider, O: Observer> AnswerRequester<P, O> {
    pub fn with_observer<O2: Observer>(self, observer: O2) -> AnswerRequester<P, O2> {
        AnswerRequester {
            provider: self.provider,
            observer,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn answer(&self, request: &GenerationRequest) -> Result<GenerationResult, AskError> {
        let prompt = request.compose_prompt();
        let prompt_length = request.prompt().chars().count();
        let snippet = request.instructions().map(instruction_snippet);

        let mut attempted: Vec<String> = Vec::new();
        let mut last_error: Option<ProviderError> = None;

        for model in request.model_candidates() {
            attempted.push(model.clone());

            let span = tracing::info_span!(
                "genai.generate_content",
                model = %model,
                prompt_length,
                max_output_tokens = request.max_output_tokens(),
                model_used = tracing::field::Empty,
                response_length = tracing::field::Empty,
                possible_truncation = tracing::field::Empty,
            );

            let attempt = AttemptInfo {
                model,
                prompt_length,
                max_output_tokens: request.max_output_tokens(),
                instruction_snippet: snippet,
            };
            let call = GenerateCall {
                model,
                prompt: &prompt,
                max_output_tokens: request.max_output_tokens(),
                temperature: request.temperature(),
            };

            let outcome = async {
                let _ = self.observer.on_attempt(&attempt);
                self.provider.generate(&call).await
            }
            .instrument(span.clone())
            .await;

            match outcome {
                Ok(response) => {
                    let result = GenerationResult::new(
                        response.text(),
                        model.clone(),
                        request.prompt(),
                        request.max_output_tokens(),
                    );
                    span.record("model_used", result.model_used.as_str());
                    span.record("response_length", result.response_length);
                    if result.possibly_truncated {
                        span.record("possible_truncation", true);
                    }
                    span.in_scope(|| {
                        let _ = self.observer.on_success(&result);
                        if result.possibly_truncated {
                            let _ = self
                                .observer
                                .on_truncation(&result, request.max_output_tokens());
                        }
                    });
                    return Ok(result);
                }
                Err(e) => match e.classify() {
                    ErrorClass::Retryable => {
                        span.in_scope(|| {
                            let _ = self.observer.on_retryable_failure(model, &e.to_string());
                        });
                        last_error = Some(e);
                    }
                    ErrorClass::Fatal => {
                        tracing::error!(model = %model, "model request failed: {e}");
                        return Err(AskError::Provider(e));
                    }
                },
            }
        }

        // A validated request always has at least one candidate, so the loop
        // ran and every attempt stored its error.
        let last = last_error.ok_or_else(|| {
            AskError::InvalidRequest("no candidate models to try".to_string())
        })?;

        let suggestions = self.suggestions().await;
        Err(AskError::NoCandidateSucceeded {
            attempted,
            suggestions,
            last: Box::new(last),
        })
    }

    /// Best-effort model suggestions; a listing failure yields none.
    async fn suggestions(&self) -> Vec<String> {
        match self.provider.list_models().await {
            Ok(names) => suggest_models(&names),
            Err(e) => {
                tracing::warn!("failed to list models: {e}");
                Vec::new()
            }
        }
    }
}

/// Gemini model names from a provider listing, `models/` prefix stripped.
pub fn suggest_models(names: &[String]) -> Vec<String> {
    names
        .iter()
        .filter(|n| n.contains("gemini"))
        .map(|n| n.split_once('/').map_or(n.as_str(), |(_, rest)| rest).to_string())
        .take(MAX_SUGGESTIONS)
        .collect()
}
