use thiserror::Error;

use crate::response::GenerationResult;

/// Instruction text recorded on an attempt is capped to this many chars.
pub const INSTRUCTION_SNIPPET_CHARS: usize = 256;

/// Failure inside an observer. The requester discards these.
#[derive(Debug, Error)]
#[error("observer error: {0}")]
pub struct ObserverError(pub String);

/// What is known when an attempt starts.
#[derive(Debug, Clone, Copy)]
pub struct AttemptInfo<'a> {
    pub model: &'a str,
    pub prompt_length: usize,
    pub max_output_tokens: u32,
    pub instruction_snippet: Option<&'a str>,
}

/// Diagnostic hooks around each attempt.
///
/// Implementations must not influence the answer; every hook result is
/// ignored by the requester.
pub trait Observer: Send + Sync {
    fn on_attempt(&self, _attempt: &AttemptInfo<'_>) -> Result<(), ObserverError> {
        Ok(())
    }

    fn on_success(&self, _result: &GenerationResult) -> Result<(), ObserverError> {
        Ok(())
    }

    fn on_truncation(
        &self,
        _result: &GenerationResult,
        _max_output_tokens: u32,
    ) -> Result<(), ObserverError> {
        Ok(())
    }

    fn on_retryable_failure(&self, _model: &str, _error: &str) -> Result<(), ObserverError> {
        Ok(())
    }
}

/// Observer that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Emits `tracing` events for every hook. Events land inside the
/// requester's per-attempt `genai.generate_content` span.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_attempt(&self, attempt: &AttemptInfo<'_>) -> Result<(), ObserverError> {
        tracing::info!(
            instruction_snippet = attempt.instruction_snippet,
            "trying model {} (prompt_len={}, max_output_tokens={})",
            attempt.model,
            attempt.prompt_length,
            attempt.max_output_tokens
        );
        Ok(())
    }

    fn on_success(&self, result: &GenerationResult) -> Result<(), ObserverError> {
        tracing::info!(
            model_used = %result.model_used,
            response_length = result.response_length,
            prompt_length = result.prompt_length,
            "using model {}",
            result.model_used
        );
        Ok(())
    }

    fn on_truncation(
        &self,
        result: &GenerationResult,
        max_output_tokens: u32,
    ) -> Result<(), ObserverError> {
        tracing::warn!(
            possible_truncation = true,
            "response of {} chars approaches max_output_tokens={} (possible truncation)",
            result.response_length,
            max_output_tokens
        );
        Ok(())
    }

    fn on_retryable_failure(&self, model: &str, error: &str) -> Result<(), ObserverError> {
        tracing::warn!(model, "model unavailable, trying next candidate: {error}");
        Ok(())
    }
}

/// First `INSTRUCTION_SNIPPET_CHARS` chars of the instructions.
pub fn instruction_snippet(instructions: &str) -> &str {
    match instructions.char_indices().nth(INSTRUCTION_SNIPPET_CHARS) {
        Some((idx, _)) => &instructions[..idx],
        None => instructions,
    }
}
