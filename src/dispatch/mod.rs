pub mod http;

use std::future::Future;

use crate::error::ProviderError;
use crate::response::ProviderResponse;

/// One generation attempt against one model.
#[derive(Debug, Clone, Copy)]
pub struct GenerateCall<'a> {
    pub model: &'a str,
    /// Final prompt text, instructions already folded in.
    pub prompt: &'a str,
    pub max_output_tokens: u32,
    pub temperature: f64,
}

/// The hosted text-generation service.
///
/// Any per-attempt timeout belongs to the implementation; the requester
/// only sees the resulting error.
pub trait GenerationProvider: Send + Sync {
    fn generate(
        &self,
        call: &GenerateCall<'_>,
    ) -> impl Future<Output = Result<ProviderResponse, ProviderError>> + Send;

    /// Model names the provider knows about. Used only for diagnostics.
    fn list_models(&self) -> impl Future<Output = Result<Vec<String>, ProviderError>> + Send {
        async { Ok(Vec::new()) }
    }
}
