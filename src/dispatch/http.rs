use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use crate::dispatch::{GenerateCall, GenerationProvider};
use crate::error::ProviderError;
use crate::response::ProviderResponse;

pub const MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024; // 2MB

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Page size for model listing.
const LIST_PAGE_SIZE: u32 = 500;

/// Stop following `nextPageToken` after this many pages.
const MAX_LIST_PAGES: usize = 10;

#[derive(Clone)]
pub enum Credentials {
    /// Sent as `x-goog-api-key`.
    ApiKey(String),
    /// Sent as `Authorization: Bearer`.
    AccessToken(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey([REDACTED])"),
            Self::AccessToken(_) => f.write_str("AccessToken([REDACTED])"),
        }
    }
}

/// Gemini `generateContent` over HTTP.
pub struct HttpDispatch {
    client: Client,
    base_url: String,
    credentials: Credentials,
    timeout: Duration,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelPage {
    #[serde(default)]
    models: Vec<ModelName>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ModelName {
    name: String,
}

impl HttpDispatch {
    pub fn new(
        base_url: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            timeout,
        })
    }

    /// `models/{model}:generateContent`, accepting names that already carry
    /// the `models/` prefix.
    pub fn generate_url(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::ApiKey(key) => builder.header("x-goog-api-key", key),
            Credentials::AccessToken(token) => builder.bearer_auth(token),
        }
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Timeouts surface as `Timeout`, whether hit while sending or while
    /// reading the body.
    fn transport_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(self.timeout_ms())
        } else {
            ProviderError::Request(e)
        }
    }

    /// Read the body, refusing anything larger than `MAX_RESPONSE_BYTES`.
    async fn read_capped(&self, response: Response) -> Result<Vec<u8>, ProviderError> {
        if let Some(len) = response.content_length()
            && len > MAX_RESPONSE_BYTES as u64
        {
            return Err(ProviderError::SchemaParse(format!(
                "response too large: {len} bytes (max {MAX_RESPONSE_BYTES})"
            )));
        }

        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;
        if bytes.len() > MAX_RESPONSE_BYTES {
            return Err(ProviderError::SchemaParse(format!(
                "response too large: {} bytes (max {MAX_RESPONSE_BYTES})",
                bytes.len()
            )));
        }
        Ok(bytes.to_vec())
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ProviderError> {
        let response = self
            .authorize(builder)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            let body = self.read_capped(response).await.unwrap_or_default();
            return Err(ProviderError::AuthFailed {
                message: describe_error(status, &body),
            });
        }

        if !status.is_success() {
            let body = self.read_capped(response).await.unwrap_or_default();
            let code = serde_json::from_slice::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.status);
            return Err(ProviderError::Api {
                status: Some(status.as_u16()),
                code,
                message: describe_error(status, &body),
            });
        }

        Ok(response)
    }
}

impl GenerationProvider for HttpDispatch {
    async fn generate(&self, call: &GenerateCall<'_>) -> Result<ProviderResponse, ProviderError> {
        let body = serde_json::json!({
            "contents": [{"role": "user", "parts": [{"text": call.prompt}]}],
            "generationConfig": {
                "temperature": call.temperature,
                "maxOutputTokens": call.max_output_tokens,
            }
        });

        let builder = self.client.post(self.generate_url(call.model)).json(&body);
        let response = self.send(builder).await?;
        let bytes = self.read_capped(response).await?;

        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| ProviderError::SchemaParse(format!("failed to parse response: {e}")))?;

        Ok(ProviderResponse::new(value))
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let mut builder = self
                .client
                .get(&url)
                .query(&[("pageSize", LIST_PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                builder = builder.query(&[("pageToken", token)]);
            }

            let response = self.send(builder).await?;
            let bytes = self.read_capped(response).await?;
            let page: ModelPage = serde_json::from_slice(&bytes).map_err(|e| {
                ProviderError::SchemaParse(format!("failed to parse model list: {e}"))
            })?;

            names.extend(page.models.into_iter().map(|m| m.name));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(names)
    }
}

/// `"404 NOT_FOUND: models/x is not found"` from a Google error envelope,
/// or the status plus raw body when the envelope is missing.
fn describe_error(status: reqwest::StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let kind = envelope.error.status.unwrap_or_default();
            let message = envelope.error.message.unwrap_or_default();
            format!("{} {kind}: {message}", status.as_u16())
        }
        Err(_) => format!("{status}: {}", String::from_utf8_lossy(body)),
    }
}
