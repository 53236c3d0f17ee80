use thiserror::Error;

/// Message fragments that mark a provider failure as retryable on the next
/// candidate. Matched case-insensitively against the rendered error.
///
/// Known weakness: an unrelated error whose text happens to mention "quota"
/// is treated as retryable too.
const RETRYABLE_MARKERS: &[&str] = &["not_found", "resource_exhausted", "quota"];

/// How the requester reacts to a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Model unavailable or quota/rate exhausted: advance to the next candidate.
    Retryable,
    /// Anything else: abort the whole request.
    Fatal,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{message}")]
    Api {
        status: Option<u16>,
        /// Provider status string, e.g. `NOT_FOUND` or `RESOURCE_EXHAUSTED`.
        code: Option<String>,
        message: String,
    },

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("timeout after {0}ms")]
    Timeout(u64),

    #[error("auth failed: {message}")]
    AuthFailed { message: String },

    #[error("schema parse error: {0}")]
    SchemaParse(String),
}

impl ProviderError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Classify by status code first, then by substring match on the message.
    pub fn classify(&self) -> ErrorClass {
        if matches!(self.status(), Some(404 | 429)) {
            return ErrorClass::Retryable;
        }

        let mut haystack = self.to_string().to_lowercase();
        if let Self::Api { code: Some(code), .. } = self {
            haystack.push(' ');
            haystack.push_str(&code.to_lowercase());
        }

        if RETRYABLE_MARKERS.iter().any(|m| haystack.contains(m)) {
            ErrorClass::Retryable
        } else {
            ErrorClass::Fatal
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.classify() == ErrorClass::Retryable
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Error)]
pub enum AskError {
    #[error("no credentials: set GOOGLE_API_KEY or GOOGLE_OAUTH_ACCESS_TOKEN")]
    MissingCredentials,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Provider(ProviderError),

    #[error("{}", no_candidate_message(.attempted, .suggestions, .last))]
    NoCandidateSucceeded {
        attempted: Vec<String>,
        suggestions: Vec<String>,
        #[source]
        last: Box<ProviderError>,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn no_candidate_message(
    attempted: &[String],
    suggestions: &[String],
    last: &ProviderError,
) -> String {
    let mut msg = format!(
        "all candidate models failed: {} (last error: {last})",
        attempted.join(", ")
    );
    if !suggestions.is_empty() {
        msg.push_str(&format!(". Suggestions: {}", suggestions.join(", ")));
    }
    msg
}

impl AskError {
    /// Short message safe to print to an end user. Omits upstream bodies
    /// for transport-level failures.
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(ProviderError::Request(_)) => {
                "request to model provider failed".to_string()
            }
            Self::Provider(ProviderError::Timeout(ms)) => {
                format!("model provider timed out after {ms}ms")
            }
            Self::Provider(ProviderError::AuthFailed { message }) => {
                format!("authentication failed: {message}")
            }
            Self::Provider(ProviderError::SchemaParse(_)) => {
                "failed to parse model provider response".to_string()
            }
            Self::NoCandidateSucceeded {
                attempted,
                suggestions,
                ..
            } => {
                if suggestions.is_empty() {
                    format!("no model answered; tried {}", attempted.join(", "))
                } else {
                    format!(
                        "no model answered; tried {}. Did you mean: {}?",
                        attempted.join(", "),
                        suggestions.join(", ")
                    )
                }
            }
            other => other.to_string(),
        }
    }
}
