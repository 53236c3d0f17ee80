use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::dispatch::http::{Credentials, DEFAULT_BASE_URL};
use crate::error::{AskError, ConfigError};
use crate::request::{DEFAULT_MAX_OUTPUT_TOKENS, GenerationRequest, parse_model_list};

pub const DEFAULT_MODEL: &str = "gemini-pro-latest";

/// Fallback order when none is configured, most capable first.
pub const DEFAULT_FALLBACK_MODELS: &[&str] = &[
    "gemini-pro-latest",
    "gemini-3-pro-preview",
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-3-flash-preview",
];

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Config file looked up in the working directory when `ASKMODEL_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "askmodel.toml";

/// Optional TOML layer. Credentials are never read from the file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    model: Option<String>,
    fallback_models: Option<Vec<String>>,
    max_output_tokens: Option<u32>,
    instructions: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Clone)]
pub struct Config {
    pub model: String,
    pub fallback_models: Vec<String>,
    pub max_output_tokens: u32,
    pub instructions: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    credentials: Option<Credentials>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("model", &self.model)
            .field("fallback_models", &self.fallback_models)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("instructions", &self.instructions.as_ref().map(|_| "[SET]"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl Config {
    /// Read the optional config file, then apply environment overrides.
    pub fn load() -> Result<Self, AskError> {
        let file = match config_path() {
            Some(path) => Some(read_file(&path)?),
            None => None,
        };
        Self::from_sources(file.as_deref(), |key| env::var(key).ok())
    }

    /// Build from TOML text (if any) and an environment lookup.
    pub fn from_sources(
        toml_text: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AskError> {
        let file = match toml_text {
            Some(text) => toml::from_str(text).map_err(|source| ConfigError::Parse {
                path: "<config>".to_string(),
                source,
            })?,
            None => FileConfig::default(),
        };
        Ok(Self::resolve(file, env))
    }

    fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let model = var("GENAI_MODEL")
            .or(file.model)
            .map(|m| m.trim().to_string())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let fallback_models = match var("GENAI_FALLBACK_MODELS") {
            Some(raw) => parse_model_list(&raw),
            None => file.fallback_models.unwrap_or_else(|| {
                DEFAULT_FALLBACK_MODELS.iter().map(|m| m.to_string()).collect()
            }),
        };

        let max_output_tokens = match var("GENAI_MAX_OUTPUT_TOKENS") {
            Some(raw) => parse_positive(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    "invalid GENAI_MAX_OUTPUT_TOKENS={raw:?}, using {DEFAULT_MAX_OUTPUT_TOKENS}"
                );
                DEFAULT_MAX_OUTPUT_TOKENS
            }),
            None => file
                .max_output_tokens
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
        };

        let instructions = var("GENAI_INSTRUCTIONS")
            .or(file.instructions)
            .filter(|i| !i.trim().is_empty());

        let base_url = var("GENAI_BASE_URL")
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = match var("GENAI_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().ok().filter(|s| *s > 0).unwrap_or_else(|| {
                tracing::warn!("invalid GENAI_TIMEOUT_SECS={raw:?}, using {DEFAULT_TIMEOUT_SECS}");
                DEFAULT_TIMEOUT_SECS
            }),
            None => file
                .timeout_secs
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        let credentials = var("GOOGLE_API_KEY")
            .map(Credentials::ApiKey)
            .or_else(|| var("GOOGLE_OAUTH_ACCESS_TOKEN").map(Credentials::AccessToken));

        if credentials.is_none() {
            tracing::warn!("GOOGLE_API_KEY not set; requests will fail until credentials are configured");
        }

        Config {
            model,
            fallback_models,
            max_output_tokens,
            instructions,
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            credentials,
        }
    }

    pub fn credentials(&self) -> Result<&Credentials, AskError> {
        self.credentials.as_ref().ok_or(AskError::MissingCredentials)
    }

    /// Validate and turn a question into a request using this configuration.
    pub fn to_request(&self, question: &str) -> Result<GenerationRequest, AskError> {
        Ok(GenerationRequest::new(
            question,
            &self.model,
            &self.fallback_models,
            self.max_output_tokens,
        )?
        .with_instructions(self.instructions.clone()))
    }
}

fn parse_positive(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

fn config_path() -> Option<PathBuf> {
    match env::var("ASKMODEL_CONFIG") {
        Ok(path) if !path.trim().is_empty() => Some(PathBuf::from(path)),
        _ => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })
}
