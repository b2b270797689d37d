//! Local HTTP collaborators for Solace
//!
//! Implements the core collaborator traits over HTTP:
//! - [`OllamaGenerator`]: text generation through Ollama's `/api/generate`
//! - [`HttpEmotionClassifier`]: any text-classification endpoint that
//!   answers with `[{label, score}]` (or the nested `[[...]]` form)
//!
//! Both keep traffic on machines you control; nothing here calls a hosted API
//! unless you point it at one.

#![warn(missing_docs)]
#![warn(clippy::all)]

use reqwest::Client;
use solace_core::{get_env_or, Result, SolaceError};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

pub mod classifier;
pub mod ollama;

pub use classifier::{best_label, HttpEmotionClassifier};
pub use ollama::{NdjsonAssembler, OllamaGenerator};

/// Default Ollama server
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
/// Default Ollama model
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
/// Default cap on assembled response text
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 1024 * 1024;

/// Shared HTTP client for connection pooling to local servers
static HTTP_CLIENT: OnceLock<Arc<Client>> = OnceLock::new();

/// Get or initialize the shared HTTP client
fn get_http_client() -> Arc<Client> {
    HTTP_CLIENT
        .get_or_init(|| {
            Arc::new(
                Client::builder()
                    .pool_max_idle_per_host(8)
                    .pool_idle_timeout(Duration::from_secs(300))
                    .tcp_keepalive(Duration::from_secs(60))
                    .timeout(Duration::from_secs(120))
                    .connect_timeout(Duration::from_secs(10))
                    .build()
                    .unwrap_or_else(|e| {
                        panic!(
                            "Failed to create HTTP client: {}. This is a configuration error.",
                            e
                        )
                    }),
            )
        })
        .clone()
}

/// Validate an endpoint URL
pub fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(SolaceError::config("Base URL cannot be empty"));
    }

    if url.len() > 2048 {
        return Err(SolaceError::config("URL is too long (max 2048 characters)"));
    }

    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or_else(|| {
            SolaceError::config(format!(
                "Invalid URL format: '{}'. Must start with http:// or https://",
                url
            ))
        })?;

    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    if host.is_empty() || host.chars().any(char::is_whitespace) {
        return Err(SolaceError::config(format!("URL '{}' has no valid host", url)));
    }

    Ok(())
}

/// Validate model name (basic sanitization)
pub fn validate_model_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SolaceError::config("Model name cannot be empty"));
    }

    if name.len() > 256 {
        return Err(SolaceError::config(
            "Model name is too long (max 256 characters)",
        ));
    }

    if name.contains('\0') || name.contains('\n') || name.contains('\r') {
        return Err(SolaceError::config("Model name contains invalid characters"));
    }

    Ok(())
}

/// Where the local collaborators live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalProviderConfig {
    /// Ollama base URL
    pub ollama_url: String,
    /// Ollama model name
    pub ollama_model: String,
    /// Classification endpoint; keyword scoring is used when unset
    pub classifier_url: Option<String>,
    /// Bearer token for the classification endpoint
    pub classifier_api_key: Option<String>,
}

impl Default for LocalProviderConfig {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            classifier_url: None,
            classifier_api_key: None,
        }
    }
}

impl LocalProviderConfig {
    /// Read `SOLACE_OLLAMA_URL`, `SOLACE_OLLAMA_MODEL`,
    /// `SOLACE_CLASSIFIER_URL` and `SOLACE_CLASSIFIER_API_KEY`
    pub fn from_env() -> Result<Self> {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        let config = Self {
            ollama_url: get_env_or("SOLACE_OLLAMA_URL", DEFAULT_OLLAMA_URL),
            ollama_model: get_env_or("SOLACE_OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL),
            classifier_url: non_empty("SOLACE_CLASSIFIER_URL"),
            classifier_api_key: non_empty("SOLACE_CLASSIFIER_API_KEY"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check URLs and model name
    pub fn validate(&self) -> Result<()> {
        validate_url(&self.ollama_url)?;
        validate_model_name(&self.ollama_model)?;
        if let Some(url) = &self.classifier_url {
            validate_url(url)?;
        }
        Ok(())
    }

    /// Generator for the configured Ollama server
    pub fn generator(&self) -> Result<OllamaGenerator> {
        OllamaGenerator::new(Some(self.ollama_url.clone()), Some(self.ollama_model.clone()))
    }

    /// Classifier for the configured endpoint, if any
    pub fn classifier(&self) -> Result<Option<HttpEmotionClassifier>> {
        self.classifier_url
            .as_ref()
            .map(|url| {
                let mut classifier = HttpEmotionClassifier::new(url.clone())?;
                if let Some(key) = &self.classifier_api_key {
                    classifier = classifier.with_api_key(key.clone());
                }
                Ok(classifier)
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_validation() {
        assert!(validate_url("http://localhost:11434").is_ok());
        assert!(validate_url("https://example.com/models/emotion").is_ok());

        assert!(validate_url("").is_err());
        assert!(validate_url("not-a-url").is_err());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("http://").is_err());
        assert!(validate_url(&format!("http://{}", "a".repeat(2050))).is_err());
    }

    #[test]
    fn test_model_name_validation() {
        assert!(validate_model_name("llama3.2").is_ok());
        assert!(validate_model_name("qwen2.5:3b").is_ok());

        assert!(validate_model_name("").is_err());
        assert!(validate_model_name(&"a".repeat(257)).is_err());
        assert!(validate_model_name("model\nname").is_err());
    }

    #[test]
    fn test_default_config() {
        let config = LocalProviderConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.classifier().unwrap().is_none());
        assert!(config.generator().is_ok());
    }

    #[test]
    fn test_config_with_classifier() {
        let config = LocalProviderConfig {
            classifier_url: Some("http://localhost:8000/classify".to_string()),
            classifier_api_key: Some("secret".to_string()),
            ..Default::default()
        };
        assert!(config.classifier().unwrap().is_some());

        let bad = LocalProviderConfig {
            classifier_url: Some("localhost:8000".to_string()),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
