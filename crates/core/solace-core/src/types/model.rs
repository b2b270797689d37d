//! External model collaborators consumed by the engine

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Raw output of an emotion/sentiment model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierOutput {
    /// Model-specific label, e.g. `"positive"`, `"LABEL_0"`, `"joy"`
    pub label: String,
    /// Model confidence for the label
    pub score: f32,
}

/// Parameters for a text generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateTextParams {
    /// Fully rendered prompt
    pub prompt: String,
    /// Upper bound on generated tokens
    pub max_tokens: usize,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Stop sequences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl GenerateTextParams {
    /// Create params with no temperature override and no stop sequences
    pub fn new(prompt: impl Into<String>, max_tokens: usize) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
            temperature: None,
            stop: Vec::new(),
        }
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Any label-producing emotion or sentiment model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Classify text into a single label with a score
    async fn classify(&self, text: &str) -> Result<ClassifierOutput>;
}

/// Any text generation model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for the prompt
    async fn generate(&self, params: GenerateTextParams) -> Result<String>;
}
