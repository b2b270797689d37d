//! Ollama text generation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use solace_core::{GenerateTextParams, Result, SolaceError, TextGenerator};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    get_http_client, validate_model_name, validate_url, DEFAULT_MAX_RESPONSE_SIZE,
    DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL,
};

/// Ollama API request
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

/// Ollama generation options
#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    num_predict: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

/// One line of Ollama's streamed response
#[derive(Debug, Deserialize)]
struct OllamaChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

/// Joins newline-delimited JSON chunks into one response text.
///
/// Chunks may split a line anywhere, including inside a multi-byte
/// character; the raw tail is kept until the next chunk completes it. Lines
/// that are not valid UTF-8 or not valid JSON are skipped.
#[derive(Debug)]
pub struct NdjsonAssembler {
    buffer: Vec<u8>,
    assembled: String,
    max_size: usize,
    done: bool,
}

impl NdjsonAssembler {
    /// Assembler that fails once the text exceeds `max_size` bytes
    pub fn new(max_size: usize) -> Self {
        Self {
            buffer: Vec::new(),
            assembled: String::new(),
            max_size,
            done: false,
        }
    }

    /// Feed one network chunk
    pub fn push(&mut self, chunk: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(chunk);
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.accept_line(&line[..pos]);
        }
        self.check_size()
    }

    /// True once a line with `"done": true` was seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Flush the trailing line and return the text
    pub fn finish(mut self) -> Result<String> {
        let tail = std::mem::take(&mut self.buffer);
        self.accept_line(&tail);
        self.check_size()?;
        Ok(self.assembled)
    }

    fn accept_line(&mut self, line: &[u8]) {
        let l = match std::str::from_utf8(line) {
            Ok(l) => l.trim(),
            Err(e) => {
                debug!("Skipping stream line with invalid UTF-8: {}", e);
                return;
            }
        };
        if l.is_empty() {
            return;
        }
        match serde_json::from_str::<OllamaChunk>(l) {
            Ok(obj) => {
                self.assembled.push_str(&obj.response);
                self.done |= obj.done;
            }
            Err(e) => debug!("Skipping malformed stream line: {}", e),
        }
    }

    fn check_size(&self) -> Result<()> {
        if self.assembled.len() > self.max_size {
            return Err(SolaceError::model(format!(
                "Response text too large: {} bytes (max {} bytes)",
                self.assembled.len(),
                self.max_size
            )));
        }
        Ok(())
    }
}

/// Text generator backed by an Ollama server
pub struct OllamaGenerator {
    client: Arc<Client>,
    base_url: String,
    model: String,
    max_response_size: usize,
}

impl OllamaGenerator {
    /// Create a generator, defaulting to a local server and model
    ///
    /// # Errors
    /// Returns an error if the URL or model name is invalid
    pub fn new(base_url: Option<String>, model: Option<String>) -> Result<Self> {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        validate_url(&base_url)?;

        let model = model.unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string());
        validate_model_name(&model)?;

        Ok(Self {
            client: get_http_client(),
            base_url,
            model,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        })
    }

    /// Set maximum response size in bytes
    pub fn with_max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }

    /// Server base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Model name sent with each request
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, params: GenerateTextParams) -> Result<OllamaRequest> {
        if params.prompt.trim().is_empty() {
            return Err(SolaceError::validation("Prompt cannot be empty"));
        }

        if params.prompt.len() > 1_000_000 {
            return Err(SolaceError::validation("Prompt is too long (max 1MB)"));
        }

        if let Some(temp) = params.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err(SolaceError::validation(format!(
                    "Temperature must be between 0.0 and 2.0, got {}",
                    temp
                )));
            }
        }

        Ok(OllamaRequest {
            model: self.model.clone(),
            prompt: params.prompt,
            stream: true,
            options: Some(OllamaOptions {
                temperature: params.temperature,
                num_predict: params.max_tokens,
                stop: params.stop,
            }),
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, params: GenerateTextParams) -> Result<String> {
        let request = self.build_request(params)?;

        let url = format!("{}/api/generate", self.base_url);
        let mut resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                SolaceError::model(format!(
                    "Ollama API request failed: {}. Check if Ollama is running at {}",
                    e, self.base_url
                ))
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
            return Err(SolaceError::model(format!(
                "Ollama API returned error status {}: {}",
                status, error_text
            )));
        }

        let mut assembler = NdjsonAssembler::new(self.max_response_size);
        loop {
            match resp.chunk().await {
                Ok(Some(chunk)) => {
                    assembler.push(&chunk)?;
                    if assembler.is_done() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Ollama stream interrupted: {}", e);
                    break;
                }
            }
        }

        let text = assembler.finish()?;
        debug!(model = %self.model, bytes = text.len(), "Ollama generation finished");
        Ok(text)
    }
}
