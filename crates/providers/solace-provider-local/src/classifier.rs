//! Remote emotion classification
//!
//! Talks to any endpoint in the common text-classification shape: a POST of
//! `{"inputs": text}` answered by `[{"label", "score"}]` or, from pipelines
//! that batch, `[[{"label", "score"}]]`. The highest score wins. Label
//! normalization happens in the core adapter, not here.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use solace_core::{ClassifierOutput, Result, SentimentClassifier, SolaceError};
use std::sync::Arc;

use crate::{get_http_client, validate_url};

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f32,
}

/// Pick the best-scoring label from a classification response
pub fn best_label(body: Value) -> Result<ClassifierOutput> {
    let candidates: Vec<LabelScore> = match body {
        Value::Array(items) if items.first().map_or(false, Value::is_array) => items
            .into_iter()
            .next()
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default(),
        other @ Value::Array(_) => serde_json::from_value(other)?,
        Value::Object(map) if map.contains_key("error") => {
            return Err(SolaceError::model(format!(
                "Classifier returned an error: {}",
                map["error"]
            )))
        }
        other => {
            return Err(SolaceError::model(format!(
                "Unexpected classifier response: {}",
                other
            )))
        }
    };

    candidates
        .into_iter()
        .filter(|c| c.score.is_finite())
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|c| ClassifierOutput {
            label: c.label,
            score: c.score,
        })
        .ok_or_else(|| SolaceError::model("Classifier returned no labels"))
}

/// Emotion classifier reached over HTTP
pub struct HttpEmotionClassifier {
    client: Arc<Client>,
    url: String,
    api_key: Option<String>,
}

impl HttpEmotionClassifier {
    /// Classifier posting to `url`
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        validate_url(&url)?;
        Ok(Self {
            client: get_http_client(),
            url,
            api_key: None,
        })
    }

    /// Send a bearer token with each request
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SentimentClassifier for HttpEmotionClassifier {
    async fn classify(&self, text: &str) -> Result<ClassifierOutput> {
        let mut request = self.client.post(&self.url).json(&ClassifyRequest { inputs: text });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await.map_err(|e| {
            SolaceError::model(format!("Classifier request to {} failed: {}", self.url, e))
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
            return Err(SolaceError::model(format!(
                "Classifier returned error status {}: {}",
                status, error_text
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| SolaceError::model(format!("Invalid classifier response: {}", e)))?;
        best_label(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_response() {
        let out = best_label(json!([
            {"label": "sadness", "score": 0.2},
            {"label": "fear", "score": 0.7},
            {"label": "joy", "score": 0.1}
        ]))
        .unwrap();
        assert_eq!(out.label, "fear");
        assert!((out.score - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_nested_response() {
        let out = best_label(json!([[
            {"label": "LABEL_0", "score": 0.05},
            {"label": "LABEL_2", "score": 0.9}
        ]]))
        .unwrap();
        assert_eq!(out.label, "LABEL_2");
    }

    #[test]
    fn test_error_shapes() {
        assert!(best_label(json!([])).is_err());
        assert!(best_label(json!([[]])).is_err());
        assert!(best_label(json!({"error": "model loading"})).is_err());
        assert!(best_label(json!("joy")).is_err());
        assert!(best_label(json!([{"name": "joy"}])).is_err());
    }

    #[test]
    fn test_constructor_validates_url() {
        assert!(HttpEmotionClassifier::new("http://localhost:8000/classify").is_ok());
        assert!(HttpEmotionClassifier::new("classify").is_err());
    }
}
