//! Collaborator doubles for tests and demos

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::types::{ClassifierOutput, GenerateTextParams, SentimentClassifier, TextGenerator};
use crate::{Result, SolaceError};

/// Classifier that always returns the same label
#[derive(Debug, Clone)]
pub struct FixedClassifier {
    label: String,
    score: f32,
}

impl FixedClassifier {
    /// Always answer `label` with `score`
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

#[async_trait]
impl SentimentClassifier for FixedClassifier {
    async fn classify(&self, _text: &str) -> Result<ClassifierOutput> {
        Ok(ClassifierOutput {
            label: self.label.clone(),
            score: self.score,
        })
    }
}

/// Classifier that always fails
#[derive(Debug, Clone, Default)]
pub struct FailingClassifier;

#[async_trait]
impl SentimentClassifier for FailingClassifier {
    async fn classify(&self, _text: &str) -> Result<ClassifierOutput> {
        Err(SolaceError::model("classifier unavailable"))
    }
}

/// Generator that replays canned outputs in order and counts calls.
/// Once the script runs out every call fails.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    outputs: Mutex<VecDeque<Result<String>>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    /// Replay `outputs` as successful generations
    pub fn new<I, S>(outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            outputs: Mutex::new(outputs.into_iter().map(|s| Ok(s.into())).collect()),
            ..Default::default()
        }
    }

    /// Queue a failure after the current script
    pub fn then_fail(self, message: &str) -> Self {
        if let Ok(mut outputs) = self.outputs.lock() {
            outputs.push_back(Err(SolaceError::model(message)));
        }
        self
    }

    /// Number of generate calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, params: GenerateTextParams) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(params.prompt);
        }
        let next = self
            .outputs
            .lock()
            .map_err(|_| SolaceError::other("script lock poisoned"))?
            .pop_front();
        next.unwrap_or_else(|| Err(SolaceError::model("script exhausted")))
    }
}

/// Generator that sleeps before answering, for timeout tests
#[derive(Debug, Clone)]
pub struct SlowGenerator {
    delay: Duration,
    output: String,
}

impl SlowGenerator {
    /// Answer `output` after `delay`
    pub fn new(delay: Duration, output: impl Into<String>) -> Self {
        Self {
            delay,
            output: output.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for SlowGenerator {
    async fn generate(&self, _params: GenerateTextParams) -> Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok(self.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_generator_replays_then_fails() {
        let generator = ScriptedGenerator::new(["first reply here", "second reply here"]);
        let params = || GenerateTextParams::new("prompt", 10);

        assert_eq!(generator.generate(params()).await.unwrap(), "first reply here");
        assert_eq!(generator.generate(params()).await.unwrap(), "second reply here");
        assert!(generator.generate(params()).await.is_err());
        assert_eq!(generator.calls(), 3);
        assert_eq!(generator.prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_fixed_and_failing_classifiers() {
        let out = FixedClassifier::new("joy", 0.8).classify("x").await.unwrap();
        assert_eq!(out.label, "joy");
        assert!(FailingClassifier.classify("x").await.is_err());
    }
}
