//! Emotion classifier adapter
//!
//! Wraps an optional external [`SentimentClassifier`] and always produces a
//! [`SentimentResult`]. Bare greetings short-circuit to neutral, model labels
//! are folded into the fixed emotion vocabulary, and any model failure falls
//! back to keyword scoring. Crisis level comes from a separate detector pass
//! that runs on every message, greetings included.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::DEFAULT_CLASSIFIER_TIMEOUT_MS;
use crate::detectors::{is_short_greeting, CrisisAssessment, CrisisDetector};
use crate::generation::with_timeout;
use crate::nlp::score_emotions;
use crate::types::{ClassifierOutput, Emotion, SentimentClassifier, SentimentResult, SentimentSource};

/// Model label vocabularies folded into [`Emotion`]
const LABEL_TABLE: &[(&str, Emotion)] = &[
    ("positive", Emotion::Joy),
    ("pos", Emotion::Joy),
    ("label_2", Emotion::Joy),
    ("happiness", Emotion::Joy),
    ("happy", Emotion::Joy),
    ("love", Emotion::Joy),
    ("optimism", Emotion::Joy),
    ("joy", Emotion::Joy),
    ("negative", Emotion::Sadness),
    ("neg", Emotion::Sadness),
    ("label_0", Emotion::Sadness),
    ("sad", Emotion::Sadness),
    ("sadness", Emotion::Sadness),
    ("angry", Emotion::Anger),
    ("anger", Emotion::Anger),
    ("anxiety", Emotion::Fear),
    ("nervousness", Emotion::Fear),
    ("fear", Emotion::Fear),
    ("surprise", Emotion::Surprise),
    ("disgust", Emotion::Disgust),
    ("neutral", Emotion::Neutral),
    ("label_1", Emotion::Neutral),
];

/// Fold a model label into the emotion vocabulary. Unknown labels are neutral.
pub fn normalize_label(label: &str) -> Emotion {
    let label = label.trim().to_lowercase();
    LABEL_TABLE
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, emotion)| *emotion)
        .unwrap_or(Emotion::Neutral)
}

/// Sentiment estimation with greeting, model and keyword paths
#[derive(Clone)]
pub struct EmotionClassifier {
    model: Option<Arc<dyn SentimentClassifier>>,
    crisis: CrisisDetector,
    timeout: Duration,
}

impl Default for EmotionClassifier {
    fn default() -> Self {
        Self::keyword_only()
    }
}

impl EmotionClassifier {
    /// Adapter over an external classifier
    pub fn new(model: Arc<dyn SentimentClassifier>) -> Self {
        Self {
            model: Some(model),
            crisis: CrisisDetector::default(),
            timeout: Duration::from_millis(DEFAULT_CLASSIFIER_TIMEOUT_MS),
        }
    }

    /// Adapter that only uses keyword scoring
    pub fn keyword_only() -> Self {
        Self {
            model: None,
            crisis: CrisisDetector::default(),
            timeout: Duration::from_millis(DEFAULT_CLASSIFIER_TIMEOUT_MS),
        }
    }

    /// Adapter over an optional classifier
    pub fn from_option(model: Option<Arc<dyn SentimentClassifier>>) -> Self {
        match model {
            Some(m) => Self::new(m),
            None => Self::keyword_only(),
        }
    }

    /// Bound each classifier call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the crisis phrase lists
    pub fn with_crisis_detector(mut self, detector: CrisisDetector) -> Self {
        self.crisis = detector;
        self
    }

    /// Upper bound on one classifier call
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether an external classifier is attached
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Crisis tier of `text` without estimating emotion
    pub fn assess_crisis(&self, text: &str) -> CrisisAssessment {
        self.crisis.assess(text)
    }

    /// Estimate the emotional state of `text`. Never fails.
    pub async fn classify(&self, text: &str) -> SentimentResult {
        let mut result = if is_short_greeting(text) {
            debug!("Short greeting, skipping emotion model");
            SentimentResult::greeting()
        } else {
            self.estimate(text).await
        };

        let assessment = self.crisis.assess(text);
        result.crisis_level = assessment.level;
        result.crisis_matches = assessment.matches;
        result
    }

    async fn estimate(&self, text: &str) -> SentimentResult {
        if let Some(model) = &self.model {
            match with_timeout("emotion classifier", self.timeout, model.classify(text)).await {
                Ok(output) => return from_model(output),
                Err(e) => warn!("Emotion classifier failed, using keyword fallback: {}", e),
            }
        }
        from_keywords(text)
    }
}

fn from_model(output: ClassifierOutput) -> SentimentResult {
    let emotion = normalize_label(&output.label);
    let confidence = if output.score.is_finite() {
        output.score.clamp(0.0, 1.0)
    } else {
        0.0
    };
    debug!(label = %output.label, %emotion, confidence, "Classifier label normalized");

    let mut emotion_scores = BTreeMap::new();
    emotion_scores.insert(emotion, confidence);
    SentimentResult {
        dominant_emotion: emotion,
        emotion_scores,
        crisis_level: Default::default(),
        crisis_matches: Vec::new(),
        confidence,
        source: SentimentSource::Model,
    }
}

fn from_keywords(text: &str) -> SentimentResult {
    let scores = score_emotions(text);
    SentimentResult {
        dominant_emotion: scores.dominant,
        emotion_scores: scores.normalized(),
        crisis_level: Default::default(),
        crisis_matches: Vec::new(),
        confidence: scores.confidence,
        source: SentimentSource::Keyword,
    }
}
