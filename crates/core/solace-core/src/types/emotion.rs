//! Emotion vocabulary and per-turn sentiment signal

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::SolaceError;

/// The closed emotion vocabulary.
///
/// Declaration order matters: keyword-score ties are broken in favour of
/// the earlier variant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    /// Happiness, excitement
    Joy,
    /// Sadness, loneliness
    Sadness,
    /// Anger, frustration
    Anger,
    /// Fear, anxiety, worry
    Fear,
    /// Surprise, shock
    Surprise,
    /// Disgust, revulsion
    Disgust,
    /// No dominant emotion
    #[default]
    Neutral,
}

impl Emotion {
    /// Every emotion in declaration order
    pub const ALL: [Emotion; 7] = [
        Emotion::Joy,
        Emotion::Sadness,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Surprise,
        Emotion::Disgust,
        Emotion::Neutral,
    ];

    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Sadness => "sadness",
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Surprise => "surprise",
            Emotion::Disgust => "disgust",
            Emotion::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = SolaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == key)
            .ok_or_else(|| SolaceError::validation(format!("Unknown emotion '{}'", s)))
    }
}

/// Three-tier self-harm risk classification
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum CrisisLevel {
    /// No risk phrase present
    #[default]
    Low,
    /// Distress or overwhelm phrase present
    Medium,
    /// Explicit self-harm or suicide phrase present
    High,
}

impl CrisisLevel {
    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            CrisisLevel::Low => "low",
            CrisisLevel::Medium => "medium",
            CrisisLevel::High => "high",
        }
    }

    /// Whether this level routes to a fixed crisis response
    pub fn is_crisis(&self) -> bool {
        *self != CrisisLevel::Low
    }
}

impl fmt::Display for CrisisLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the emotion estimate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentSource {
    /// Bare greeting short-circuit
    Greeting,
    /// External classifier label, normalized
    Model,
    /// Keyword-overlap fallback
    Keyword,
}

/// Emotional state estimated for one user turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    /// Highest-scoring emotion
    pub dominant_emotion: Emotion,
    /// Per-emotion scores in [0, 1]
    pub emotion_scores: BTreeMap<Emotion, f32>,
    /// Crisis tier from an independent detector pass
    pub crisis_level: CrisisLevel,
    /// Phrases that produced the crisis tier
    pub crisis_matches: Vec<String>,
    /// Confidence in the dominant emotion, in [0, 1]
    pub confidence: f32,
    /// Which path produced the estimate
    pub source: SentimentSource,
}

impl SentimentResult {
    /// Neutral, fully confident result used for bare greetings
    pub fn greeting() -> Self {
        let mut emotion_scores = BTreeMap::new();
        emotion_scores.insert(Emotion::Neutral, 1.0);
        Self {
            dominant_emotion: Emotion::Neutral,
            emotion_scores,
            crisis_level: CrisisLevel::Low,
            crisis_matches: Vec::new(),
            confidence: 1.0,
            source: SentimentSource::Greeting,
        }
    }
}
