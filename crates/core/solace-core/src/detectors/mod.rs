//! Keyword detectors: crisis phrases, greetings, emotion words

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::CrisisLevel;

/// Explicit self-harm / suicide phrases
pub const HIGH_RISK_PHRASES: &[&str] = &[
    "kill myself",
    "end it all",
    "suicide",
    "end my life",
    "want to die",
    "overdose",
    "can't go on",
    "self harm",
    "self-harm",
];

/// Distress / overwhelm phrases
pub const MEDIUM_RISK_PHRASES: &[&str] = &[
    "hurt myself",
    "can't cope",
    "breaking down",
    "overwhelmed",
];

/// Phrases that make a message a greeting
pub const GREETING_PHRASES: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "hi there",
    "hello there",
    "hey there",
    "good morning",
    "good afternoon",
    "good evening",
];

/// Words that keep a very short message from being treated as trivial
pub const EMOTION_WORDS: &[&str] = &[
    "sad", "happy", "angry", "scared", "excited", "worried", "stressed",
];

/// Longest message (in words) still treated as a stand-alone greeting
pub const MAX_GREETING_WORDS: usize = 4;

static GREETING_RE: Lazy<Regex> = Lazy::new(|| {
    let alternatives: Vec<String> = GREETING_PHRASES.iter().map(|p| regex::escape(p)).collect();
    Regex::new(&format!(r"\b(?:{})\b", alternatives.join("|")))
        .unwrap_or_else(|e| panic!("greeting pattern failed to compile: {}", e))
});

/// Lowercase and fold typographic apostrophes so "can’t" matches "can't"
pub fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

/// Whitespace-separated word count
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// True if any greeting phrase appears as whole words
pub fn contains_greeting(text: &str) -> bool {
    GREETING_RE.is_match(&normalize(text))
}

/// True for a greeting of at most [`MAX_GREETING_WORDS`] words
pub fn is_short_greeting(text: &str) -> bool {
    word_count(text) <= MAX_GREETING_WORDS && contains_greeting(text)
}

/// True if the text names a feeling directly
pub fn contains_emotion_word(text: &str) -> bool {
    let t = normalize(text);
    EMOTION_WORDS.iter().any(|w| t.contains(w))
}

/// Crisis tier plus the phrases that produced it
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CrisisAssessment {
    /// Resolved tier
    pub level: CrisisLevel,
    /// Matched phrases of the winning tier, in list order
    pub matches: Vec<String>,
}

/// Two-tier phrase matcher. High-risk phrases are checked before
/// medium-risk ones so a message carrying both resolves to high.
#[derive(Debug, Clone)]
pub struct CrisisDetector {
    high: Vec<String>,
    medium: Vec<String>,
}

impl Default for CrisisDetector {
    fn default() -> Self {
        Self {
            high: HIGH_RISK_PHRASES.iter().map(|s| s.to_string()).collect(),
            medium: MEDIUM_RISK_PHRASES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CrisisDetector {
    /// Detector with the built-in phrase lists
    pub fn new() -> Self {
        Self::default()
    }

    /// Add extra phrases, e.g. locale-specific wording
    pub fn with_phrases<I, S>(mut self, level: CrisisLevel, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let target = match level {
            CrisisLevel::High => &mut self.high,
            CrisisLevel::Medium => &mut self.medium,
            CrisisLevel::Low => return self,
        };
        target.extend(phrases.into_iter().map(|p| normalize(&p.into())));
        self
    }

    /// Resolve the crisis tier of a message
    pub fn detect(&self, text: &str) -> CrisisLevel {
        self.assess(text).level
    }

    /// Resolve the crisis tier and report the matched phrases
    pub fn assess(&self, text: &str) -> CrisisAssessment {
        let t = normalize(text);
        for (level, phrases) in [(CrisisLevel::High, &self.high), (CrisisLevel::Medium, &self.medium)] {
            let matches: Vec<String> = phrases
                .iter()
                .filter(|p| t.contains(p.as_str()))
                .cloned()
                .collect();
            if !matches.is_empty() {
                return CrisisAssessment { level, matches };
            }
        }
        CrisisAssessment::default()
    }
}

static DEFAULT_DETECTOR: Lazy<CrisisDetector> = Lazy::new(CrisisDetector::default);

/// Resolve the crisis tier with the built-in phrase lists
pub fn detect_crisis(text: &str) -> CrisisLevel {
    DEFAULT_DETECTOR.detect(text)
}
