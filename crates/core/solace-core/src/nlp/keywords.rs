use std::collections::BTreeMap;

use crate::detectors::normalize;
use crate::types::Emotion;

/// Keyword count at which keyword confidence saturates
pub const KEYWORD_SATURATION: f32 = 5.0;

/// Emotion keyword families, in emotion declaration order
pub const EMOTION_KEYWORDS: &[(Emotion, &[&str])] = &[
    (
        Emotion::Joy,
        &["happy", "excited", "great", "good", "wonderful", "amazing", "love", "joy", "fantastic"],
    ),
    (
        Emotion::Sadness,
        &["sad", "depressed", "unhappy", "miserable", "cry", "tears", "hurt", "lonely", "down"],
    ),
    (
        Emotion::Anger,
        &["angry", "mad", "furious", "annoyed", "frustrated", "hate", "rage", "upset"],
    ),
    (
        Emotion::Fear,
        &["scared", "afraid", "anxious", "worried", "nervous", "panic", "fear", "terrified"],
    ),
    (
        Emotion::Surprise,
        &["surprised", "shocked", "amazed", "unexpected", "wow", "astonished"],
    ),
    (
        Emotion::Disgust,
        &["disgusted", "gross", "dislike", "hate", "awful", "revolting"],
    ),
];

/// Result of keyword-overlap scoring
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordScores {
    /// Raw hit count per emotion
    pub counts: BTreeMap<Emotion, usize>,
    /// Winning emotion, `Neutral` when nothing matched
    pub dominant: Emotion,
    /// `min(1, hits / 5)` for the winner
    pub confidence: f32,
}

/// Count keyword hits per emotion. The highest count wins; ties go to the
/// emotion declared first.
pub fn score_emotions(text: &str) -> KeywordScores {
    let t = normalize(text);
    let mut counts = BTreeMap::new();
    let mut best: Option<(Emotion, usize)> = None;

    for (emotion, keywords) in EMOTION_KEYWORDS {
        let hits = keywords.iter().filter(|k| t.contains(*k)).count();
        counts.insert(*emotion, hits);
        if hits > best.map(|(_, n)| n).unwrap_or(0) {
            best = Some((*emotion, hits));
        }
    }

    match best {
        Some((dominant, hits)) => KeywordScores {
            counts,
            dominant,
            confidence: (hits as f32 / KEYWORD_SATURATION).min(1.0),
        },
        None => KeywordScores {
            counts,
            dominant: Emotion::Neutral,
            confidence: 0.0,
        },
    }
}

impl KeywordScores {
    /// Per-emotion scores scaled into [0, 1]
    pub fn normalized(&self) -> BTreeMap<Emotion, f32> {
        self.counts
            .iter()
            .map(|(e, n)| (*e, (*n as f32 / KEYWORD_SATURATION).min(1.0)))
            .collect()
    }
}
