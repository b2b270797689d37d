//! Reactive avatar descriptors
//!
//! A pure projection of (emotion, confidence, crisis level) onto a 16x16
//! dot-matrix face. Rendering is left to the front end.

use serde::{Deserialize, Serialize};

use crate::types::{CrisisLevel, Emotion, SentimentResult};

/// Side length of the dot grid
pub const GRID_SIZE: u8 = 16;

/// One lit dot, as (column, row)
pub type Cell = (u8, u8);

/// Motion applied to the face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Animation {
    /// Joy
    Bounce,
    /// Sadness
    PulseSlow,
    /// Anger
    Flicker,
    /// Fear
    Tremble,
    /// Surprise
    PulseFast,
    /// Neutral and anything without a face of its own
    Gentle,
}

/// Dots making up the face
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacePattern {
    /// Eye dots
    pub eyes: Vec<Cell>,
    /// Mouth dots
    pub mouth: Vec<Cell>,
    /// Brows, tears and similar accents
    pub extra: Vec<Cell>,
}

/// Everything a front end needs to draw the avatar for one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarDescriptor {
    /// Emotion the face shows
    pub emotion: Emotion,
    /// Clamped to [0, 1]
    pub confidence: f32,
    /// Crisis tier of the turn
    pub crisis_level: CrisisLevel,
    /// Lit dots
    pub pattern: FacePattern,
    /// Face color (CSS rgba)
    pub color: String,
    /// Mouth color (CSS rgba)
    pub mouth_color: String,
    /// Motion
    pub animation: Animation,
    /// Blink interval
    pub blink_speed_ms: u32,
    /// Wash behind the face, set by crisis tier
    pub background_tint: String,
}

struct FaceEntry {
    eyes: &'static [Cell],
    mouth: &'static [Cell],
    extra: &'static [Cell],
    color: &'static str,
    mouth_color: &'static str,
    animation: Animation,
    blink_speed_ms: u32,
}

const NEUTRAL_FACE: FaceEntry = FaceEntry {
    eyes: &[(4, 4), (11, 4)],
    mouth: &[(6, 11), (7, 11), (8, 11), (9, 11), (10, 11)],
    extra: &[],
    color: "rgba(200, 200, 200, 0.9)",
    mouth_color: "rgba(180, 180, 180, 0.9)",
    animation: Animation::Gentle,
    blink_speed_ms: 90,
};

fn face_for(emotion: Emotion) -> &'static FaceEntry {
    const JOY: FaceEntry = FaceEntry {
        eyes: &[(4, 4), (11, 4)],
        mouth: &[(6, 10), (7, 10), (8, 10), (9, 10), (7, 11), (8, 11)],
        extra: &[(3, 3), (12, 3), (2, 5), (13, 5)],
        color: "rgba(255, 220, 60, 0.95)",
        mouth_color: "rgba(255, 100, 80, 0.95)",
        animation: Animation::Bounce,
        blink_speed_ms: 120,
    };
    const SADNESS: FaceEntry = FaceEntry {
        eyes: &[(4, 4), (11, 4), (4, 5), (11, 5)],
        mouth: &[(7, 12), (8, 12), (9, 12), (6, 11), (10, 11)],
        extra: &[],
        color: "rgba(100, 150, 255, 0.85)",
        mouth_color: "rgba(80, 120, 220, 0.95)",
        animation: Animation::PulseSlow,
        blink_speed_ms: 150,
    };
    const ANGER: FaceEntry = FaceEntry {
        eyes: &[(3, 4), (4, 3), (11, 4), (12, 3)],
        mouth: &[(6, 11), (7, 12), (8, 12), (9, 12), (10, 11)],
        extra: &[(2, 2), (13, 2)],
        color: "rgba(255, 80, 60, 0.95)",
        mouth_color: "rgba(255, 60, 40, 0.95)",
        animation: Animation::Flicker,
        blink_speed_ms: 80,
    };
    const FEAR: FaceEntry = FaceEntry {
        eyes: &[(4, 4), (11, 4), (4, 5), (11, 5)],
        mouth: &[(7, 11), (8, 12), (9, 11)],
        extra: &[(3, 2), (12, 2)],
        color: "rgba(180, 180, 255, 0.9)",
        mouth_color: "rgba(120, 120, 220, 0.9)",
        animation: Animation::Tremble,
        blink_speed_ms: 60,
    };
    const SURPRISE: FaceEntry = FaceEntry {
        eyes: &[(4, 3), (4, 4), (11, 3), (11, 4)],
        mouth: &[(7, 11), (8, 11), (9, 11), (7, 12), (8, 12), (9, 12)],
        extra: &[],
        color: "rgba(255, 200, 100, 0.9)",
        mouth_color: "rgba(255, 120, 80, 0.9)",
        animation: Animation::PulseFast,
        blink_speed_ms: 100,
    };

    match emotion {
        Emotion::Joy => &JOY,
        Emotion::Sadness => &SADNESS,
        Emotion::Anger => &ANGER,
        Emotion::Fear => &FEAR,
        Emotion::Surprise => &SURPRISE,
        // no dedicated face
        Emotion::Disgust | Emotion::Neutral => &NEUTRAL_FACE,
    }
}

/// Translucent wash behind the face for a crisis tier
pub fn background_tint(level: CrisisLevel) -> &'static str {
    match level {
        CrisisLevel::High => "rgba(255, 80, 80, 0.1)",
        CrisisLevel::Medium => "rgba(255, 180, 60, 0.08)",
        CrisisLevel::Low => "rgba(60, 60, 80, 0.05)",
    }
}

/// Indicator color for a crisis tier
pub fn crisis_color(level: CrisisLevel) -> &'static str {
    match level {
        CrisisLevel::High => "#ff4444",
        CrisisLevel::Medium => "#ffaa00",
        CrisisLevel::Low => "#44aa44",
    }
}

/// Emoji shown next to the emotion label
pub fn emotion_emoji(emotion: Emotion) -> &'static str {
    match emotion {
        Emotion::Joy => "😊",
        Emotion::Sadness => "😢",
        Emotion::Anger => "😠",
        Emotion::Fear => "😨",
        Emotion::Surprise => "😲",
        Emotion::Disgust => "😖",
        Emotion::Neutral => "😐",
    }
}

/// Build the avatar descriptor. Confidence is clamped to [0, 1].
pub fn describe(emotion: Emotion, confidence: f32, crisis_level: CrisisLevel) -> AvatarDescriptor {
    let face = face_for(emotion);
    AvatarDescriptor {
        emotion,
        confidence: if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        },
        crisis_level,
        pattern: FacePattern {
            eyes: face.eyes.to_vec(),
            mouth: face.mouth.to_vec(),
            extra: face.extra.to_vec(),
        },
        color: face.color.to_string(),
        mouth_color: face.mouth_color.to_string(),
        animation: face.animation,
        blink_speed_ms: face.blink_speed_ms,
        background_tint: background_tint(crisis_level).to_string(),
    }
}

impl From<&SentimentResult> for AvatarDescriptor {
    fn from(s: &SentimentResult) -> Self {
        describe(s.dominant_emotion, s.confidence, s.crisis_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_entries() {
        let joy = describe(Emotion::Joy, 0.9, CrisisLevel::Low);
        assert_eq!(joy.animation, Animation::Bounce);
        assert_eq!(joy.blink_speed_ms, 120);
        assert_eq!(joy.pattern.extra.len(), 4);

        let fear = describe(Emotion::Fear, 0.4, CrisisLevel::Low);
        assert_eq!(fear.animation, Animation::Tremble);
        assert_eq!(fear.blink_speed_ms, 60);
    }

    #[test]
    fn test_disgust_falls_back_to_neutral_face() {
        let disgust = describe(Emotion::Disgust, 0.7, CrisisLevel::Low);
        let neutral = describe(Emotion::Neutral, 0.7, CrisisLevel::Low);
        assert_eq!(disgust.pattern, neutral.pattern);
        assert_eq!(disgust.animation, Animation::Gentle);
        assert_eq!(disgust.emotion, Emotion::Disgust);
    }

    #[test]
    fn test_crisis_tint_and_colors() {
        assert_eq!(
            describe(Emotion::Sadness, 0.5, CrisisLevel::High).background_tint,
            "rgba(255, 80, 80, 0.1)"
        );
        assert_eq!(crisis_color(CrisisLevel::Medium), "#ffaa00");
        assert_eq!(emotion_emoji(Emotion::Neutral), "😐");
    }

    #[test]
    fn test_cells_stay_on_grid() {
        for emotion in Emotion::ALL {
            let d = describe(emotion, 1.0, CrisisLevel::Low);
            let cells = d.pattern.eyes.iter().chain(&d.pattern.mouth).chain(&d.pattern.extra);
            for (x, y) in cells {
                assert!(*x < GRID_SIZE && *y < GRID_SIZE);
            }
        }
    }

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(describe(Emotion::Joy, 1.7, CrisisLevel::Low).confidence, 1.0);
        assert_eq!(describe(Emotion::Joy, f32::NAN, CrisisLevel::Low).confidence, 0.0);
    }
}
