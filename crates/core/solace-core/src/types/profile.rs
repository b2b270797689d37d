//! Accumulated per-session knowledge about the user

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::{CrisisLevel, Emotion};

/// Topic families tracked across a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Jobs, offices, colleagues
    Work,
    /// Assignments, deadlines
    Projects,
    /// Friends, partners, family
    Relationships,
    /// Illness, sleep, exercise
    Health,
    /// Games, music, art
    Hobbies,
    /// School, exams, studying
    School,
}

impl Topic {
    /// Every topic in declaration order
    pub const ALL: [Topic; 6] = [
        Topic::Work,
        Topic::Projects,
        Topic::Relationships,
        Topic::Health,
        Topic::Hobbies,
        Topic::School,
    ];

    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Work => "work",
            Topic::Projects => "projects",
            Topic::Relationships => "relationships",
            Topic::Health => "health",
            Topic::Hobbies => "hobbies",
            Topic::School => "school",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Companion's memory of what the user cares about.
///
/// Sets only grow until [`CompanionProfile::reset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionProfile {
    /// Topics seen so far
    pub topics_discussed: BTreeSet<Topic>,
    /// Interest nouns seen so far
    pub user_interests: BTreeSet<String>,
    /// True until the first turn completes
    pub first_interaction: bool,
}

impl Default for CompanionProfile {
    fn default() -> Self {
        Self {
            topics_discussed: BTreeSet::new(),
            user_interests: BTreeSet::new(),
            first_interaction: true,
        }
    }
}

impl CompanionProfile {
    /// Mark the first turn as completed. Returns true only on the flip.
    pub fn complete_turn(&mut self) -> bool {
        std::mem::replace(&mut self.first_interaction, false)
    }

    /// Forget everything
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Snapshot of a session for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Stored turns
    pub history_length: usize,
    /// Topics seen so far
    pub topics_discussed: Vec<Topic>,
    /// Interests seen so far
    pub user_interests: Vec<String>,
    /// Most frequent emotion across the last three turns
    pub current_emotion_trend: Emotion,
    /// Highest crisis level seen this session
    pub peak_crisis_level: CrisisLevel,
    /// Whether the session has not completed a turn yet
    pub first_interaction: bool,
}
