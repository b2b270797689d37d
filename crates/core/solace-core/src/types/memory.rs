//! Bounded conversation history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::Emotion;

/// Default number of turns kept per session
pub const DEFAULT_HISTORY_CAP: usize = 8;

/// One completed exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// What the user said
    pub user_text: String,
    /// What the companion answered
    pub bot_text: String,
    /// Dominant emotion detected for the user text
    pub emotion: Emotion,
    /// When the turn completed
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Create a turn stamped with the current time
    pub fn new(user_text: impl Into<String>, bot_text: impl Into<String>, emotion: Emotion) -> Self {
        Self {
            user_text: user_text.into(),
            bot_text: bot_text.into(),
            emotion,
            timestamp: Utc::now(),
        }
    }
}

/// Append-only turn log capped at a fixed size; the oldest turn is evicted
/// first once the cap is exceeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMemory {
    turns: VecDeque<ConversationTurn>,
    cap: usize,
}

impl ConversationMemory {
    /// Create an empty memory holding at most `cap` turns (minimum 1)
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            turns: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Append a turn, evicting the oldest when over capacity.
    /// Returns the evicted turn, if any.
    pub fn push(&mut self, turn: ConversationTurn) -> Option<ConversationTurn> {
        self.turns.push_back(turn);
        if self.turns.len() > self.cap {
            self.turns.pop_front()
        } else {
            None
        }
    }

    /// Number of stored turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when no turn is stored
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Maximum number of turns
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ConversationTurn> + ExactSizeIterator {
        self.turns.iter()
    }

    /// Oldest stored turn
    pub fn first(&self) -> Option<&ConversationTurn> {
        self.turns.front()
    }

    /// Newest stored turn
    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.back()
    }

    /// Up to `n` most recent turns, oldest first
    pub fn recent(&self, n: usize) -> Vec<&ConversationTurn> {
        let skip = self.turns.len().saturating_sub(n);
        self.turns.iter().skip(skip).collect()
    }

    /// Lowercased user texts of the `n` most recent turns, oldest first
    pub fn last_user_texts(&self, n: usize) -> Vec<String> {
        self.recent(n)
            .into_iter()
            .map(|t| t.user_text.to_lowercase())
            .collect()
    }

    /// Emotions of the `n` most recent turns, oldest first
    pub fn recent_emotions(&self, n: usize) -> Vec<Emotion> {
        self.recent(n).into_iter().map(|t| t.emotion).collect()
    }

    /// Drop every turn
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(i: usize) -> ConversationTurn {
        ConversationTurn::new(format!("user {}", i), format!("bot {}", i), Emotion::Neutral)
    }

    #[test]
    fn test_ninth_turn_evicts_the_first() {
        let mut memory = ConversationMemory::new(8);
        for i in 1..=8 {
            assert!(memory.push(turn(i)).is_none());
        }
        let evicted = memory.push(turn(9)).expect("turn 1 should be evicted");

        assert_eq!(evicted.user_text, "user 1");
        assert_eq!(memory.len(), 8);
        assert_eq!(memory.first().unwrap().user_text, "user 2");
        assert_eq!(memory.last().unwrap().user_text, "user 9");
    }

    #[test]
    fn test_length_never_exceeds_cap() {
        let mut memory = ConversationMemory::new(3);
        for i in 0..50 {
            memory.push(turn(i));
            assert!(memory.len() <= 3);
        }
    }

    #[test]
    fn test_recent_returns_oldest_first() {
        let mut memory = ConversationMemory::default();
        for i in 1..=5 {
            memory.push(turn(i));
        }
        let recent: Vec<_> = memory.recent(2).iter().map(|t| t.bot_text.clone()).collect();
        assert_eq!(recent, vec!["bot 4", "bot 5"]);
        assert_eq!(memory.recent(10).len(), 5);
        assert_eq!(memory.last_user_texts(1), vec!["user 5".to_string()]);
    }

    #[test]
    fn test_zero_cap_is_clamped() {
        let mut memory = ConversationMemory::new(0);
        memory.push(turn(1));
        memory.push(turn(2));
        assert_eq!(memory.cap(), 1);
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut memory = ConversationMemory::default();
        memory.push(turn(1));
        memory.clear();
        assert!(memory.is_empty());
    }
}
