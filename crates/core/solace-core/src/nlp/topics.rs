//! Topic, interest and continuation keyword matching

use crate::detectors::normalize;
use crate::types::{CompanionProfile, Topic};

/// Topic keyword families, in topic declaration order
pub const TOPIC_KEYWORDS: &[(Topic, &[&str])] = &[
    (
        Topic::Work,
        &["work", "job", "career", "office", "boss", "colleague", "workplace"],
    ),
    (
        Topic::Projects,
        &["project", "assignment", "task", "deadline", "homework"],
    ),
    (
        Topic::Relationships,
        &[
            "friend",
            "partner",
            "family",
            "relationship",
            "boyfriend",
            "girlfriend",
            "husband",
            "wife",
        ],
    ),
    (
        Topic::Health,
        &["health", "sick", "tired", "sleep", "exercise", "doctor", "hospital"],
    ),
    (
        Topic::Hobbies,
        &["hobby", "interest", "game", "music", "sport", "art", "reading", "movie"],
    ),
    (
        Topic::School,
        &["school", "college", "university", "class", "exam", "test", "study"],
    ),
];

/// Specific things a user may mention caring about
pub const INTEREST_KEYWORDS: &[&str] = &[
    "book", "movie", "music", "game", "sport", "travel", "food", "art", "reading", "writing",
];

/// Keywords used to link the current message to earlier ones
pub const CONTINUATION_KEYWORDS: &[&str] = &[
    "work",
    "project",
    "friend",
    "family",
    "health",
    "school",
    "relationship",
];

/// Topics whose keywords appear in the text, in declaration order
pub fn detect_topics(text: &str) -> Vec<Topic> {
    let t = normalize(text);
    TOPIC_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| t.contains(k)))
        .map(|(topic, _)| *topic)
        .collect()
}

/// Interest nouns that appear in the text
pub fn detect_interests(text: &str) -> Vec<&'static str> {
    let t = normalize(text);
    INTEREST_KEYWORDS
        .iter()
        .copied()
        .filter(|k| t.contains(k))
        .collect()
}

/// Merge topics and interests found in `text` into the profile.
/// Set-union only; nothing is ever removed.
pub fn extract_insights(text: &str, profile: &mut CompanionProfile) {
    profile.topics_discussed.extend(detect_topics(text));
    profile
        .user_interests
        .extend(detect_interests(text).into_iter().map(str::to_string));
}

/// First continuation keyword present in both the message and one of the
/// previous user texts
pub fn shared_keyword(current: &str, previous: &[String]) -> Option<&'static str> {
    let current = normalize(current);
    CONTINUATION_KEYWORDS.iter().copied().find(|k| {
        current.contains(k) && previous.iter().any(|p| normalize(p).contains(k))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topics_accumulate_without_duplicates() {
        let mut profile = CompanionProfile::default();
        extract_insights("My boss keeps piling on work", &mut profile);
        extract_insights("My boss keeps piling on work", &mut profile);

        assert_eq!(profile.topics_discussed.len(), 1);
        assert!(profile.topics_discussed.contains(&Topic::Work));
    }

    #[test]
    fn test_interests_and_multiple_topics() {
        let mut profile = CompanionProfile::default();
        extract_insights("I skipped class to listen to music with a friend", &mut profile);

        let topics: Vec<Topic> = profile.topics_discussed.iter().copied().collect();
        assert_eq!(topics, vec![Topic::Relationships, Topic::Hobbies, Topic::School]);
        assert!(profile.user_interests.contains("music"));
    }

    #[test]
    fn test_sets_only_grow() {
        let mut profile = CompanionProfile::default();
        extract_insights("travel plans with my family", &mut profile);
        extract_insights("nothing much", &mut profile);
        assert!(profile.topics_discussed.contains(&Topic::Relationships));
        assert!(profile.user_interests.contains("travel"));
    }

    #[test]
    fn test_shared_keyword() {
        let previous = vec!["work has been rough".to_string(), "hello".to_string()];
        assert_eq!(shared_keyword("Work again today", &previous), Some("work"));
        assert_eq!(shared_keyword("school is fine", &previous), None);
    }
}
