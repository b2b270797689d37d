//! Keyword-based text analysis

/// Emotion keyword scoring
pub mod keywords;
/// Topic, interest and continuation keywords
pub mod topics;

pub use keywords::{score_emotions, KeywordScores, EMOTION_KEYWORDS};
pub use topics::{
    detect_interests, detect_topics, extract_insights, shared_keyword, CONTINUATION_KEYWORDS,
    INTEREST_KEYWORDS, TOPIC_KEYWORDS,
};
