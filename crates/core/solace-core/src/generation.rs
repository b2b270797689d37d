//! Guarded calls into the text generator and checks on what comes back

use once_cell::sync::Lazy;
use regex::Regex;
use std::future::Future;
use std::time::Duration;

use crate::detectors::word_count;
use crate::{Result, SolaceError};

/// Phrases that mark a reply as a refusal or as talking about itself
pub const META_PHRASES: &[&str] = &[
    "as an ai",
    "as a language model",
    "i'm an ai",
    "i am an ai",
    "language model",
    "as a chatbot",
    "i cannot provide",
    "i can't provide",
    "i'm not able to help",
    "i am not able to help",
    "openai",
];

/// Most steps kept from a generated support plan
pub const MAX_PLAN_STEPS: usize = 5;
/// Characters kept when a plan comes back as a paragraph
pub const PLAN_FALLBACK_CHARS: usize = 140;

static BULLET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:-|\*|•)\s+(.+)$")
        .unwrap_or_else(|e| panic!("bullet pattern failed to compile: {}", e))
});

/// Await a collaborator call, treating an elapsed deadline as a failure
pub async fn with_timeout<T, F>(what: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(SolaceError::timeout(format!(
            "{} did not finish within {}ms",
            what,
            limit.as_millis()
        ))),
    }
}

/// Why a generated reply was thrown away
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Nothing but whitespace
    Empty,
    /// Fewer words than allowed
    TooShort(usize),
    /// More words than allowed
    TooLong(usize),
    /// Contains a refusal or self-referential phrase
    MetaPhrase(&'static str),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Empty => write!(f, "empty output"),
            Rejection::TooShort(n) => write!(f, "too short ({} words)", n),
            Rejection::TooLong(n) => write!(f, "too long ({} words)", n),
            Rejection::MetaPhrase(p) => write!(f, "contains '{}'", p),
        }
    }
}

/// Quality gate for generated replies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyValidator {
    /// Fewest words accepted
    pub min_words: usize,
    /// Most words accepted
    pub max_words: usize,
}

impl Default for ReplyValidator {
    fn default() -> Self {
        Self {
            min_words: 3,
            max_words: 150,
        }
    }
}

impl ReplyValidator {
    /// Validator with explicit bounds
    pub fn new(min_words: usize, max_words: usize) -> Self {
        Self { min_words, max_words }
    }

    /// Return the cleaned reply, or why it was rejected
    pub fn check(&self, raw: &str) -> std::result::Result<String, Rejection> {
        let cleaned = raw.trim().trim_matches('"').trim();
        if cleaned.is_empty() {
            return Err(Rejection::Empty);
        }
        let words = word_count(cleaned);
        if words < self.min_words {
            return Err(Rejection::TooShort(words));
        }
        if words > self.max_words {
            return Err(Rejection::TooLong(words));
        }
        let lower = cleaned.to_lowercase().replace('\u{2019}', "'");
        if let Some(phrase) = META_PHRASES.iter().find(|p| lower.contains(*p)) {
            return Err(Rejection::MetaPhrase(*phrase));
        }
        Ok(cleaned.to_string())
    }
}

/// Pull coping steps out of generated text. Bullet lines win; a paragraph
/// becomes one truncated step. At most [`MAX_PLAN_STEPS`] are kept.
pub fn parse_support_plan(text: &str) -> Vec<String> {
    let mut steps: Vec<String> = text
        .lines()
        .filter_map(|line| BULLET_RE.captures(line))
        .filter_map(|c| c.get(1).map(|m| m.as_str().trim().to_string()))
        .filter(|s| !s.is_empty())
        .collect();

    if steps.is_empty() {
        let paragraph: String = text.trim().chars().take(PLAN_FALLBACK_CHARS).collect();
        if !paragraph.is_empty() {
            steps.push(paragraph);
        }
    }
    steps.truncate(MAX_PLAN_STEPS);
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_accepts_and_cleans() {
        let v = ReplyValidator::default();
        assert_eq!(
            v.check("  \"That sounds really hard. I'm here.\" ").unwrap(),
            "That sounds really hard. I'm here."
        );
    }

    #[test]
    fn test_validator_rejections() {
        let v = ReplyValidator::default();
        assert_eq!(v.check("   "), Err(Rejection::Empty));
        assert_eq!(v.check("Okay then"), Err(Rejection::TooShort(2)));
        assert_eq!(v.check(&"word ".repeat(151)), Err(Rejection::TooLong(151)));
        assert_eq!(
            v.check("As an AI, I don't have feelings but I understand."),
            Err(Rejection::MetaPhrase("as an ai"))
        );
        assert!(matches!(
            v.check("I\u{2019}m an AI and cannot really feel this"),
            Err(Rejection::MetaPhrase(_))
        ));
    }

    #[test]
    fn test_parse_bullets() {
        let text = "Here you go:\n- Breathe slowly\n* Drink water\n• Call a friend\nnot a bullet";
        assert_eq!(
            parse_support_plan(text),
            vec!["Breathe slowly", "Drink water", "Call a friend"]
        );
    }

    #[test]
    fn test_parse_caps_at_five() {
        let text = (1..=8).map(|i| format!("- step {}", i)).collect::<Vec<_>>().join("\n");
        assert_eq!(parse_support_plan(&text).len(), 5);
    }

    #[test]
    fn test_parse_paragraph_fallback() {
        let text = "a".repeat(300);
        let steps = parse_support_plan(&text);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].chars().count(), PLAN_FALLBACK_CHARS);
        assert!(parse_support_plan("   ").is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_an_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, SolaceError>("late")
        };
        let result = with_timeout("generator", Duration::from_millis(10), slow).await;
        assert!(matches!(result, Err(SolaceError::Timeout(_))));

        let fast = async { Ok::<_, SolaceError>("ok") };
        assert_eq!(
            with_timeout("generator", Duration::from_secs(1), fast).await.unwrap(),
            "ok"
        );
    }
}
