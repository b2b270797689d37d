//! Configuration management and environment variable loading

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::types::{Emotion, DEFAULT_HISTORY_CAP};
use crate::{Result, SolaceError};

/// Load environment variables from a .env file in the current directory
/// or a parent directory.
pub fn load_env() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::info!("Loaded environment from: {}", path.display());
            Ok(())
        }
        Err(dotenvy::Error::LineParse(line, pos)) => Err(SolaceError::config(format!(
            "Failed to parse .env file at line {}, position {}",
            line, pos
        ))),
        Err(dotenvy::Error::Io(_)) => {
            tracing::debug!("No .env file found - using system environment variables only");
            Ok(())
        }
        Err(e) => Err(SolaceError::config(format!(
            "Failed to load .env file: {}",
            e
        ))),
    }
}

/// Get optional environment variable with default
pub fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get environment variable as integer
pub fn get_env_int<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Get environment variable as float
pub fn get_env_float(key: &str, default: f32) -> f32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<f32>().ok())
        .unwrap_or(default)
}

/// Default upper bound on one generator call
pub const DEFAULT_GENERATION_TIMEOUT_MS: u64 = 20_000;
/// Default upper bound on one classifier call
pub const DEFAULT_CLASSIFIER_TIMEOUT_MS: u64 = 5_000;

/// How replies on the default path are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Always answer from template pools
    #[default]
    TemplateOnly,
    /// Ask the text generator first, fall back to templates
    ModelAugmented,
}

impl FromStr for ResponseMode {
    type Err = SolaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "template_only" | "template" | "fallback_only" => Ok(ResponseMode::TemplateOnly),
            "model_augmented" | "model" | "generated" => Ok(ResponseMode::ModelAugmented),
            other => Err(SolaceError::config(format!(
                "Unknown response mode '{}'. Expected template_only or model_augmented",
                other
            ))),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionConfig {
    /// Template-only or model-augmented replies
    pub mode: ResponseMode,
    /// Turns kept in conversation memory
    pub history_cap: usize,
    /// Chance of answering with a continuation template when a topic
    /// keyword links this message to a recent one
    pub continuation_probability: f64,
    /// Upper bound on one generator call
    pub generation_timeout_ms: u64,
    /// Upper bound on one classifier call
    pub classifier_timeout_ms: u64,
    /// Token budget for generated replies
    pub max_new_tokens: usize,
    /// Shortest acceptable generated reply, in words
    pub min_reply_words: usize,
    /// Longest acceptable generated reply, in words
    pub max_reply_words: usize,
    /// Recent turns embedded in generation prompts
    pub context_turns: usize,
    /// Locale used for helpline guidance
    pub locale: String,
    /// Name the companion uses for itself in prompts
    pub companion_name: String,
    /// Emotions that never get a generated reply
    pub template_only_emotions: BTreeSet<Emotion>,
    /// Optional JSON file overriding the built-in response pools
    pub templates_path: Option<PathBuf>,
    /// Seed for template choice; entropy when unset
    pub seed: Option<u64>,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            mode: ResponseMode::TemplateOnly,
            history_cap: DEFAULT_HISTORY_CAP,
            continuation_probability: 0.5,
            generation_timeout_ms: DEFAULT_GENERATION_TIMEOUT_MS,
            classifier_timeout_ms: DEFAULT_CLASSIFIER_TIMEOUT_MS,
            max_new_tokens: 140,
            min_reply_words: 3,
            max_reply_words: 150,
            context_turns: 3,
            locale: "en".to_string(),
            companion_name: "Alex".to_string(),
            template_only_emotions: [Emotion::Sadness, Emotion::Fear].into_iter().collect(),
            templates_path: None,
            seed: None,
        }
    }
}

impl CompanionConfig {
    /// Build a config from `SOLACE_*` environment variables, falling back
    /// to defaults for anything unset
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let mode = match env::var("SOLACE_MODE") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.mode,
        };

        let template_only_emotions = match env::var("SOLACE_TEMPLATE_ONLY_EMOTIONS") {
            Ok(v) => parse_emotion_list(&v)?,
            Err(_) => defaults.template_only_emotions.clone(),
        };

        let seed = match env::var("SOLACE_SEED") {
            Ok(v) => Some(v.trim().parse::<u64>().map_err(|e| {
                SolaceError::config(format!("SOLACE_SEED must be an unsigned integer: {}", e))
            })?),
            Err(_) => None,
        };

        let config = Self {
            mode,
            history_cap: get_env_int("SOLACE_HISTORY_CAP", defaults.history_cap),
            continuation_probability: get_env_float(
                "SOLACE_CONTINUATION_PROBABILITY",
                defaults.continuation_probability as f32,
            ) as f64,
            generation_timeout_ms: get_env_int(
                "SOLACE_GENERATION_TIMEOUT_MS",
                defaults.generation_timeout_ms,
            ),
            classifier_timeout_ms: get_env_int(
                "SOLACE_CLASSIFIER_TIMEOUT_MS",
                defaults.classifier_timeout_ms,
            ),
            max_new_tokens: get_env_int("SOLACE_MAX_NEW_TOKENS", defaults.max_new_tokens),
            min_reply_words: get_env_int("SOLACE_MIN_REPLY_WORDS", defaults.min_reply_words),
            max_reply_words: get_env_int("SOLACE_MAX_REPLY_WORDS", defaults.max_reply_words),
            context_turns: get_env_int("SOLACE_CONTEXT_TURNS", defaults.context_turns),
            locale: get_env_or("SOLACE_LOCALE", &defaults.locale),
            companion_name: get_env_or("SOLACE_COMPANION_NAME", &defaults.companion_name),
            template_only_emotions,
            templates_path: env::var("SOLACE_TEMPLATES_PATH").ok().map(PathBuf::from),
            seed,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.history_cap == 0 {
            return Err(SolaceError::config("history_cap must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.continuation_probability) {
            return Err(SolaceError::config(format!(
                "continuation_probability must be within [0, 1], got {}",
                self.continuation_probability
            )));
        }
        if self.generation_timeout_ms == 0 || self.classifier_timeout_ms == 0 {
            return Err(SolaceError::config("collaborator timeouts must be non-zero"));
        }
        if self.max_new_tokens == 0 {
            return Err(SolaceError::config("max_new_tokens must be at least 1"));
        }
        if self.min_reply_words > self.max_reply_words {
            return Err(SolaceError::config(format!(
                "min_reply_words ({}) exceeds max_reply_words ({})",
                self.min_reply_words, self.max_reply_words
            )));
        }
        Ok(())
    }

    /// Generator timeout as a duration
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }

    /// Classifier timeout as a duration
    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms)
    }

    /// Builder-style mode override
    pub fn with_mode(mut self, mode: ResponseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder-style seed override
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

fn parse_emotion_list(raw: &str) -> Result<BTreeSet<Emotion>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Emotion>()
                .map_err(|e| SolaceError::config(format!("SOLACE_TEMPLATE_ONLY_EMOTIONS: {}", e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_int_and_float() {
        env::set_var("SOLACE_TEST_INT", "42");
        env::set_var("SOLACE_TEST_FLOAT", "0.25");
        assert_eq!(get_env_int("SOLACE_TEST_INT", 0usize), 42);
        assert_eq!(get_env_int("SOLACE_TEST_NONEXISTENT_INT", 99u64), 99);
        assert_eq!(get_env_float("SOLACE_TEST_FLOAT", 0.0), 0.25);
        env::remove_var("SOLACE_TEST_INT");
        env::remove_var("SOLACE_TEST_FLOAT");
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = CompanionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history_cap, 8);
        assert_eq!(config.mode, ResponseMode::TemplateOnly);
        assert!(config.template_only_emotions.contains(&Emotion::Fear));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = CompanionConfig {
            continuation_probability: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CompanionConfig {
            min_reply_words: 200,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CompanionConfig {
            history_cap: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_response_mode_parsing() {
        assert_eq!("model-augmented".parse::<ResponseMode>().unwrap(), ResponseMode::ModelAugmented);
        assert_eq!("Template_Only".parse::<ResponseMode>().unwrap(), ResponseMode::TemplateOnly);
        assert!("chaos".parse::<ResponseMode>().is_err());
    }

    #[test]
    fn test_parse_emotion_list() {
        let set = parse_emotion_list("sadness, anger,,").unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Emotion::Anger));
        assert!(parse_emotion_list("sadness,gloom").is_err());
    }
}
