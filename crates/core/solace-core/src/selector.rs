//! Response selection
//!
//! [`ResponseSelector::respond`] walks a fixed priority ladder and stops at
//! the first rung that applies:
//!
//! 1. high crisis tier: the fixed safety message
//! 2. medium crisis tier: the fixed escalation message
//! 3. greeting
//! 4. trivial message (two words or fewer, no feeling word)
//! 5. follow-up for the first matched topic that has a pool
//! 6. continuation of a topic from one of the last two user messages
//! 7. generated reply or emotion template
//!
//! Crisis rungs never touch the generator or the picker. Whatever rung wins,
//! the turn is recorded in the session context before returning.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{CompanionConfig, ResponseMode};
use crate::detectors::{contains_emotion_word, contains_greeting, is_short_greeting, word_count};
use crate::generation::{parse_support_plan, with_timeout, ReplyValidator};
use crate::nlp::{detect_topics, shared_keyword};
use crate::picker::TemplatePicker;
use crate::pools::ResponsePools;
use crate::session::SessionContext;
use crate::templates::{ReplyPrompt, SupportPlanPrompt, TemplateEngine};
use crate::types::{CrisisLevel, Emotion, GenerateTextParams, SentimentResult, TextGenerator, Topic};
use crate::Result;

/// Longest message treated as trivial
pub const TRIVIAL_MAX_WORDS: usize = 2;
/// User messages searched for a shared topic keyword
pub const CONTINUATION_LOOKBACK: usize = 2;
/// Turns of history needed before continuation is considered
pub const CONTINUATION_MIN_HISTORY: usize = 2;

const REPLY_TEMPERATURE: f32 = 0.7;
const PLAN_TEMPERATURE: f32 = 0.6;
const PLAN_MAX_TOKENS: usize = 180;

/// Which rung of the ladder produced a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// Fixed high-risk safety message
    CrisisHigh,
    /// Fixed medium-risk escalation message
    CrisisMedium,
    /// Greeting template
    Greeting,
    /// Acknowledgment of a very short message
    Acknowledgment,
    /// Topic follow-up question
    TopicFollowUp(Topic),
    /// Reference back to an earlier turn
    Continuation,
    /// Template keyed by dominant emotion
    EmotionTemplate(Emotion),
    /// Validated generator output
    Generated,
}

impl ResponseKind {
    /// True for the two fixed crisis messages
    pub fn is_crisis(&self) -> bool {
        matches!(self, ResponseKind::CrisisHigh | ResponseKind::CrisisMedium)
    }
}

/// Reply text plus the rung that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Text shown to the user
    pub text: String,
    /// Rung that produced the text
    pub kind: ResponseKind,
}

impl Reply {
    fn new(text: impl Into<String>, kind: ResponseKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Reply used only if a validated pool somehow yields nothing
const LAST_RESORT_REPLY: &str = "I'm here and listening. Tell me a little more about how you're feeling.";

fn pick(picker: &mut TemplatePicker, pool: &[String]) -> Option<String> {
    picker.choose(pool).cloned()
}

/// Chooses a reply for each turn
pub struct ResponseSelector {
    pools: ResponsePools,
    config: CompanionConfig,
    picker: TemplatePicker,
    generator: Option<Arc<dyn TextGenerator>>,
    templates: TemplateEngine,
    validator: ReplyValidator,
}

impl ResponseSelector {
    /// Build a selector. Fails when the config is invalid or the pools
    /// cannot serve the crisis rungs.
    pub fn new(pools: ResponsePools, config: CompanionConfig) -> Result<Self> {
        config.validate()?;
        pools.validate()?;
        Ok(Self {
            picker: TemplatePicker::from_seed_opt(config.seed),
            validator: ReplyValidator::new(config.min_reply_words, config.max_reply_words),
            templates: TemplateEngine::new()?,
            generator: None,
            pools,
            config,
        })
    }

    /// Selector over the built-in pools, or the file named in the config
    pub fn from_config(config: CompanionConfig) -> Result<Self> {
        let pools = ResponsePools::load(config.templates_path.as_deref())?;
        Self::new(pools, config)
    }

    /// Attach a text generator, used in model-augmented mode
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Replace the template picker
    pub fn with_picker(mut self, picker: TemplatePicker) -> Self {
        self.picker = picker;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &CompanionConfig {
        &self.config
    }

    /// Active pools
    pub fn pools(&self) -> &ResponsePools {
        &self.pools
    }

    /// Whether the default rung may call the generator for this emotion
    pub fn generation_enabled_for(&self, emotion: Emotion) -> bool {
        self.config.mode == ResponseMode::ModelAugmented
            && self.generator.is_some()
            && !self.config.template_only_emotions.contains(&emotion)
    }

    /// Choose a reply and record the turn in `ctx`
    pub async fn respond(
        &mut self,
        ctx: &mut SessionContext,
        text: &str,
        sentiment: &SentimentResult,
    ) -> Reply {
        let reply = self.select(ctx, text, sentiment).await;
        debug!(kind = ?reply.kind, "Reply selected");
        ctx.record_turn(text, &reply.text, sentiment);
        reply
    }

    async fn select(&mut self, ctx: &SessionContext, text: &str, sentiment: &SentimentResult) -> Reply {
        match sentiment.crisis_level {
            CrisisLevel::High => {
                return Reply::new(self.pools.crisis_high.clone(), ResponseKind::CrisisHigh)
            }
            CrisisLevel::Medium => {
                return Reply::new(self.pools.crisis_medium.clone(), ResponseKind::CrisisMedium)
            }
            CrisisLevel::Low => {}
        }

        let greeting = (ctx.profile.first_interaction && contains_greeting(text))
            || is_short_greeting(text);
        if greeting {
            if let Some(reply) = pick(&mut self.picker, &self.pools.greetings) {
                return Reply::new(reply, ResponseKind::Greeting);
            }
        }

        if word_count(text) <= TRIVIAL_MAX_WORDS && !contains_emotion_word(text) {
            if let Some(reply) = pick(&mut self.picker, &self.pools.acknowledgment) {
                return Reply::new(reply, ResponseKind::Acknowledgment);
            }
        }

        let follow_up = detect_topics(text)
            .into_iter()
            .find_map(|topic| self.pools.contextual_pool(topic).map(|pool| (topic, pool)));
        if let Some((topic, pool)) = follow_up {
            if let Some(reply) = pick(&mut self.picker, pool) {
                return Reply::new(reply, ResponseKind::TopicFollowUp(topic));
            }
        }

        if ctx.memory.len() >= CONTINUATION_MIN_HISTORY {
            let previous = ctx.memory.last_user_texts(CONTINUATION_LOOKBACK);
            if let Some(keyword) = shared_keyword(text, &previous) {
                if self.picker.chance(self.config.continuation_probability) {
                    debug!(keyword, "Continuing an earlier topic");
                    if let Some(reply) = pick(&mut self.picker, &self.pools.continuation) {
                        return Reply::new(reply, ResponseKind::Continuation);
                    }
                }
            }
        }

        let emotion = sentiment.dominant_emotion;
        if self.generation_enabled_for(emotion) {
            if let Some(reply) = self.generate_reply(ctx, text, sentiment).await {
                return Reply::new(reply, ResponseKind::Generated);
            }
        }

        let reply = pick(&mut self.picker, self.pools.emotional_pool(emotion))
            .unwrap_or_else(|| LAST_RESORT_REPLY.to_string());
        Reply::new(reply, ResponseKind::EmotionTemplate(emotion))
    }

    async fn generate_reply(
        &self,
        ctx: &SessionContext,
        text: &str,
        sentiment: &SentimentResult,
    ) -> Option<String> {
        let generator = self.generator.as_ref()?;

        let prompt = ReplyPrompt::new(text, sentiment.dominant_emotion)
            .with_companion_name(self.config.companion_name.clone())
            .with_crisis_level(sentiment.crisis_level)
            .with_context(&ctx.memory, self.config.context_turns);
        let rendered = match self.templates.render_reply(&prompt) {
            Ok(r) => r,
            Err(e) => {
                warn!("Failed to render reply prompt: {}", e);
                return None;
            }
        };

        let params = GenerateTextParams::new(rendered, self.config.max_new_tokens)
            .with_temperature(REPLY_TEMPERATURE);
        let raw = match with_timeout(
            "text generator",
            self.config.generation_timeout(),
            generator.generate(params),
        )
        .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Generation failed, using template: {}", e);
                return None;
            }
        };

        match self.validator.check(&raw) {
            Ok(reply) => Some(reply),
            Err(rejection) => {
                warn!("Generated reply rejected ({}), using template", rejection);
                None
            }
        }
    }

    /// Short list of coping steps for `text`.
    ///
    /// High-risk input always gets the fixed crisis steps. Otherwise the
    /// generator is asked in model-augmented mode, and the built-in plan is
    /// used when it is absent, fails, or returns nothing usable.
    pub async fn support_plan(&self, text: &str, crisis_level: CrisisLevel) -> Vec<String> {
        if crisis_level == CrisisLevel::High {
            return self.pools.crisis_plan.clone();
        }

        if self.config.mode == ResponseMode::ModelAugmented {
            if let Some(generator) = &self.generator {
                match self.generate_plan(generator.as_ref(), text).await {
                    Ok(steps) if !steps.is_empty() => return steps,
                    Ok(_) => warn!("Support plan came back empty, using default plan"),
                    Err(e) => warn!("Support plan generation failed: {}", e),
                }
            }
        }
        self.pools.support_plan.clone()
    }

    async fn generate_plan(&self, generator: &dyn TextGenerator, text: &str) -> Result<Vec<String>> {
        let prompt = self
            .templates
            .render_support_plan(&SupportPlanPrompt::new(text))?;
        let params = GenerateTextParams::new(prompt, PLAN_MAX_TOKENS).with_temperature(PLAN_TEMPERATURE);
        let raw = with_timeout(
            "text generator",
            self.config.generation_timeout(),
            generator.generate(params),
        )
        .await?;
        Ok(parse_support_plan(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MockTextGenerator, SentimentSource};
    use crate::SolaceError;
    use std::collections::BTreeMap;

    fn sentiment(emotion: Emotion, level: CrisisLevel) -> SentimentResult {
        SentimentResult {
            dominant_emotion: emotion,
            emotion_scores: BTreeMap::new(),
            crisis_level: level,
            crisis_matches: Vec::new(),
            confidence: 0.5,
            source: SentimentSource::Keyword,
        }
    }

    fn selector(config: CompanionConfig) -> ResponseSelector {
        ResponseSelector::new(ResponsePools::default(), config.with_seed(11)).unwrap()
    }

    fn augmented() -> CompanionConfig {
        CompanionConfig {
            template_only_emotions: Default::default(),
            ..CompanionConfig::default().with_mode(ResponseMode::ModelAugmented)
        }
    }

    fn context() -> SessionContext {
        SessionContext::new(8, "en")
    }

    #[tokio::test]
    async fn test_crisis_high_is_fixed_and_never_generated() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().never();
        let mut sel = selector(augmented()).with_generator(Arc::new(generator));
        let mut ctx = context();

        let first = sel
            .respond(&mut ctx, "I want to kill myself", &sentiment(Emotion::Sadness, CrisisLevel::High))
            .await;
        let second = sel
            .respond(&mut ctx, "I want to kill myself", &sentiment(Emotion::Sadness, CrisisLevel::High))
            .await;

        assert_eq!(first.kind, ResponseKind::CrisisHigh);
        assert_eq!(first.text, crate::pools::CRISIS_HIGH_MESSAGE);
        assert_eq!(first, second);
        assert_eq!(ctx.memory.len(), 2);
        assert!(!ctx.profile.first_interaction);
    }

    #[tokio::test]
    async fn test_crisis_medium_is_distinct() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().never();
        let mut sel = selector(augmented()).with_generator(Arc::new(generator));
        let mut ctx = context();

        let reply = sel
            .respond(&mut ctx, "hello, I'm so overwhelmed", &sentiment(Emotion::Neutral, CrisisLevel::Medium))
            .await;
        assert_eq!(reply.kind, ResponseKind::CrisisMedium);
        assert_ne!(reply.text, crate::pools::CRISIS_HIGH_MESSAGE);
    }

    #[tokio::test]
    async fn test_first_message_greeting() {
        let mut sel = selector(CompanionConfig::default());
        let mut ctx = context();
        let reply = sel
            .respond(&mut ctx, "hello", &SentimentResult::greeting())
            .await;
        assert_eq!(reply.kind, ResponseKind::Greeting);
        assert!(sel.pools().greetings.contains(&reply.text));
        assert!(!ctx.profile.first_interaction);
    }

    #[tokio::test]
    async fn test_long_greeting_only_counts_on_first_turn() {
        let mut sel = selector(CompanionConfig::default());
        let mut ctx = context();
        let text = "hello again, I had quite a normal day today";

        let first = sel.respond(&mut ctx, text, &sentiment(Emotion::Neutral, CrisisLevel::Low)).await;
        assert_eq!(first.kind, ResponseKind::Greeting);

        let second = sel.respond(&mut ctx, text, &sentiment(Emotion::Neutral, CrisisLevel::Low)).await;
        assert_eq!(second.kind, ResponseKind::EmotionTemplate(Emotion::Neutral));
    }

    #[tokio::test]
    async fn test_trivial_message_acknowledged() {
        let mut sel = selector(CompanionConfig::default());
        let mut ctx = context();
        ctx.profile.first_interaction = false;

        let reply = sel.respond(&mut ctx, "ok sure", &sentiment(Emotion::Neutral, CrisisLevel::Low)).await;
        assert_eq!(reply.kind, ResponseKind::Acknowledgment);

        let reply = sel.respond(&mut ctx, "so sad", &sentiment(Emotion::Sadness, CrisisLevel::Low)).await;
        assert_eq!(reply.kind, ResponseKind::EmotionTemplate(Emotion::Sadness));
    }

    #[tokio::test]
    async fn test_topic_follow_up_needs_a_pool() {
        let mut sel = selector(CompanionConfig::default());
        let mut ctx = context();
        let sad = sentiment(Emotion::Sadness, CrisisLevel::Low);

        // school is tracked but has no follow-up pool
        let reply = sel.respond(&mut ctx, "my exam went badly today", &sad).await;
        assert_eq!(reply.kind, ResponseKind::EmotionTemplate(Emotion::Sadness));
        assert!(ctx.profile.topics_discussed.contains(&Topic::School));

        let reply = sel.respond(&mut ctx, "my friend ignored me at lunch", &sad).await;
        assert_eq!(reply.kind, ResponseKind::TopicFollowUp(Topic::Relationships));
        assert!(sel
            .pools()
            .contextual_pool(Topic::Relationships)
            .unwrap()
            .contains(&reply.text));
    }

    #[tokio::test]
    async fn test_continuation_with_certain_probability() {
        let config = CompanionConfig {
            continuation_probability: 1.0,
            ..CompanionConfig::default()
        };
        let mut sel = selector(config);
        let mut ctx = context();
        let low = sentiment(Emotion::Neutral, CrisisLevel::Low);

        sel.respond(&mut ctx, "we talked at school yesterday", &low).await;
        sel.respond(&mut ctx, "nothing much else happened then", &low).await;
        let reply = sel.respond(&mut ctx, "school still feels strange to me", &low).await;
        assert_eq!(reply.kind, ResponseKind::Continuation);
    }

    #[tokio::test]
    async fn test_continuation_disabled_at_zero() {
        let config = CompanionConfig {
            continuation_probability: 0.0,
            ..CompanionConfig::default()
        };
        let mut sel = selector(config);
        let mut ctx = context();
        let low = sentiment(Emotion::Neutral, CrisisLevel::Low);

        sel.respond(&mut ctx, "we talked at school yesterday", &low).await;
        sel.respond(&mut ctx, "nothing much else happened then", &low).await;
        let reply = sel.respond(&mut ctx, "school still feels strange to me", &low).await;
        assert_eq!(reply.kind, ResponseKind::EmotionTemplate(Emotion::Neutral));
    }

    #[tokio::test]
    async fn test_valid_generation_is_used() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Ok("That sounds like a lot to hold. I'm here with you.".to_string()));
        let mut sel = selector(augmented()).with_generator(Arc::new(generator));
        let mut ctx = context();
        ctx.profile.first_interaction = false;

        let reply = sel
            .respond(&mut ctx, "the week has been long and strange", &sentiment(Emotion::Neutral, CrisisLevel::Low))
            .await;
        assert_eq!(reply.kind, ResponseKind::Generated);
        assert_eq!(ctx.memory.last().unwrap().bot_text, reply.text);
    }

    #[tokio::test]
    async fn test_rejected_generation_falls_back() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Ok("As an AI I cannot feel anything about this.".to_string()));
        let mut sel = selector(augmented()).with_generator(Arc::new(generator));
        let mut ctx = context();
        ctx.profile.first_interaction = false;

        let reply = sel
            .respond(&mut ctx, "the week has been long and strange", &sentiment(Emotion::Anger, CrisisLevel::Low))
            .await;
        assert_eq!(reply.kind, ResponseKind::EmotionTemplate(Emotion::Anger));
        assert!(sel.pools().emotional_pool(Emotion::Anger).contains(&reply.text));
    }

    #[tokio::test]
    async fn test_generator_error_falls_back() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(SolaceError::model("connection refused")));
        let mut sel = selector(augmented()).with_generator(Arc::new(generator));
        let mut ctx = context();
        ctx.profile.first_interaction = false;

        let reply = sel
            .respond(&mut ctx, "the week has been long and strange", &sentiment(Emotion::Joy, CrisisLevel::Low))
            .await;
        assert_eq!(reply.kind, ResponseKind::EmotionTemplate(Emotion::Joy));
    }

    #[tokio::test]
    async fn test_template_only_emotion_skips_generator() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().never();
        let config = CompanionConfig::default().with_mode(ResponseMode::ModelAugmented);
        let mut sel = selector(config).with_generator(Arc::new(generator));
        let mut ctx = context();
        ctx.profile.first_interaction = false;

        let reply = sel
            .respond(&mut ctx, "I feel so anxious about my exam tomorrow", &sentiment(Emotion::Fear, CrisisLevel::Low))
            .await;
        assert_eq!(reply.kind, ResponseKind::EmotionTemplate(Emotion::Fear));
    }

    #[tokio::test]
    async fn test_disgust_uses_neutral_pool() {
        let mut sel = selector(CompanionConfig::default());
        let mut ctx = context();
        ctx.profile.first_interaction = false;

        let reply = sel
            .respond(&mut ctx, "that smell was truly revolting", &sentiment(Emotion::Disgust, CrisisLevel::Low))
            .await;
        assert!(sel.pools().emotional_pool(Emotion::Neutral).contains(&reply.text));
    }

    #[tokio::test]
    async fn test_support_plan_paths() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Ok("- Breathe slowly\n- Drink water\n- Text a friend".to_string()));
        let sel = selector(augmented()).with_generator(Arc::new(generator));

        let plan = sel.support_plan("work is crushing me", CrisisLevel::Low).await;
        assert_eq!(plan, vec!["Breathe slowly", "Drink water", "Text a friend"]);

        let crisis = sel.support_plan("I want to end my life", CrisisLevel::High).await;
        assert_eq!(crisis, sel.pools().crisis_plan);
    }

    #[tokio::test]
    async fn test_support_plan_without_generator() {
        let sel = selector(CompanionConfig::default());
        let plan = sel.support_plan("work is crushing me", CrisisLevel::Low).await;
        assert_eq!(plan, sel.pools().support_plan);
    }

    #[test]
    fn test_invalid_pools_fail_construction() {
        let pools = ResponsePools {
            crisis_high: String::new(),
            ..ResponsePools::default()
        };
        assert!(ResponseSelector::new(pools, CompanionConfig::default()).is_err());
    }
}
