//! Conversation sessions
//!
//! A [`SessionContext`] holds everything that belongs to one conversation.
//! [`CompanionSession`] pairs it with a classifier adapter and a selector;
//! `process_turn` takes `&mut self`, so a session resolves one turn at a
//! time. [`SessionManager`] keeps independent sessions apart by id and
//! shares only the collaborator handles between them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::avatar::{describe, AvatarDescriptor};
use crate::classifier::EmotionClassifier;
use crate::config::CompanionConfig;
use crate::nlp::extract_insights;
use crate::pools::{helpline_for, ResponsePools};
use crate::selector::{ResponseKind, ResponseSelector};
use crate::types::{
    CompanionProfile, ConversationMemory, ConversationSummary, ConversationTurn, CrisisLevel,
    Emotion, SentimentClassifier, SentimentResult, TextGenerator,
};
use crate::{Result, SolaceError};

/// Turns looked at when computing the emotion trend
pub const TREND_WINDOW: usize = 3;

/// Per-conversation state. Never shared between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Recent turns
    pub memory: ConversationMemory,
    /// Topics, interests and the first-turn flag
    pub profile: CompanionProfile,
    /// Locale tag used for helpline guidance
    pub locale: String,
    /// Highest crisis tier seen since the last reset
    pub peak_crisis: CrisisLevel,
}

impl SessionContext {
    /// Empty context with a memory cap
    pub fn new(history_cap: usize, locale: impl Into<String>) -> Self {
        Self {
            memory: ConversationMemory::new(history_cap),
            profile: CompanionProfile::default(),
            locale: locale.into(),
            peak_crisis: CrisisLevel::Low,
        }
    }

    /// Record a completed turn: memory, topics and interests, the
    /// first-turn flag and the crisis peak
    pub fn record_turn(&mut self, user_text: &str, bot_text: &str, sentiment: &SentimentResult) {
        self.memory.push(ConversationTurn::new(
            user_text,
            bot_text,
            sentiment.dominant_emotion,
        ));
        extract_insights(user_text, &mut self.profile);
        if self.profile.complete_turn() {
            debug!("First interaction completed");
        }
        self.peak_crisis = self.peak_crisis.max(sentiment.crisis_level);
    }

    /// Forget all turns and the profile
    pub fn reset(&mut self) {
        self.memory.clear();
        self.profile.reset();
        self.peak_crisis = CrisisLevel::Low;
    }

    /// Most frequent emotion across the last few turns. Needs at least two
    /// turns, otherwise neutral. Ties go to the most recent emotion.
    pub fn emotion_trend(&self) -> Emotion {
        if self.memory.len() < 2 {
            return Emotion::Neutral;
        }
        let recent = self.memory.recent_emotions(TREND_WINDOW);
        let mut best = (Emotion::Neutral, 0usize);
        for emotion in recent.iter().rev() {
            let count = recent.iter().filter(|e| *e == emotion).count();
            if count > best.1 {
                best = (*emotion, count);
            }
        }
        best.0
    }

    /// Snapshot for display
    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            history_length: self.memory.len(),
            topics_discussed: self.profile.topics_discussed.iter().copied().collect(),
            user_interests: self.profile.user_interests.iter().cloned().collect(),
            current_emotion_trend: self.emotion_trend(),
            peak_crisis_level: self.peak_crisis,
            first_interaction: self.profile.first_interaction,
        }
    }
}

/// Result of one processed turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Reply shown to the user
    pub reply: String,
    /// Rung of the selection ladder that produced the reply
    pub kind: ResponseKind,
    /// Emotional state estimated for the user text
    pub sentiment: SentimentResult,
    /// Avatar to show alongside the reply
    pub avatar: AvatarDescriptor,
    /// Locale helpline guidance, present on crisis turns
    pub helpline: Option<String>,
}

/// One conversation with the companion
pub struct CompanionSession {
    id: Uuid,
    context: SessionContext,
    classifier: EmotionClassifier,
    selector: ResponseSelector,
}

impl CompanionSession {
    /// Session over an existing classifier and selector
    pub fn new(classifier: EmotionClassifier, selector: ResponseSelector) -> Self {
        let config = selector.config();
        let context = SessionContext::new(config.history_cap, config.locale.clone());
        Self {
            id: Uuid::new_v4(),
            context,
            classifier,
            selector,
        }
    }

    /// Keyword-only, template-only session with built-in pools
    pub fn with_defaults() -> Result<Self> {
        let selector = ResponseSelector::new(ResponsePools::default(), CompanionConfig::default())?;
        Ok(Self::new(EmotionClassifier::keyword_only(), selector))
    }

    /// Session identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Configuration the session was built with
    pub fn config(&self) -> &CompanionConfig {
        self.selector.config()
    }

    /// Read-only view of the conversation state
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Classify, select, record and describe one user message
    pub async fn process_turn(&mut self, text: &str) -> TurnOutcome {
        let sentiment = self.classifier.classify(text).await;
        debug!(
            session = %self.id,
            emotion = %sentiment.dominant_emotion,
            crisis = %sentiment.crisis_level,
            "Message classified"
        );

        let reply = self
            .selector
            .respond(&mut self.context, text, &sentiment)
            .await;

        let helpline = if sentiment.crisis_level.is_crisis() {
            info!(session = %self.id, level = %sentiment.crisis_level, "Crisis response sent");
            Some(helpline_for(&self.context.locale))
        } else {
            None
        };

        TurnOutcome {
            avatar: describe(
                sentiment.dominant_emotion,
                sentiment.confidence,
                sentiment.crisis_level,
            ),
            reply: reply.text,
            kind: reply.kind,
            sentiment,
            helpline,
        }
    }

    /// Coping steps for `text`
    pub async fn support_plan(&self, text: &str) -> Vec<String> {
        let level = self.classifier.assess_crisis(text).level;
        self.selector.support_plan(text, level).await
    }

    /// Start the conversation over
    pub fn reset(&mut self) {
        info!(session = %self.id, "Session reset");
        self.context.reset();
    }

    /// Snapshot for display
    pub fn summary(&self) -> ConversationSummary {
        self.context.summary()
    }
}

/// Independent sessions sharing the same collaborators
pub struct SessionManager {
    config: CompanionConfig,
    pools: ResponsePools,
    classifier: Option<Arc<dyn SentimentClassifier>>,
    generator: Option<Arc<dyn TextGenerator>>,
    sessions: HashMap<Uuid, CompanionSession>,
    created: u64,
}

impl SessionManager {
    /// Manager using the pools named in the config (or the built-ins)
    pub fn new(config: CompanionConfig) -> Result<Self> {
        config.validate()?;
        let pools = ResponsePools::load(config.templates_path.as_deref())?;
        Ok(Self {
            config,
            pools,
            classifier: None,
            generator: None,
            sessions: HashMap::new(),
            created: 0,
        })
    }

    /// Share an emotion classifier with every new session
    pub fn with_classifier(mut self, classifier: Arc<dyn SentimentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Share a text generator with every new session
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Open a session and return its id.
    ///
    /// With a configured seed, the n-th session is seeded with `seed + n`, so
    /// sessions differ from each other but a manager replays exactly.
    pub fn create_session(&mut self) -> Result<Uuid> {
        let mut config = self.config.clone();
        config.seed = self.config.seed.map(|seed| seed.wrapping_add(self.created));
        self.created += 1;

        let mut selector = ResponseSelector::new(self.pools.clone(), config)?;
        if let Some(generator) = &self.generator {
            selector = selector.with_generator(Arc::clone(generator));
        }
        let classifier = EmotionClassifier::from_option(self.classifier.clone())
            .with_timeout(self.config.classifier_timeout());

        let session = CompanionSession::new(classifier, selector);
        let id = session.id();
        self.sessions.insert(id, session);
        info!(session = %id, "Session created");
        Ok(id)
    }

    /// Session by id
    pub fn get(&self, id: &Uuid) -> Option<&CompanionSession> {
        self.sessions.get(id)
    }

    /// Mutable session by id
    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut CompanionSession> {
        self.sessions.get_mut(id)
    }

    /// Process a turn in the given session
    pub async fn process_turn(&mut self, id: &Uuid, text: &str) -> Result<TurnOutcome> {
        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| SolaceError::not_found(format!("session {}", id)))?;
        Ok(session.process_turn(text).await)
    }

    /// Close a session, returning whether it existed
    pub fn end_session(&mut self, id: &Uuid) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            info!(session = %id, "Session ended");
        }
        removed
    }

    /// Number of open sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no session is open
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Topic;

    fn sentiment(emotion: Emotion, level: CrisisLevel) -> SentimentResult {
        SentimentResult {
            dominant_emotion: emotion,
            crisis_level: level,
            ..SentimentResult::greeting()
        }
    }

    #[test]
    fn test_record_turn_updates_everything() {
        let mut ctx = SessionContext::new(8, "en");
        ctx.record_turn(
            "My boss wants the project by Friday",
            "That sounds like a lot.",
            &sentiment(Emotion::Fear, CrisisLevel::Medium),
        );

        assert_eq!(ctx.memory.len(), 1);
        assert!(ctx.profile.topics_discussed.contains(&Topic::Work));
        assert!(ctx.profile.topics_discussed.contains(&Topic::Projects));
        assert!(!ctx.profile.first_interaction);
        assert_eq!(ctx.peak_crisis, CrisisLevel::Medium);

        ctx.record_turn("fine", "ok", &sentiment(Emotion::Neutral, CrisisLevel::Low));
        assert_eq!(ctx.peak_crisis, CrisisLevel::Medium);
    }

    #[test]
    fn test_emotion_trend() {
        let mut ctx = SessionContext::new(8, "en");
        let low = CrisisLevel::Low;
        ctx.record_turn("a", "b", &sentiment(Emotion::Anger, low));
        assert_eq!(ctx.emotion_trend(), Emotion::Neutral);

        ctx.record_turn("a", "b", &sentiment(Emotion::Sadness, low));
        // one each: most recent wins
        assert_eq!(ctx.emotion_trend(), Emotion::Sadness);

        ctx.record_turn("a", "b", &sentiment(Emotion::Anger, low));
        assert_eq!(ctx.emotion_trend(), Emotion::Anger);

        ctx.record_turn("a", "b", &sentiment(Emotion::Joy, low));
        ctx.record_turn("a", "b", &sentiment(Emotion::Joy, low));
        assert_eq!(ctx.emotion_trend(), Emotion::Joy);
    }

    #[test]
    fn test_reset_clears_context() {
        let mut ctx = SessionContext::new(8, "en");
        ctx.record_turn("my friend left", "ok", &sentiment(Emotion::Sadness, CrisisLevel::High));
        ctx.reset();

        let summary = ctx.summary();
        assert_eq!(summary.history_length, 0);
        assert!(summary.topics_discussed.is_empty());
        assert!(summary.first_interaction);
        assert_eq!(summary.peak_crisis_level, CrisisLevel::Low);
    }

    #[tokio::test]
    async fn test_session_attaches_helpline_on_crisis() {
        let mut session = CompanionSession::with_defaults().unwrap();

        let outcome = session.process_turn("I can't cope anymore").await;
        assert_eq!(outcome.kind, ResponseKind::CrisisMedium);
        assert!(outcome.helpline.as_deref().unwrap().contains("988"));
        assert_eq!(outcome.avatar.crisis_level, CrisisLevel::Medium);

        let outcome = session.process_turn("the weather was fine today").await;
        assert!(outcome.helpline.is_none());
        assert_eq!(session.summary().history_length, 2);
    }

    #[tokio::test]
    async fn test_manager_keeps_sessions_apart() {
        let mut manager = SessionManager::new(CompanionConfig::default().with_seed(5)).unwrap();
        let a = manager.create_session().unwrap();
        let b = manager.create_session().unwrap();
        assert_ne!(a, b);
        assert_eq!(manager.len(), 2);

        manager.process_turn(&a, "my boss is awful at work").await.unwrap();
        manager.process_turn(&a, "and my sleep is bad").await.unwrap();

        assert_eq!(manager.get(&a).unwrap().summary().history_length, 2);
        assert_eq!(manager.get(&b).unwrap().summary().history_length, 0);
        assert!(manager.get(&b).unwrap().summary().topics_discussed.is_empty());

        assert!(manager.end_session(&a));
        assert!(!manager.end_session(&a));
        assert!(manager.process_turn(&a, "hello").await.is_err());
    }

    #[test]
    fn test_seeded_manager_gives_each_session_its_own_seed() {
        let seeds = || {
            let mut manager = SessionManager::new(CompanionConfig::default().with_seed(100)).unwrap();
            (0..3)
                .map(|_| {
                    let id = manager.create_session().unwrap();
                    manager.get(&id).unwrap().config().seed
                })
                .collect::<Vec<_>>()
        };

        let first = seeds();
        assert_eq!(first, vec![Some(100), Some(101), Some(102)]);
        assert_eq!(first, seeds());

        let mut unseeded = SessionManager::new(CompanionConfig::default()).unwrap();
        let id = unseeded.create_session().unwrap();
        assert_eq!(unseeded.get(&id).unwrap().config().seed, None);
    }
}
