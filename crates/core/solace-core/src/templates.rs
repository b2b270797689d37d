//! Template engine for prompt generation

use handlebars::Handlebars;
use serde::Serialize;

use crate::types::{ConversationMemory, CrisisLevel, Emotion};
use crate::{Result, SolaceError};

/// Registered name of the empathetic reply prompt
pub const REPLY_TEMPLATE_NAME: &str = "empathetic_reply";
/// Registered name of the support plan prompt
pub const SUPPORT_PLAN_TEMPLATE_NAME: &str = "support_plan";

/// Prompt asking for one empathetic reply
pub const REPLY_PROMPT_TEMPLATE: &str = r#"You are {{companion_name}}, a compassionate, non-judgmental mental health support companion.
Goals: reflect feelings, validate, normalize, and offer gentle hope.
{{#each tone}}- {{this}}
{{/each}}
{{#if context}}Recent conversation:
{{#each context}}User ({{emotion}}): {{user}}
{{../companion_name}}: {{bot}}
{{/each}}
{{/if}}User message (may be multilingual): {{user_text}}
Detected emotion: {{emotion}}

Write a supportive, empathetic response in the same language as the user. Use simple language and {{min_sentences}}-{{max_sentences}} sentences."#;

/// Prompt asking for a short list of coping steps
pub const SUPPORT_PLAN_PROMPT_TEMPLATE: &str = r#"You are a supportive assistant. Create a brief, safe, actionable plan with {{min_steps}}-{{max_steps}} bullet points to help the user cope right now. Include self-care, grounding, and optional social/pro help. Avoid medical advice, diagnosis, or unsafe instructions. Keep steps simple and feasible.

User message: {{user_text}}

Return only bullet points starting with '- '. Keep each under {{max_words_per_step}} words."#;

/// Tone rules every generated reply must follow
pub const DEFAULT_TONE: &[&str] = &[
    "Avoid medical claims or diagnosis.",
    "Keep tone warm, brief, and culturally sensitive.",
    "Never describe yourself as an AI or a language model.",
];

/// One earlier exchange embedded in a prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextLine {
    /// User text
    pub user: String,
    /// Companion reply
    pub bot: String,
    /// Emotion detected for the user text
    pub emotion: Emotion,
}

/// Typed fields of the empathetic reply prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyPrompt {
    /// Name the companion speaks as
    pub companion_name: String,
    /// Current user message
    pub user_text: String,
    /// Dominant emotion for the message
    pub emotion: Emotion,
    /// Crisis tier for the message
    pub crisis_level: CrisisLevel,
    /// Recent exchanges, oldest first
    pub context: Vec<ContextLine>,
    /// Tone constraints
    pub tone: Vec<String>,
    /// Requested length range
    pub min_sentences: usize,
    /// Requested length range
    pub max_sentences: usize,
}

impl ReplyPrompt {
    /// Prompt with default tone and no context
    pub fn new(user_text: impl Into<String>, emotion: Emotion) -> Self {
        Self {
            companion_name: "Alex".to_string(),
            user_text: user_text.into(),
            emotion,
            crisis_level: CrisisLevel::Low,
            context: Vec::new(),
            tone: DEFAULT_TONE.iter().map(|s| s.to_string()).collect(),
            min_sentences: 2,
            max_sentences: 4,
        }
    }

    /// Set the companion name
    pub fn with_companion_name(mut self, name: impl Into<String>) -> Self {
        self.companion_name = name.into();
        self
    }

    /// Set the crisis tier
    pub fn with_crisis_level(mut self, level: CrisisLevel) -> Self {
        self.crisis_level = level;
        self
    }

    /// Embed the `turns` most recent exchanges
    pub fn with_context(mut self, memory: &ConversationMemory, turns: usize) -> Self {
        self.context = memory
            .recent(turns)
            .into_iter()
            .map(|t| ContextLine {
                user: t.user_text.clone(),
                bot: t.bot_text.clone(),
                emotion: t.emotion,
            })
            .collect();
        self
    }

    /// Add a tone constraint
    pub fn with_tone(mut self, rule: impl Into<String>) -> Self {
        self.tone.push(rule.into());
        self
    }
}

/// Typed fields of the support plan prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportPlanPrompt {
    /// Current user message
    pub user_text: String,
    /// Fewest steps requested
    pub min_steps: usize,
    /// Most steps requested
    pub max_steps: usize,
    /// Word limit per step
    pub max_words_per_step: usize,
}

impl SupportPlanPrompt {
    /// Prompt asking for 3-5 steps of under 18 words
    pub fn new(user_text: impl Into<String>) -> Self {
        Self {
            user_text: user_text.into(),
            min_steps: 3,
            max_steps: 5,
            max_words_per_step: 18,
        }
    }
}

/// Template engine wrapper
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    /// Engine with the built-in prompts registered
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();

        // Prompts are plain text, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(false);

        let mut engine = Self { handlebars };
        engine.register_template(REPLY_TEMPLATE_NAME, REPLY_PROMPT_TEMPLATE)?;
        engine.register_template(SUPPORT_PLAN_TEMPLATE_NAME, SUPPORT_PLAN_PROMPT_TEMPLATE)?;
        Ok(engine)
    }

    /// Register (or replace) a template
    pub fn register_template(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(|e| SolaceError::template(e.to_string()))?;
        Ok(())
    }

    /// Render a registered template
    pub fn render_named<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        self.handlebars
            .render(name, data)
            .map_err(|e| SolaceError::template(e.to_string()))
    }

    /// Render the empathetic reply prompt
    pub fn render_reply(&self, prompt: &ReplyPrompt) -> Result<String> {
        self.render_named(REPLY_TEMPLATE_NAME, prompt)
    }

    /// Render the support plan prompt
    pub fn render_support_plan(&self, prompt: &SupportPlanPrompt) -> Result<String> {
        self.render_named(SUPPORT_PLAN_TEMPLATE_NAME, prompt)
    }
}
