//! Response template pools and crisis content
//!
//! Built-in pools can be replaced by a JSON file. Crisis messages are
//! required fields: a file without them fails to load, and a pool set whose
//! crisis content is empty or malformed fails [`ResponsePools::validate`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::types::{Emotion, Topic};
use crate::{Result, SolaceError};

/// Fixed reply for high-risk messages
pub const CRISIS_HIGH_MESSAGE: &str = "I'm really concerned about what you're sharing. Your safety is the most important thing.

Please reach out immediately:
• Suicide Prevention: 988
• Crisis Text Line: Text HOME to 741741
• Emergency Services: 911

You deserve professional support right now.";

/// Fixed reply for medium-risk messages
pub const CRISIS_MEDIUM_MESSAGE: &str = "I hear how much you're struggling. This sounds incredibly difficult.

Consider speaking with a mental health professional. I'm here with you in the meantime.

Would you like to talk about what's feeling most overwhelming?";

/// Contact lines required in the high-risk message
pub const MIN_CRISIS_CONTACTS: usize = 2;

static CONTACT_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{3}").unwrap_or_else(|e| panic!("contact pattern failed to compile: {}", e))
});

/// Immediate-safety guidance for a locale
pub fn helpline_for(locale: &str) -> String {
    if locale.to_lowercase().starts_with("en") {
        "If you are in immediate danger, call your local emergency number. \
         You can also contact a crisis hotline: US 988 Suicide & Crisis Lifeline, UK Samaritans 116 123."
            .to_string()
    } else {
        "If you are in immediate danger, call your local emergency number. \
         Please reach out to your nearest crisis hotline for support."
            .to_string()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_greetings() -> Vec<String> {
    strings(&[
        "Hi there! 😊 It's really nice to meet you. How are you feeling today?",
        "Hello! Thanks for reaching out. What's on your mind?",
        "Hey! I'm glad you're here. How has your day been?",
        "Hi! It's good to connect with you. What would you like to talk about?",
        "Hello there! I'm here to listen. How are things going for you?",
    ])
}

fn default_acknowledgment() -> Vec<String> {
    strings(&[
        "I hear you. Tell me more about what that's like for you.",
        "Thanks for sharing that. What's that experience been like?",
        "I'm listening. What else comes to mind when you think about this?",
        "That makes sense. How are you feeling as you share this?",
    ])
}

fn default_continuation() -> Vec<String> {
    strings(&[
        "I remember you mentioned something similar before. How are things developing?",
        "This reminds me of our previous conversation. What's changed since then?",
        "You've been exploring this topic for a while. How has your understanding evolved?",
        "I recall this was important to you. What new insights have emerged?",
        "We've touched on this before. What feels different about it now?",
    ])
}

fn default_emotional() -> BTreeMap<Emotion, Vec<String>> {
    let mut pools = BTreeMap::new();
    pools.insert(
        Emotion::Sadness,
        strings(&[
            "I hear the sadness in your words. That sounds really heavy to carry. What's been the most difficult part?",
            "Thank you for trusting me with this. I'm sitting with you in this sadness. Want to share more about what's weighing on you?",
            "That sounds incredibly tough. Your feelings are completely valid. How long has this been affecting you?",
            "I can feel the weight in what you're sharing. You're not alone in this. What kind of support would feel helpful right now?",
        ]),
    );
    pools.insert(
        Emotion::Joy,
        strings(&[
            "I love hearing this! Your joy is contagious. What's making this feel so special?",
            "That's wonderful! Celebrating these moments is so important. Tell me more about what's bringing you happiness!",
            "This is so great to hear! Positive energy like this is precious. What's been the highlight for you?",
            "Your happiness shines through! Thanks for sharing this beautiful moment. What thoughts come up when you feel this way?",
        ]),
    );
    pools.insert(
        Emotion::Anger,
        strings(&[
            "I can feel the intensity of your frustration. That sounds really challenging to navigate. What's been the most upsetting part?",
            "That would make anyone feel angry. Your feelings make complete sense. What would help you feel heard right now?",
            "I hear the anger in your words. This sounds genuinely difficult to deal with. What aspect feels most unfair?",
            "That sounds incredibly frustrating. Anger often comes from real pain. Want to explore what's underneath these feelings?",
        ]),
    );
    pools.insert(
        Emotion::Fear,
        strings(&[
            "That sounds scary. I'm here with you in this uncertainty. What feels most overwhelming right now?",
            "I can hear the worry in your voice. Fear can be so consuming. What kind of reassurance would help?",
            "That sounds really frightening. You're brave for sharing this. What support would feel most comforting?",
            "I hear the anxiety in what you're saying. Let's break this down together - what's the smallest step forward?",
        ]),
    );
    pools.insert(
        Emotion::Neutral,
        strings(&[
            "Thanks for sharing that. What's coming up for you as you think about this?",
            "I appreciate you telling me this. How are you feeling about it now?",
            "That's really interesting. What thoughts does this bring up for you?",
            "Thanks for opening up. What would you like to explore about this?",
        ]),
    );
    pools
}

fn default_contextual() -> BTreeMap<Topic, Vec<String>> {
    let mut pools = BTreeMap::new();
    pools.insert(
        Topic::Work,
        strings(&[
            "Work stress can be really draining. How's your work-life balance been lately?",
            "That sounds challenging. What aspects of work are most demanding right now?",
            "I remember you mentioned work before. Has anything changed since we last talked?",
            "Work pressures can build up. What would make your work environment feel more supportive?",
        ]),
    );
    pools.insert(
        Topic::Projects,
        strings(&[
            "Projects can feel overwhelming. What part has been most challenging for you?",
            "That sounds tough. How long have you been working on this project?",
            "Project deadlines can create so much pressure. What would help make it more manageable?",
            "I recall you were working on this. Has anything gotten easier or harder recently?",
        ]),
    );
    pools.insert(
        Topic::Relationships,
        strings(&[
            "Relationships can be complicated. How are you feeling about this situation now?",
            "That sounds difficult. What do you need most in this relationship right now?",
            "I remember this was on your mind. Any new developments since we spoke?",
            "Relationship dynamics can shift. How has your perspective changed over time?",
        ]),
    );
    pools.insert(
        Topic::Health,
        strings(&[
            "Health concerns can be worrying. How has this been affecting your daily life?",
            "That sounds concerning. What kind of support are you getting for this?",
            "Physical health really impacts everything. What small steps feel manageable?",
            "I hear the concern in your voice. What would ideal support look like for you?",
        ]),
    );
    pools
}

fn default_support_plan() -> Vec<String> {
    strings(&[
        "Take five slow breaths, counting four in and six out",
        "Name five things you can see and three you can hear",
        "Drink some water and step outside or open a window",
        "Message someone you trust and tell them how you feel",
        "If it keeps getting harder, book time with a counsellor or doctor",
    ])
}

fn default_crisis_plan() -> Vec<String> {
    strings(&[
        "Call or text 988, or your local emergency number, right now",
        "Move away from anything you could use to hurt yourself",
        "Stay with someone you trust or ask them to come to you",
    ])
}

/// Every template the selector can answer with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePools {
    /// Fixed reply for high-risk messages
    pub crisis_high: String,
    /// Fixed reply for medium-risk messages
    pub crisis_medium: String,
    /// Opening replies
    #[serde(default = "default_greetings")]
    pub greetings: Vec<String>,
    /// Replies to very short messages
    #[serde(default = "default_acknowledgment")]
    pub acknowledgment: Vec<String>,
    /// Replies that reference earlier turns
    #[serde(default = "default_continuation")]
    pub continuation: Vec<String>,
    /// Replies keyed by dominant emotion
    #[serde(default = "default_emotional")]
    pub emotional: BTreeMap<Emotion, Vec<String>>,
    /// Follow-up questions keyed by topic
    #[serde(default = "default_contextual")]
    pub contextual: BTreeMap<Topic, Vec<String>>,
    /// Coping steps offered when no generator is available
    #[serde(default = "default_support_plan")]
    pub support_plan: Vec<String>,
    /// Steps offered for high-risk messages
    #[serde(default = "default_crisis_plan")]
    pub crisis_plan: Vec<String>,
}

impl Default for ResponsePools {
    fn default() -> Self {
        Self {
            crisis_high: CRISIS_HIGH_MESSAGE.to_string(),
            crisis_medium: CRISIS_MEDIUM_MESSAGE.to_string(),
            greetings: default_greetings(),
            acknowledgment: default_acknowledgment(),
            continuation: default_continuation(),
            emotional: default_emotional(),
            contextual: default_contextual(),
            support_plan: default_support_plan(),
            crisis_plan: default_crisis_plan(),
        }
    }
}

impl ResponsePools {
    /// Parse pools from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read pools from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SolaceError::config(format!(
                "Failed to read response pools from {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json(&raw)
    }

    /// Built-in pools, or the file at `path` when given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let pools = match path {
            Some(p) => {
                tracing::info!("Loading response pools from {}", p.display());
                Self::from_json_file(p)?
            }
            None => Self::default(),
        };
        pools.validate()?;
        Ok(pools)
    }

    /// Check the pools can serve every path. Missing crisis content is a
    /// configuration error, never a runtime fallback.
    pub fn validate(&self) -> Result<()> {
        if self.crisis_high.trim().is_empty() {
            return Err(SolaceError::invalid_pool("crisis_high", "message is empty"));
        }
        let contacts = self
            .crisis_high
            .lines()
            .filter(|l| CONTACT_LINE_RE.is_match(l))
            .count();
        if contacts < MIN_CRISIS_CONTACTS {
            return Err(SolaceError::invalid_pool(
                "crisis_high",
                format!(
                    "needs at least {} hotline or text-line contacts, found {}",
                    MIN_CRISIS_CONTACTS, contacts
                ),
            ));
        }
        if self.crisis_medium.trim().is_empty() {
            return Err(SolaceError::invalid_pool("crisis_medium", "message is empty"));
        }
        if self.crisis_medium.trim() == self.crisis_high.trim() {
            return Err(SolaceError::invalid_pool(
                "crisis_medium",
                "must differ from the high-risk message",
            ));
        }
        if self.crisis_plan.is_empty() {
            return Err(SolaceError::invalid_pool("crisis_plan", "pool is empty"));
        }
        for (name, pool) in [
            ("greetings", &self.greetings),
            ("acknowledgment", &self.acknowledgment),
        ] {
            if pool.is_empty() {
                return Err(SolaceError::invalid_pool(name, "pool is empty"));
            }
        }
        if self.emotional.get(&Emotion::Neutral).map_or(true, |p| p.is_empty()) {
            return Err(SolaceError::invalid_pool(
                "emotional.neutral",
                "fallback pool is empty",
            ));
        }
        Ok(())
    }

    /// Pool for an emotion, falling back to the neutral pool
    pub fn emotional_pool(&self, emotion: Emotion) -> &[String] {
        self.emotional
            .get(&emotion)
            .filter(|p| !p.is_empty())
            .or_else(|| self.emotional.get(&Emotion::Neutral))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Follow-up pool for a topic, if it has one
    pub fn contextual_pool(&self, topic: Topic) -> Option<&[String]> {
        self.contextual
            .get(&topic)
            .filter(|p| !p.is_empty())
            .map(Vec::as_slice)
    }
}
