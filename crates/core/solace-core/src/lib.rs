//! Solace Core Engine
//!
//! Crisis-aware response selection for a supportive chat companion. Each
//! user message goes through:
//!
//! - Crisis phrase detection (high / medium / low)
//! - Emotion estimation through an optional external classifier, with a
//!   keyword fallback
//! - Topic and interest tracking
//! - A prioritized reply ladder: crisis, greeting, acknowledgment, topic
//!   follow-up, continuation, then generated or templated replies
//! - An avatar descriptor for the front end
//!
//! External models are reached only through the [`SentimentClassifier`] and
//! [`TextGenerator`] traits. Every call is bounded by a timeout and any
//! failure falls back to templates.
//!
//! # Example
//!
//! ```no_run
//! use solace_core::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut session = CompanionSession::with_defaults()?;
//!     let outcome = session.process_turn("I feel so anxious about my exam tomorrow").await;
//!     println!("{}", outcome.reply);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export commonly used types
pub use uuid::Uuid;

// Core modules
pub mod avatar;
pub mod classifier;
pub mod config;
pub mod detectors;
pub mod error;
pub mod generation;
pub mod nlp;
pub mod picker;
pub mod pools;
pub mod selector;
pub mod session;
pub mod templates;
pub mod testing;
pub mod types;
pub mod utils;

// Re-exports
pub use avatar::{
    background_tint, crisis_color, describe, emotion_emoji, Animation, AvatarDescriptor, FacePattern,
};
pub use classifier::{normalize_label, EmotionClassifier};
pub use config::{get_env_float, get_env_int, get_env_or, load_env, CompanionConfig, ResponseMode};
pub use detectors::{detect_crisis, CrisisAssessment, CrisisDetector};
pub use error::{Result, SolaceError};
pub use generation::{parse_support_plan, ReplyValidator, Rejection};
pub use picker::TemplatePicker;
pub use pools::{helpline_for, ResponsePools, CRISIS_HIGH_MESSAGE, CRISIS_MEDIUM_MESSAGE};
pub use selector::{Reply, ResponseKind, ResponseSelector};
pub use session::{CompanionSession, SessionContext, SessionManager, TurnOutcome};
pub use templates::{ReplyPrompt, SupportPlanPrompt, TemplateEngine};
pub use types::*;
pub use utils::{init_logging, init_logging_with};
