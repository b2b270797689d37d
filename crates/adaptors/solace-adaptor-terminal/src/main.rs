//! Solace terminal chat
//!
//! Reads messages from stdin, one per line, and prints the companion's
//! replies. Logs go to stderr so they can be redirected away from the chat.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use solace_core::{
    crisis_color, emotion_emoji, init_logging, load_env, CompanionConfig, CompanionSession,
    EmotionClassifier, ResponseMode, ResponseSelector, SentimentClassifier, TurnOutcome,
};
use solace_provider_local::LocalProviderConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Seed for template choice (replayable conversations)
    #[arg(long)]
    seed: Option<u64>,

    /// Reply mode
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Locale used for helpline guidance
    #[arg(long)]
    locale: Option<String>,

    /// JSON file overriding the built-in response pools
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Ollama server URL (model-augmented mode)
    #[arg(long)]
    ollama_url: Option<String>,

    /// Ollama model name (model-augmented mode)
    #[arg(long)]
    ollama_model: Option<String>,

    /// Emotion classification endpoint
    #[arg(long)]
    classifier_url: Option<String>,

    /// Print each turn as JSON instead of plain text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Answer from template pools only
    Template,
    /// Ask the local model first, fall back to templates
    Model,
}

impl From<ModeArg> for ResponseMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Template => ResponseMode::TemplateOnly,
            ModeArg::Model => ResponseMode::ModelAugmented,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Reset,
    Summary,
    Help,
    Plan(Option<&'a str>),
    Say(&'a str),
    Skip,
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Command::Skip;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Say(line);
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (rest, None),
    };
    match name.to_lowercase().as_str() {
        "quit" | "exit" | "q" => Command::Quit,
        "reset" => Command::Reset,
        "summary" => Command::Summary,
        "plan" => Command::Plan(arg),
        "help" | "?" => Command::Help,
        _ => Command::Say(line),
    }
}

const HELP: &str = "Commands: /summary, /plan [text], /reset, /help, /quit";

fn build_config(cli: &Cli) -> Result<CompanionConfig> {
    let mut config = CompanionConfig::from_env().context("invalid SOLACE_* configuration")?;
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(mode) = cli.mode {
        config.mode = mode.into();
    }
    if let Some(locale) = &cli.locale {
        config.locale = locale.clone();
    }
    if let Some(path) = &cli.templates {
        config.templates_path = Some(path.clone());
    }
    config.validate()?;
    Ok(config)
}

fn build_session(cli: &Cli, config: CompanionConfig) -> Result<CompanionSession> {
    let mut providers = LocalProviderConfig::from_env()?;
    if let Some(url) = &cli.ollama_url {
        providers.ollama_url = url.clone();
    }
    if let Some(model) = &cli.ollama_model {
        providers.ollama_model = model.clone();
    }
    if let Some(url) = &cli.classifier_url {
        providers.classifier_url = Some(url.clone());
    }
    providers.validate()?;

    let classifier_timeout = config.classifier_timeout();
    let model_augmented = config.mode == ResponseMode::ModelAugmented;

    let mut selector = ResponseSelector::from_config(config)?;
    if model_augmented {
        tracing::info!(
            "Model-augmented replies via {} ({})",
            providers.ollama_url,
            providers.ollama_model
        );
        selector = selector.with_generator(Arc::new(providers.generator()?));
    }

    let remote = providers
        .classifier()?
        .map(|c| Arc::new(c) as Arc<dyn SentimentClassifier>);
    if remote.is_none() {
        tracing::info!("No classifier endpoint configured, using keyword scoring");
    }
    let classifier = EmotionClassifier::from_option(remote).with_timeout(classifier_timeout);

    Ok(CompanionSession::new(classifier, selector))
}

fn render_outcome(outcome: &TurnOutcome) -> String {
    let sentiment = &outcome.sentiment;
    let mut out = format!(
        "{} {} ({:.0}%) | crisis: {} {}\n{}",
        emotion_emoji(sentiment.dominant_emotion),
        sentiment.dominant_emotion,
        sentiment.confidence * 100.0,
        sentiment.crisis_level,
        crisis_color(sentiment.crisis_level),
        outcome.reply
    );
    if let Some(helpline) = &outcome.helpline {
        out.push_str("\n\n");
        out.push_str(helpline);
    }
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    load_env()?;
    init_logging()?;

    let config = build_config(&cli)?;
    let mut session = build_session(&cli, config)?;
    tracing::info!(session = %session.id(), "Chat session started");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_message: Option<String> = None;

    stdout
        .write_all(format!("Hi, I'm here to listen. {}\n", HELP).as_bytes())
        .await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let output = match parse_command(&line) {
            Command::Skip => continue,
            Command::Quit => break,
            Command::Help => HELP.to_string(),
            Command::Reset => {
                session.reset();
                last_message = None;
                "Starting fresh.".to_string()
            }
            Command::Summary => serde_json::to_string_pretty(&session.summary())?,
            Command::Plan(arg) => match arg.map(str::to_string).or_else(|| last_message.clone()) {
                Some(text) => session
                    .support_plan(&text)
                    .await
                    .iter()
                    .map(|step| format!("- {}", step))
                    .collect::<Vec<_>>()
                    .join("\n"),
                None => "Tell me a little about what's going on first.".to_string(),
            },
            Command::Say(text) => {
                let outcome = session.process_turn(text).await;
                last_message = Some(text.to_string());
                if cli.json {
                    serde_json::to_string(&outcome)?
                } else {
                    render_outcome(&outcome)
                }
            }
        };

        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }

    tracing::info!(session = %session.id(), "Chat session ended");
    Ok(())
}
