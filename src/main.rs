use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

mod app;
mod assistant;
mod business;
mod completion;
mod config;
mod events;
mod session;
mod transcript;
mod tui;
mod ui;

use assistant::Assistant;
use completion::GeminiClient;
use config::Config;
use session::Session;
use transcript::Role;

const DEFAULT_LOG_FILTER: &str = "xpac_assistant=info";

#[derive(Parser)]
#[command(name = "xpac-assistant")]
#[command(version)]
#[command(about = "XPAC Technology logistics assistant", long_about = None)]
struct Cli {
    /// Path to a config file (defaults to ~/.xpac/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the completion model
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat widget (default)
    Chat,
    /// Ask a single question and print the exchange
    Ask { question: String },
    /// Print the system instruction sent with every request
    Prompt,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        config.model = model;
    }

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            init_file_logging()?;
            run_chat(config).await
        }
        Commands::Ask { question } => {
            init_stderr_logging();
            ask(config, question).await
        }
        Commands::Prompt => {
            println!("{}", business::system_instruction());
            Ok(())
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// The TUI owns the terminal, so interactive sessions log to a file.
fn init_file_logging() -> Result<()> {
    let log_path = Config::log_path()?;
    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir).context("Failed to create log directory")?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn init_stderr_logging() {
    fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

fn build_session(config: &Config) -> Result<Session> {
    if !config.has_api_key() {
        tracing::warn!("no API key configured; replies will use the phone fallback");
    }
    let client = GeminiClient::new(config).context("Failed to create completion client")?;
    let assistant = Assistant::new(config.transcript_capacity);
    Ok(Session::new(assistant, Arc::new(client)))
}

async fn run_chat(config: Config) -> Result<()> {
    let session = build_session(&config)?;
    let tick_rate = Duration::from_millis(config.ui.tick_rate_ms.max(16));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = app::App::new(session).run(&mut terminal, tick_rate).await;
    tui::restore()?;
    result
}

async fn ask(config: Config, question: String) -> Result<()> {
    let mut session = build_session(&config)?;
    session.update_draft(question);
    if !session.submit_and_wait().await {
        anyhow::bail!("Question is empty");
    }

    for message in session.assistant().transcript() {
        let who = match message.role() {
            Role::User => "You",
            Role::Assistant => "Sanda",
        };
        println!("{who}: {}", message.text());
    }
    Ok(())
}
