use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use web_builder::artifact::{write_html, EXPORT_FILE_NAME};
use web_builder::logging::{default_log_file, init_logging, LogConfig, LogTarget};
use web_builder::config::load_dotenv;
use web_builder::{
    build_generator, Config, ConfigError, ConversationState, GenerationController,
    GenerationOutcome, Session, Settings,
};

mod app;
mod handler;
mod preview;
mod tui;
mod ui;

use app::App;

#[derive(Parser)]
#[command(name = "webbuilder")]
#[command(version, about = "Chat your way to a single-file website")]
struct Cli {
    /// Config file (defaults to <config dir>/web-builder/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one page without the interactive UI
    Generate {
        /// What the website should be
        prompt: String,
        /// Existing HTML document to revise
        #[arg(long)]
        from: Option<PathBuf>,
        /// Where to write the result
        #[arg(short, long, default_value = EXPORT_FILE_NAME)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Before logging so RUST_LOG and LOG_FORMAT can come from .env too
    let dotenv = load_dotenv();

    match cli.command {
        None => {
            init_tui_logging();
            report_dotenv(dotenv);
            let settings = load_settings(cli.config.as_deref())?;
            run_tui(settings).await
        }
        Some(Commands::Generate { prompt, from, output }) => {
            init_logging(LogConfig::new(LogTarget::Stderr))
                .context("Failed to initialize logging")?;
            report_dotenv(dotenv);
            let settings = load_settings(cli.config.as_deref())?;
            run_generate(settings, &prompt, from.as_deref(), &output).await
        }
    }
}

/// The TUI owns the terminal, so logs go to a file. Without a usable log
/// file the app still runs, only unlogged.
fn init_tui_logging() {
    let Some(path) = default_log_file() else {
        return;
    };
    if let Err(e) = init_logging(LogConfig::new(LogTarget::File(path.clone()))) {
        // The terminal is not taken yet, so this still reaches the user
        eprintln!("Logging disabled: cannot write {}: {}", path.display(), e);
    }
}

fn report_dotenv(result: Result<Option<PathBuf>, dotenvy::Error>) {
    match result {
        Ok(Some(path)) => tracing::info!(path = %path.display(), "Loaded environment file"),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }
}

/// Read the config file and resolve the API key. A missing key stops startup.
fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => match Config::load() {
            Ok(config) => config,
            Err(ConfigError::NoConfigDir) => {
                tracing::warn!("No config directory available, using defaults");
                Config::default()
            }
            Err(e) => return Err(e.into()),
        },
    };

    let settings = Settings::resolve(config)?;
    tracing::info!(
        provider = %settings.config.provider,
        model = %settings.config.model(),
        "Configuration loaded"
    );
    Ok(settings)
}

fn build_controller(settings: &Settings) -> Arc<GenerationController> {
    let config = &settings.config;
    let generator = build_generator(
        config.provider,
        &settings.api_key,
        config.model(),
        config.request_timeout(),
    );
    Arc::new(GenerationController::new(generator, config.generation_options()))
}

async fn run_tui(settings: Settings) -> Result<()> {
    let controller = build_controller(&settings);
    let export_dir = std::env::current_dir().context("Failed to read current directory")?;
    let mut app = App::new(Session::new(controller), settings.config.provider, export_dir);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    tracing::info!("Session closed");
    result
}

async fn run_generate(
    settings: Settings,
    prompt: &str,
    from: Option<&Path>,
    output: &Path,
) -> Result<()> {
    let controller = build_controller(&settings);

    let mut state = match from {
        Some(path) => {
            let existing = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            ConversationState::with_artifact(existing)
        }
        None => ConversationState::new(),
    };

    match controller.run_turn(&mut state, prompt).await {
        None => bail!("Prompt is empty"),
        Some(GenerationOutcome::Failure { error_message }) => bail!(error_message),
        Some(GenerationOutcome::Success { artifact_text }) => {
            write_html(&artifact_text, output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("{}", web_builder::controller::GENERATED_CONFIRMATION);
            println!("Saved {}", output.display());
            Ok(())
        }
    }
}
