use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use taskcard::board::TaskBoard;
use taskcard::config::{Config, CONFIG_FILE};
use taskcard::ui::{run_app, App};
use taskcard::{CachedResolver, CategoryFile, CategoryLookups};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "taskcard", version, about = "Terminal task card viewer")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", default_value = CONFIG_FILE)]
    config_path: PathBuf,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a config and sample tasks into DIR
    Init {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Show the task card (default)
    Show,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Some(Command::Init { dir }) => {
            if Config::init(&dir)? {
                println!("taskcard initialized in {}", dir.display());
            } else {
                println!("taskcard already initialized in {}", dir.display());
            }
            Ok(())
        }
        Some(Command::Show) | None => show(&cli.config_path, &cli.log_level).await,
    }
}

fn init_tracing(config: &Config, level: &str) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_new(level).context("invalid log level")?;
    let appender = tracing_appender::rolling::never(&config.log_dir, &config.log_file);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

async fn show(config_path: &std::path::Path, log_level: &str) -> Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let _guard = init_tracing(&config, log_level)?;
    info!(config_path = %config_path.display(), "starting taskcard");

    let board = TaskBoard::load_from_file(&config.tasks_path)
        .context("loading tasks (run `taskcard init` to create samples)")?;
    info!(task_count = board.tasks.len(), "tasks loaded");

    let categories =
        CategoryFile::new(&config.categories_path).with_latency(config.resolver.latency());
    info!(
        categories_path = %categories.path().display(),
        latency_ms = config.resolver.latency_ms,
        "category names from file"
    );
    let resolver = CachedResolver::new(categories, config.resolver.cache_capacity);
    let (lookups, updates) = CategoryLookups::new(Arc::new(resolver), config.retry_policy());
    let (mut app, intents) = App::new(board);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &lookups, updates, intents).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        error!(error = %err, "taskcard exited with error");
    }
    result.map_err(Into::into)
}
