//! rz-command CLI
//!
//! Terminal driver for the palette engine. Provides:
//! - `score`: score one text against one query
//! - `query`: mount a host description, apply a query, print the window
//! - `repl`: a line-driven palette session over stdin

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rz_command_core::config::CommandConfig;
use rz_command_core::render::MemorySurface;
use rz_command_core::search::{FilterPipeline, score};
use rz_command_core::{CommandEvent, CommandPalette, HostElement, Key};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

type Palette = CommandPalette<MemorySurface>;

/// rz-command palette engine CLI
#[derive(Parser)]
#[command(name = "rzc")]
#[command(about = "Drive the rz-command palette engine from a terminal")]
#[command(version)]
#[command(after_help = "\
Examples:
  rzc score \"apple pie\" pie         Print the score of one candidate text
  rzc query host.json --query open   Print the result window for a query
  rzc query host.json --markup       Dump the rendered rows
  rzc repl host.json                 Interactive session (:next, :enter, ...)
")]
struct Cli {
    /// JSON config file overriding the host attributes
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a candidate text against a query
    Score {
        /// Candidate search text
        text: String,
        /// Query
        query: String,
    },

    /// Mount a host description, apply a query and print the result window
    Query {
        /// Host description (JSON)
        host: PathBuf,

        /// Query to apply after mounting
        #[arg(short, long, default_value = "")]
        query: String,

        /// Also dump the rendered rows
        #[arg(long)]
        markup: bool,
    },

    /// Interactive session over stdin
    Repl {
        /// Host description (JSON)
        host: PathBuf,
    },
}

/// Install the tracing subscriber. Logs go to stderr unless `log_file` is
/// set; the returned guard must live until exit so file logs get flushed.
fn setup_logging(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_level = if verbose || cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("rz_command={default_level},rzc={default_level}"))
    });

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("Invalid log file path: {}", path.display()))?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(filter)
        .init();

    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Score { text, query } => {
            run_score(&text, &query);
            Ok(())
        }
        Commands::Query {
            host,
            query,
            markup,
        } => run_query(&host, cli.config.as_deref(), &query, markup).await,
        Commands::Repl { host } => run_repl(&host, cli.config.as_deref()).await,
    }
}

fn run_score(text: &str, query: &str) {
    let text = text.to_lowercase();
    let query = FilterPipeline::normalize(query);
    println!("{}", score(&text, &query));
}

/// Load the host, resolve config and mount a palette
fn mount(
    host_path: &Path,
    config_path: Option<&Path>,
) -> Result<(Palette, UnboundedReceiver<CommandEvent>)> {
    let host = HostElement::load(host_path)
        .with_context(|| format!("Failed to load host from {}", host_path.display()))?;

    let config = match config_path {
        Some(path) => CommandConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => host.config(),
    };
    debug!("Resolved config: {:?}", config);

    let (mut palette, events) = CommandPalette::new(config, MemorySurface::new())
        .context("Failed to create palette")?;
    palette.mount(host);
    info!(
        "Mounted {} with {} candidates",
        host_path.display(),
        palette.registry().len()
    );
    Ok((palette, events))
}

async fn run_query(
    host_path: &Path,
    config_path: Option<&Path>,
    query: &str,
    markup: bool,
) -> Result<()> {
    let (mut palette, mut events) = mount(host_path, config_path)?;
    palette.settle().await;

    if !query.is_empty() {
        palette.set_query(query);
        palette.settle().await;
    }

    output::print_window(&palette);
    if markup {
        println!();
        print!("{}", palette.surface().to_markup());
    }
    output::print_events(&mut events);
    Ok(())
}

/// One parsed REPL line
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Query(String),
    Key(Key),
    Open,
    Select(String),
    Quit,
    Unknown(String),
}

fn parse_line(line: &str) -> ReplCommand {
    let Some(command) = line.strip_prefix(':') else {
        return ReplCommand::Query(line.to_string());
    };

    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(n, a)| (n, a.trim()));

    match name {
        "next" | "n" => ReplCommand::Key(Key::ArrowDown),
        "prev" | "p" => ReplCommand::Key(Key::ArrowUp),
        "first" => ReplCommand::Key(Key::Home),
        "last" => ReplCommand::Key(Key::End),
        "enter" | "e" => ReplCommand::Key(Key::Enter),
        "open" => ReplCommand::Open,
        "select" if !arg.is_empty() => ReplCommand::Select(arg.to_string()),
        "quit" | "q" => ReplCommand::Quit,
        _ => ReplCommand::Unknown(command.to_string()),
    }
}

async fn run_repl(host_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let (mut palette, mut events) = mount(host_path, config_path)?;
    palette.settle().await;
    output::print_window(&palette);
    output::print_events(&mut events);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match parse_line(&line) {
            ReplCommand::Query(query) => palette.set_query(query),
            ReplCommand::Key(key) => {
                palette.handle_key(key);
            }
            ReplCommand::Open => {
                palette.open();
            }
            ReplCommand::Select(value) => palette.set_selected_value(Some(value)),
            ReplCommand::Quit => break,
            ReplCommand::Unknown(command) => {
                eprintln!(
                    "Unknown command: :{command} (try :next, :prev, :first, :last, :enter, :open, :select <value>, :quit)"
                );
                continue;
            }
        }

        palette.settle().await;
        output::print_window(&palette);
        output::print_events(&mut events);
    }

    Ok(())
}
