mod schedule;
mod state;
mod theme;
mod ui;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use guardian_client::ApiClient;
use ratatui::{backend::CrosstermBackend, Terminal};
use state::{App, Command, ConsoleEvent};
use std::{io, time::Duration};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const DRIVER_TICK_MS: u64 = 250;
const EVENT_QUEUE_CAPACITY: usize = 64;

#[derive(Parser)]
#[command(name = "guardian")]
#[command(about = "Operator console for the guardian scan pipeline", long_about = None)]
struct Cli {
    /// API origin, e.g. http://127.0.0.1:8000 (overrides GUARDIAN_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a new scan run
    Scan {
        #[arg(long)]
        repo_url: String,
        /// Link posted back to the commit status, if any
        #[arg(long)]
        target_url: Option<String>,
        /// Token for cloning private repos and posting statuses
        #[arg(long)]
        github_token: Option<String>,
    },
    /// Inspect or change server settings
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    List,
    Set {
        key: String,
        value: String,
        #[arg(long)]
        secret: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.command.is_some());

    let client = match &cli.api_url {
        Some(url) => ApiClient::new(url.clone()),
        None => ApiClient::from_env(),
    }
    .context("failed to build API client")?;

    match cli.command {
        Some(Commands::Scan {
            repo_url,
            target_url,
            github_token,
        }) => {
            let accepted = client
                .start_scan(&repo_url, target_url.as_deref(), github_token.as_deref())
                .await
                .context("scan submission failed")?;
            println!("scan #{} accepted ({})", accepted.scan_id, accepted.status);
        }
        Some(Commands::Config { action }) => match action {
            ConfigCommands::List => {
                let entries = client.get_config().await.context("config fetch failed")?;
                for entry in entries {
                    println!("{} = {}", entry.key, display_value(&entry));
                }
            }
            ConfigCommands::Set { key, value, secret } => {
                client
                    .set_config(&key, &value, secret)
                    .await
                    .context("config update failed")?;
                println!("{key} updated");
            }
        },
        None => run_console(client).await?,
    }

    Ok(())
}

/// Secrets never echo back in cleartext, not even right after setting them.
fn display_value(entry: &guardian_core::ConfigEntry) -> &str {
    if entry.is_secret {
        "********"
    } else {
        entry.value.as_str()
    }
}

/// The TUI owns the terminal, so default to a sunk subscriber there;
/// one-shot subcommands log to stdout like any CLI.
fn init_logging(stdout_mode: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_enabled = stdout_mode
        || matches!(
            std::env::var("GUARDIAN_LOG_STDOUT").ok().as_deref(),
            Some("1") | Some("true") | Some("TRUE") | Some("yes")
        );
    if stdout_enabled {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    }
}

async fn run_console(client: ApiClient) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, client).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    client: ApiClient,
) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let mut app = App::new(Utc::now());
    let mut input = EventStream::new();
    let mut driver = tokio::time::interval(Duration::from_millis(DRIVER_TICK_MS));

    loop {
        for command in app.take_commands() {
            spawn_fetch(client.clone(), command, event_tx.clone());
        }

        terminal.draw(|frame| ui::render(frame, &app))?;

        tokio::select! {
            _ = driver.tick() => {
                app.tick(Utc::now());
            }
            Some(event) = event_rx.recv() => {
                app.apply_event(event);
            }
            maybe_event = input.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                            app.handle_key(key);
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(err.into()),
                    None => break,
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Fetches are fire-and-forget: the result comes back as a message and the
/// store decides whether it is still relevant.
fn spawn_fetch(client: ApiClient, command: Command, tx: mpsc::Sender<ConsoleEvent>) {
    tokio::spawn(async move {
        let event = match command {
            Command::FetchJobs { seq, silent } => ConsoleEvent::Jobs {
                seq,
                silent,
                result: client
                    .list_scans()
                    .await
                    .map_err(|error| error.to_string()),
            },
            Command::FetchLogs {
                job_id,
                seq,
                initial,
            } => ConsoleEvent::Logs {
                job_id,
                seq,
                initial,
                result: client
                    .scan_logs(job_id)
                    .await
                    .map_err(|error| error.to_string()),
            },
            Command::FetchReport { job_id } => ConsoleEvent::Report {
                job_id,
                result: client
                    .scan_report(job_id)
                    .await
                    .map_err(|error| error.to_string()),
            },
            Command::Cancel { job_id } => ConsoleEvent::CancelDone {
                job_id,
                result: client
                    .cancel_scan(job_id)
                    .await
                    .map_err(|error| error.to_string()),
            },
        };
        let _ = tx.send(event).await;
    });
}
