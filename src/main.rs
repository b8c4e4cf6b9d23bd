//! Terminal front end.
//!
//! A thin shim around the library: it builds the [`Config`], opens the
//! WebSocket, and runs one `select!` loop that hands every input to the
//! session in turn:
//!
//! ```text
//! stdin lines ──────┐
//! transport events ─┼──▶ QuerySession ──▶ ViewStore ──▶ redraw
//! timer generations ┤
//! refresh ticks ────┘
//! ```
//!
//! The socket task and timer sleeps only post into channels; nothing but this
//! loop touches the session. A dropped connection is re-opened after a short
//! delay, and the session restarts pagination once it is back.

#![allow(clippy::multiple_crate_versions)]

use clap::Parser;
use flightdeck::channel::{Transport, TransportEvent, WebSocketTransport};
use flightdeck::domain::fields::FLIGHT_FIELDS;
use flightdeck::observability::init_tracing;
use flightdeck::runtime::TokioTimers;
use flightdeck::storage::{JsonPreferences, MemoryPreferences, Preferences};
use flightdeck::ui::{helpers::CLEAR_SCREEN, parse_command, render, Command, Theme, HELP_TEXT};
use flightdeck::{Config, FlightdeckError, QuerySession, Result, TimerScheduler};
use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval};
use tracing::Instrument;

const RECONNECT_DELAY: Duration = Duration::from_secs(3);
const DEFAULT_COLUMNS: usize = 100;

#[derive(Debug, Parser)]
#[command(name = "flightdeck", version, about = "Live, paginated aircraft table over a WebSocket query service")]
struct Cli {
    /// Query service address.
    #[arg(long, env = "FLIGHTDECK_ADDRESS")]
    address: Option<String>,

    /// TOML configuration file.
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[arg(long)]
    page_size: Option<usize>,

    /// Quiet interval before edited filters are queried.
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Re-query the current page every N seconds (0 disables).
    #[arg(long)]
    refresh_secs: Option<u64>,

    /// Preferences file.
    #[arg(long)]
    prefs: Option<PathBuf>,

    #[arg(long, env = "FLIGHTDECK_TRACE")]
    trace_level: Option<String>,

    /// Built-in theme (`default`, `mono`) or a TOML theme file.
    #[arg(long)]
    theme: Option<String>,

    /// Correlate replies that carry no request id by their echoed page size.
    #[arg(long)]
    legacy_correlation: bool,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(address) = self.address {
            config.address = address;
        }
        if let Some(size) = self.page_size {
            if size == 0 {
                return Err(FlightdeckError::Config("--page-size must be positive".into()));
            }
            config.page_size = size;
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = ms;
        }
        if let Some(secs) = self.refresh_secs {
            config.refresh_secs = (secs > 0).then_some(secs);
        }
        if self.prefs.is_some() {
            config.preferences_path = self.prefs;
        }
        if let Some(level) = self.trace_level {
            config.trace_level = level;
        }
        if self.theme.is_some() {
            config.theme = self.theme;
        }
        config.legacy_correlation |= self.legacy_correlation;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("flightdeck: {e}");
            return ExitCode::from(2);
        }
    };
    init_tracing(&config);

    let span = tracing::info_span!("flightdeck", address = %config.address);
    match run(&config).instrument(span).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "flightdeck exited with an error");
            eprintln!("flightdeck: {e}");
            ExitCode::FAILURE
        }
    }
}

fn open_preferences(config: &Config) -> Box<dyn Preferences> {
    let path = config.preferences_file();
    match JsonPreferences::open(path.clone()) {
        Ok(prefs) => Box::new(prefs),
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "preferences unavailable, not persisting");
            eprintln!("flightdeck: preferences at {} unusable ({e}); changes will not be saved", path.display());
            Box::new(MemoryPreferences::new())
        }
    }
}

fn terminal_columns() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.parse().ok())
        .filter(|c| *c > 0)
        .unwrap_or(DEFAULT_COLUMNS)
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn run(config: &Config) -> Result<()> {
    tracing::info!(page_size = config.page_size, debounce_ms = config.debounce_ms, "starting");

    let theme = Theme::resolve(config.theme.as_deref());
    let (timers, mut fired) = TokioTimers::new();
    let mut session = QuerySession::new(config.session_options(), timers, open_preferences(config))?;

    let (events_tx, mut events) = mpsc::unbounded_channel();
    session.connect(&config.address, WebSocketTransport::open(&config.address, events_tx.clone()))?;
    let mut reconnect_at: Option<Instant> = None;

    let mut refresh = config
        .refresh_interval()
        .map(|period| tokio::time::interval_at(Instant::now() + period, period));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut view = session.view().subscribe();
    draw(&view.borrow_and_update(), &theme);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line).and_then(|command| execute(&mut session, command)) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(FlightdeckError::InvalidInput(message)) => {
                        println!("{message}");
                        prompt();
                    }
                    Err(e) => return Err(e),
                }
            }
            Some(event) = events.recv() => {
                let lost = matches!(event, TransportEvent::Closed { .. } | TransportEvent::Failed(_));
                session.handle_transport_event(event)?;
                if lost && reconnect_at.is_none() {
                    reconnect_at = Some(Instant::now() + RECONNECT_DELAY);
                }
            }
            Some(generation) = fired.recv() => session.handle_timer(generation)?,
            () = tick(&mut refresh) => session.on_refresh_tick()?,
            () = tokio::time::sleep_until(reconnect_at.unwrap_or_else(Instant::now)), if reconnect_at.is_some() => {
                reconnect_at = None;
                tracing::info!("reconnecting");
                session.connect(&config.address, WebSocketTransport::open(&config.address, events_tx.clone()))?;
            }
        }

        if view.has_changed().unwrap_or(false) {
            draw(&view.borrow_and_update(), &theme);
        }
    }

    session.teardown()?;
    tracing::info!("stopped");
    Ok(())
}

/// Runs one command; `Ok(false)` means quit.
fn execute<T: Transport, S: TimerScheduler>(
    session: &mut QuerySession<T, S, Box<dyn Preferences>>,
    command: Command,
) -> Result<bool> {
    let (page_index, has_more) = (session.state().page_index, session.state().has_more);
    match command {
        Command::NextPage if has_more => session.on_page_changed(page_index + 1)?,
        Command::NextPage => println!("already on the last page"),
        Command::PreviousPage if page_index > 0 => session.on_page_changed(page_index - 1)?,
        Command::PreviousPage => println!("already on the first page"),
        Command::Page(page) => session.on_page_changed(page)?,
        Command::PageSize(size) => session.on_page_size_changed(size)?,
        Command::Sort { field, order } => session.on_sort_changed(field, order)?,
        Command::Unsort => session.on_sort_cleared()?,
        Command::Filter(patch) => session.on_filter_changed(patch)?,
        Command::ClearFilters => {
            let patch = session
                .state()
                .effective_filters()
                .iter()
                .map(|(key, _)| (key.clone(), None))
                .collect();
            session.on_filter_changed(patch)?;
        }
        Command::Units(units) => session.on_unit_system_changed(units)?,
        Command::Fields => {
            for field in FLIGHT_FIELDS {
                println!("{:<16} {}", field.name, field.description);
            }
        }
        Command::Help => println!("{HELP_TEXT}"),
        Command::Quit => return Ok(false),
        Command::Nothing => {}
    }
    prompt();
    Ok(true)
}

fn draw(view: &flightdeck::ViewState, theme: &Theme) {
    print!("{CLEAR_SCREEN}{}", render(view, theme, terminal_columns()));
    prompt();
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}
