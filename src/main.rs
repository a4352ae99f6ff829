use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::{poll, read, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tplace::api::{format_api_error, ApiClient};
use tplace::app::App;
use tplace::config::Config;
use tplace::mutation::BulkDeletePolicy;
use tplace::resource::{fetch_collection, get_resource};
use tplace::ui::splash::{render as render_splash, SplashState};
use tplace::{event, ui};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Terminal UI for JSONPlaceholder-style REST APIs
#[derive(Parser, Debug)]
#[command(name = "tplace", version, about, long_about = None)]
struct Args {
    /// API root (defaults to the public JSONPlaceholder)
    #[arg(short, long)]
    base_url: Option<String>,

    /// View to open first (posts, albums, todos)
    #[arg(short, long)]
    view: Option<String>,

    /// Rows per page
    #[arg(short = 's', long)]
    page_size: Option<usize>,

    /// How bulk delete handles partial failure
    #[arg(long, value_enum)]
    bulk_delete: Option<BulkDeletePolicy>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    /// Run in read-only mode (block all write operations)
    #[arg(long)]
    readonly: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("tplace started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("tplace").join("tplace.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".tplace").join("tplace.log");
    }
    PathBuf::from("tplace.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = initialize_with_splash(&mut terminal, &args).await;

    match result {
        Ok(Some(mut app)) => {
            let run_result = run_app(&mut terminal, &mut app).await;
            cleanup_terminal(&mut terminal)?;

            if let Err(err) = run_result {
                eprintln!("Error: {err:?}");
            }
        }
        Ok(None) => {
            cleanup_terminal(&mut terminal)?;
        }
        Err(err) => {
            cleanup_terminal(&mut terminal)?;
            eprintln!("Initialization error: {err:?}");
        }
    }

    Ok(())
}

fn cleanup_terminal<B: Backend + std::io::Write>(terminal: &mut Terminal<B>) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn initialize_with_splash<B: Backend>(
    terminal: &mut Terminal<B>,
    args: &Args,
) -> Result<Option<App>>
where
    B::Error: Send + Sync + 'static,
{
    let mut splash = SplashState::new();
    terminal.draw(|f| render_splash(f, &splash))?;

    if check_abort()? {
        return Ok(None);
    }

    // Step 1: configuration
    let config = Config::load();
    let base_url = config.effective_base_url(args.base_url.as_deref());
    let view_key = config.effective_view(args.view.as_deref());
    let page_size = config.effective_page_size(args.page_size);
    let bulk_policy = config.effective_bulk_delete(args.bulk_delete);

    if let Some(requested) = args.view.as_deref().filter(|v| *v != view_key) {
        tracing::warn!("Unknown view {:?}, opening {} instead", requested, view_key);
    }
    tracing::info!(
        "Using {} (view: {}, page size: {}, bulk delete: {})",
        base_url,
        view_key,
        page_size,
        bulk_policy.as_str()
    );

    splash.set_message("Loading config");
    terminal.draw(|f| render_splash(f, &splash))?;
    splash.complete_step();

    if check_abort()? {
        return Ok(None);
    }

    // Step 2: HTTP client
    splash.set_message(&format!("Connecting to {}", base_url));
    terminal.draw(|f| render_splash(f, &splash))?;

    let client = ApiClient::new(&base_url, config.request_timeout())
        .with_context(|| format!("Invalid API root: {}", base_url))?;
    splash.complete_step();

    if check_abort()? {
        return Ok(None);
    }

    // Step 3: initial collection
    let resource = get_resource(&view_key)
        .with_context(|| format!("No resource definition for {}", view_key))?;
    splash.set_message(&format!("Fetching {}", resource.display_name.to_lowercase()));
    terminal.draw(|f| render_splash(f, &splash))?;

    let initial = fetch_collection(&client, resource).await;
    if let Err(e) = &initial {
        tracing::error!("Initial fetch failed: {}", format_api_error(e));
    }

    splash.complete_step();
    splash.set_message("Ready!");
    terminal.draw(|f| render_splash(f, &splash))?;

    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut app = App::from_initialized(
        client,
        config,
        view_key,
        page_size,
        bulk_policy,
        args.readonly,
    );
    app.load_collection_result(initial);

    Ok(Some(app))
}

fn check_abort() -> Result<bool> {
    if poll(Duration::from_millis(50))? {
        if let Event::Key(key) = read()? {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        app.process_events();
        app.load_visible_extras();

        terminal.draw(|f| ui::render(f, app))?;

        // Key polling blocks this thread; spawned requests run on the
        // runtime's worker threads meanwhile.
        if tokio::task::block_in_place(|| event::handle_events(app))? {
            return Ok(());
        }
    }
}
