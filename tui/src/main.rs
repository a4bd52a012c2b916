mod app;
mod commands;
mod history;
mod ui;

use anyhow::Result;
use app::App;
use clap::Parser;
use config::{PathManager, Settings, api_key_from_env, load_env_file};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, MouseEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use docchat_core::{ChatEngine, SessionController};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::path::PathBuf;

#[cfg(not(debug_assertions))]
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "docchat", about = "Chat with Gemini about a PDF")]
struct Args {
    /// PDF to upload at start-up
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Gemini model to chat with (overrides settings.toml and DOCCHAT_MODEL)
    #[arg(short, long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    PathManager::ensure_dirs_exist()?;

    // Setup file-based logging
    // In dev mode, use local ./docchat.log that gets recreated on each run
    // In release mode, use the platform log directory with daily rotation
    #[cfg(debug_assertions)]
    let log_file = {
        let path = PathBuf::from("./docchat.log");
        let _ = std::fs::remove_file(&path);
        std::fs::File::create(&path)?
    };
    #[cfg(debug_assertions)]
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    #[cfg(not(debug_assertions))]
    let (non_blocking, _guard) = {
        let log_dir = PathManager::logs_dir().unwrap_or_else(|| PathBuf::from("."));
        let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "docchat.log");
        tracing_appender::non_blocking(file_appender)
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    tracing::info!("Starting docchat TUI");

    load_env_file();
    let mut settings = Settings::load().with_env_overrides();
    if let Some(model) = args.model {
        settings.model = model;
    }
    tracing::info!(model = %settings.model, base_url = %settings.base_url, "Settings loaded");

    let engine = ChatEngine::new(SessionController::gemini(&settings));
    let mut app = App::new(engine, settings.model.clone());
    if let Some(key) = api_key_from_env() {
        app.configured = true;
        app.engine.configure(key);
    }
    if let Some(path) = &args.file {
        app.open(path).await;
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "TUI exited with error");
    }
    result
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|f| ui::draw(f, app))?;

        app.check_engine_events();
        if app.busy.is_some() {
            app.advance_spinner();
        }

        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => app.handle_key_event(key).await,
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => app.scroll_up(3),
                    MouseEventKind::ScrollDown => app.scroll_down(3),
                    _ => {}
                },
                _ => {}
            }
        }
    }
    Ok(())
}
