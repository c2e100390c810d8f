use anyhow::Result;
use clap::Parser;

mod app;
mod backend;
mod config;
mod conversation;
mod handler;
mod history;
mod tui;
mod ui;

use app::App;
use backend::BackendClient;
use config::Config;
use history::HistoryStore;
use tui::{AppEvent, EventHandler, Tui};

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(about = "Terminal chat client for a RAG question-answering service")]
struct Cli {
    /// Base URL of the answering backend
    #[arg(long)]
    base_url: Option<String>,

    /// Replay the previously saved conversation on startup
    #[arg(long)]
    restore: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing()?;

    let config = Config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "could not load config, using defaults");
        Config::default()
    });
    let base_url = config::resolve_base_url(
        cli.base_url,
        std::env::var("RAGCHAT_BASE_URL").ok(),
        &config,
    );

    let store = HistoryStore::open()?;
    let mut app = App::new(BackendClient::new(&base_url));

    if cli.restore {
        match store.load() {
            Ok(turns) => app.restore(turns),
            Err(err) => tracing::warn!(error = %err, "could not load saved history"),
        }
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events, &store).await;

    tui::restore()?;

    // Best-effort save on session end
    save_history(&app, &store);

    result
}

async fn run(
    terminal: &mut Tui,
    app: &mut App,
    events: &mut EventHandler,
    store: &HistoryStore,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(AppEvent::Key(key)) => handler::handle_key(app, key),
            Some(AppEvent::Tick) => app.tick_animation(),
            Some(AppEvent::Autosave) => save_history(app, store),
            Some(AppEvent::Resize(_, _)) => {}
            None => break,
        }

        app.poll_pending().await;
    }

    Ok(())
}

fn save_history(app: &App, store: &HistoryStore) {
    if app.conversation.is_empty() {
        return;
    }
    if let Err(err) = store.save(&app.conversation) {
        tracing::warn!(error = %err, "could not save history");
    }
}

/// Log to a file; the terminal belongs to the TUI.
fn init_tracing() -> Result<()> {
    let dir = config::app_dir()?;
    std::fs::create_dir_all(&dir)?;
    let log_file = std::fs::File::create(dir.join("ragchat.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ragchat=info".into()),
        )
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .init();

    Ok(())
}
