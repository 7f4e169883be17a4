use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use chefbot::app::App;
use chefbot::config::{Config, Overrides, Settings};
use chefbot::{handler, logging, tui, ui};
use chefbot::{BackendEndpoint, ChatWidget, HttpChatService, Message};

#[derive(Parser)]
#[command(name = "chefbot", version)]
#[command(about = "Terminal client for the Chefbot chat service")]
struct Cli {
    /// Base URL of the chat service (e.g. http://127.0.0.1:5000)
    #[arg(long, env = "CHEFBOT_BACKEND_URL", global = true)]
    backend_url: Option<String>,
    /// Host name to derive the backend URL from when no URL is configured
    #[arg(long, env = "CHEFBOT_HOST", global = true)]
    host: Option<String>,
    /// Request timeout in seconds
    #[arg(long, env = "CHEFBOT_TIMEOUT_SECS", global = true)]
    timeout_secs: Option<u64>,
    /// Log file for the interactive UI
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Send one message and print the conversation
    Ask {
        /// Your message
        message: String,
    },
    /// Show which backend URL would be used and why
    Endpoint,
    /// Save a backend URL to the config file
    SetBackend {
        /// Base URL of the chat service
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = Overrides {
        backend_url: cli.backend_url.clone(),
        host: cli.host.clone(),
        timeout_secs: cli.timeout_secs,
    };

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let log_file = cli.log_file.unwrap_or_else(logging::default_log_path);
            logging::init_file(&log_file)?;
            let settings = load_settings(&overrides)?;
            run_chat(settings).await?
        }
        Commands::Ask { message } => {
            logging::init_stderr()?;
            let settings = load_settings(&overrides)?;
            ask_once(settings, &message).await?
        }
        Commands::Endpoint => {
            let settings = load_settings(&overrides)?;
            println!("{}", settings.endpoint.url());
            println!("  chat URL: {}", settings.endpoint.chat_url());
            println!("  resolved from: {}", settings.endpoint.source());
        }
        Commands::SetBackend { url } => {
            let endpoint = BackendEndpoint::explicit(&url)?;
            let mut config = Config::load()?;
            config.backend_url = Some(endpoint.url().to_string());
            let path = config.save()?;
            println!("Saved backend URL {} to {}", endpoint.url(), path.display());
        }
    }

    Ok(())
}

fn load_settings(overrides: &Overrides) -> Result<Settings> {
    let config = Config::load()?;
    let settings = Settings::resolve(&config, overrides, |key| std::env::var(key).ok())
        .context("resolving backend endpoint")?;
    tracing::info!(
        url = settings.endpoint.url(),
        source = %settings.endpoint.source(),
        timeout_secs = settings.request_timeout.as_secs(),
        "backend endpoint resolved"
    );
    Ok(settings)
}

fn build_service(settings: &Settings) -> Result<HttpChatService> {
    HttpChatService::new(&settings.endpoint, settings.request_timeout)
        .context("building HTTP client")
}

async fn run_chat(settings: Settings) -> Result<()> {
    let service = build_service(&settings)?;
    let mut app = App::new(Arc::new(service), settings.endpoint);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(tui::TICK_RATE);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(
    terminal: &mut tui::Tui,
    app: &mut App,
    events: &mut tui::EventHandler,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event);
        app.poll_reply().await;
    }
    Ok(())
}

async fn ask_once(settings: Settings, message: &str) -> Result<()> {
    let service = build_service(&settings)?;
    let mut widget = ChatWidget::new();

    if !widget.submit(&service, message).await {
        bail!("nothing to send: the message is empty");
    }

    for msg in widget.messages() {
        print_message(msg);
    }
    Ok(())
}

fn print_message(msg: &Message) {
    println!("{}: {}", msg.role().label(), msg.text());
}
