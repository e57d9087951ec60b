use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use davinci_core::{
    spawn_exchange, AskBackend, AskClient, ChatEventKind, ChatSession, Config,
};
use tokio::sync::mpsc;

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "davinci", version)]
#[command(about = "Chat with your notes through a Davinci ask endpoint")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Ask endpoint URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Pause before each revealed word, in milliseconds
    #[arg(long, global = true)]
    delay_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Precedence: flags, then environment, then config file
    let mut config = Config::load()?.with_env()?;
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.reveal_delay_ms = delay_ms;
    }

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(config).await,
        Commands::Ask { question } => run_ask(config, &question).await,
    }
}

fn build_backend(config: &Config) -> Result<Arc<dyn AskBackend>> {
    let client = match config.request_timeout() {
        Some(timeout) => AskClient::with_timeout(&config.endpoint, timeout)?,
        None => AskClient::new(&config.endpoint),
    };
    Ok(Arc::new(client))
}

async fn run_chat(config: Config) -> Result<()> {
    let _log_guard = logging::init_file(&config.log_level)?;
    tracing::info!(endpoint = %config.endpoint, "starting chat");

    let backend = build_backend(&config)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(&config, backend, events.chat_sender());

    let result = run_loop(&mut terminal, &mut events, &mut app).await;

    // Restore the terminal even if the loop failed
    app.quit();
    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut tui::Tui, events: &mut EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}

async fn run_ask(config: Config, question: &str) -> Result<()> {
    logging::init_stderr(&config.log_level)?;

    let mut session = ChatSession::new(config.greeting.clone());
    let Some(submission) = session.submit(question) else {
        eprintln!("Nothing to ask: the question is blank.");
        return Ok(());
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let exchange = spawn_exchange(build_backend(&config)?, submission, config.reveal_delay(), tx);
    let mut stdout = std::io::stdout();

    loop {
        let event = tokio::select! {
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                exchange.cancel();
                break;
            }
        };

        let chunk = match &event.kind {
            ChatEventKind::Chunk { text } => Some(text.clone()),
            _ => None,
        };
        let failed = matches!(event.kind, ChatEventKind::Failed { .. });

        if !session.apply(event) {
            continue;
        }
        if let Some(text) = chunk {
            write!(stdout, "{}", text)?;
            stdout.flush()?;
        }
        if failed {
            if let Some(msg) = session.messages().last() {
                write!(stdout, "{}", msg.content)?;
            }
        }
    }

    exchange.join().await;
    writeln!(stdout)?;
    Ok(())
}
