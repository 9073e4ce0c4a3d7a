mod console;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use ticket_chat::token::{PREVIEW_TOKEN_KEY, TokenStore};
use ticket_chat::{ChatConfig, ChatError, ChatStore, ChatSyncController, HttpChatStore, NewMessage, PollingCache, SenderBy, TicketId};

#[derive(Parser, Debug)]
#[command(name = "ticket-chat", about = "Customer-service ticket chat client")]
struct Cli {
    /// Backend origin; overrides `TICKET_CHAT_API_URL` from `.env`.
    #[arg(long, env = "TICKET_CHAT_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow a ticket interactively, polling every 5 seconds.
    Watch { ticket: String },
    /// Print a ticket's transcript once.
    Show { ticket: String },
    /// Send one agent reply.
    Send { ticket: String, text: String },
    /// Manage the preview-mode API token.
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand, Debug)]
enum TokenAction {
    Set { value: String },
    Show,
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "ticket-chat failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ChatError> {
    let mut config = ChatConfig::from_env()?;
    if let Some(url) = cli.api_url.as_deref() {
        config = config.with_api_url(url)?;
    }

    match cli.command {
        Command::Watch { ticket } => {
            let ticket = TicketId::new(ticket)?;
            let tokens = TokenStore::from_config(&config)?;
            if tokens.needs_preview_token(&config)? {
                tracing::warn!("preview mode without an API token; run `ticket-chat token set <value>`");
            }
            let store: Arc<dyn ChatStore> = Arc::new(HttpChatStore::new(&config)?);
            let cache = PollingCache::new(store);
            tracing::info!(%ticket, api_url = %config.api_url, "watching ticket");
            console::run(ChatSyncController::mount(&cache, ticket)).await
        }
        Command::Show { ticket } => {
            let ticket = TicketId::new(ticket)?;
            let snapshot = HttpChatStore::new(&config)?.fetch_snapshot(&ticket).await?;
            for message in &snapshot.messages {
                let who = if message.sender == SenderBy::Client { "client" } else { "agent" };
                println!("[{who} {}] {}", message.created_at, message.content);
            }
            if let Some(bundle) = snapshot.active_suggestion() {
                for suggest in bundle.options.iter().chain(&bundle.suggests) {
                    println!("  suggestion: {suggest}");
                }
            }
            Ok(())
        }
        Command::Send { ticket, text } => {
            let ticket = TicketId::new(ticket)?;
            if text.trim().is_empty() {
                return Err(ChatError::Config("message text must not be empty".into()));
            }
            HttpChatStore::new(&config)?
                .append_message(&ticket, &NewMessage::agent(text))
                .await?;
            println!("Message sent!");
            Ok(())
        }
        Command::Token { action } => {
            let tokens = TokenStore::from_config(&config)?;
            match action {
                TokenAction::Set { value } => {
                    tokens.save(PREVIEW_TOKEN_KEY, value.trim())?;
                    println!("token saved to {}", tokens.path().display());
                }
                TokenAction::Show => match tokens.load(PREVIEW_TOKEN_KEY)? {
                    Some(token) => println!("{token}"),
                    None => println!("no token saved"),
                },
                TokenAction::Clear => {
                    let removed = tokens.remove(PREVIEW_TOKEN_KEY)?;
                    println!("{}", if removed { "token cleared" } else { "no token saved" });
                }
            }
            Ok(())
        }
    }
}
