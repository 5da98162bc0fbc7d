//! CLI for SocialHub
//!
//! Subcommands:
//! - `server`: run the WebSocket server
//! - `client`: connect as one user and print every frame received (smoke tests)
//! - `history` / `backlog`: print stored conversation or group pages as frames

use std::sync::Arc;

use clap::Parser;
use socialhub::config::{Settings, load_config};
use socialhub::hub::Hub;
use socialhub::persistence::{HistoryReader, SledStore};
use socialhub::transport::start_websocket_server;
use socialhub::utils::logging;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "socialhub")]
enum Command {
    /// Start the WebSocket server
    Server,
    /// Connect as a user, ask for the online list and print incoming frames
    Client {
        /// WebSocket endpoint of a running server
        #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
        url: String,
        /// Identity to connect as
        #[arg(long)]
        user_id: i64,
    },
    /// Print one page of the conversation between two users, newest first
    History {
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        peer_id: i64,
        #[arg(long, default_value_t = 0)]
        page: usize,
    },
    /// Print one page of a group's chat backlog, oldest first
    Backlog {
        #[arg(long)]
        group_id: i64,
        #[arg(long, default_value_t = 0)]
        page: usize,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cmd = Command::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            error!("Invalid configuration: {}", e);
            return;
        }
    };
    logging::init(&config.logging.level);

    let result = match cmd {
        Command::Server => run_server(config).await,
        Command::Client { url, user_id } => run_client(&url, user_id).await,
        Command::History {
            user_id,
            peer_id,
            page,
        } => print_history(&config, user_id, peer_id, page),
        Command::Backlog { group_id, page } => print_backlog(&config, group_id, page),
    };

    if let Err(e) = result {
        error!("{}", e);
    }
}

async fn run_server(config: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(SledStore::open(&config.storage.path)?);
    let (hub, handle) = Hub::new(store.clone(), &config.hub);
    tokio::spawn(hub.run());

    tokio::select! {
        result = start_websocket_server(handle, config) => {
            if let Err(e) = result {
                error!("WebSocket server failed: {}", e);
            } else {
                error!("WebSocket server exited unexpectedly.");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    store.flush()?;
    Ok(())
}

async fn run_client(url: &str, user_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    use futures_util::{SinkExt, StreamExt};
    use serde_json::json;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    let separator = if url.contains('?') { '&' } else { '?' };
    let (mut ws_stream, _response) =
        connect_async(format!("{url}{separator}user_id={user_id}")).await?;
    info!(user_id, "connected to {}", url);

    let query = json!({ "type": "get_online_users" });
    ws_stream.send(WsMessage::text(query.to_string())).await?;

    loop {
        tokio::select! {
            frame = ws_stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => println!("{text}"),
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            },
            _ = tokio::signal::ctrl_c() => {
                ws_stream.close(None).await?;
                break;
            }
        }
    }

    Ok(())
}

fn print_history(
    config: &Settings,
    user_id: i64,
    peer_id: i64,
    page: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(SledStore::open(&config.storage.path)?);
    let reader = HistoryReader::new(store, &config.storage);
    for frame in reader.conversation_page(user_id, peer_id, page)? {
        println!("{}", serde_json::to_string(&frame)?);
    }
    Ok(())
}

fn print_backlog(
    config: &Settings,
    group_id: i64,
    page: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(SledStore::open(&config.storage.path)?);
    let reader = HistoryReader::new(store, &config.storage);
    for frame in reader.group_backlog_page(group_id, page)? {
        println!("{}", serde_json::to_string(&frame)?);
    }
    Ok(())
}
