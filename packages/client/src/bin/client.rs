//! Headless CLI client for Chanoma video-call rooms.
//!
//! Joins a room over the signaling coordinator, shows presence and chat, and
//! sends chat messages from stdin. Runs without media capture, so it acts as
//! a view-only participant: roster and chat work, no media links are placed.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second
//! interval); the participant id is stable across reconnects, so the room
//! sees no phantom join/leave.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chanoma-client -- --room my-room
//! cargo run --bin chanoma-client -- --room my-room --display-name Alice
//! ```

use std::sync::Arc;

use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use uuid::Uuid;

use chanoma_client::{
    manager::ConnectionManager,
    media::NoCaptureSource,
    runner::run_client,
    session::{ClientRuntime, SessionConfig},
    transport::DisabledConnector,
    video::NullRenderer,
};
use chanoma_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "chanoma-client")]
#[command(about = "Headless chat/presence client for video-call rooms", long_about = None)]
struct Args {
    /// WebSocket URL of the signaling coordinator
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Room to join
    #[arg(short = 'r', long)]
    room: String,

    /// Participant id (defaults to a fresh UUID per run)
    #[arg(short = 'p', long)]
    participant_id: Option<String>,

    /// Display name shown to other participants
    #[arg(short = 'n', long)]
    display_name: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let participant_id = args
        .participant_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let config = SessionConfig {
        url: args.url,
        room_id: args.room,
        participant_id: participant_id.clone(),
        display_name: args.display_name,
    };

    // Headless wiring: no media capture, no peer transport, log-only renderer
    let (manager, link_events) =
        ConnectionManager::new(Arc::new(DisabledConnector), Arc::new(NullRenderer));

    // No transport means no inbound calls; the channel stays silent
    let (_incoming_tx, incoming_calls) = mpsc::unbounded_channel();

    // Create channel for rustyline input
    let (input_tx, chat_input) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let prompt_id = participant_id.clone();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", prompt_id);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    let mut runtime = ClientRuntime {
        manager,
        link_events,
        incoming_calls,
        chat_input,
        media_source: Arc::new(NoCaptureSource),
    };

    println!(
        "\nYou are '{}'. Type messages and press Enter to send. Press Ctrl+C to exit.\n",
        participant_id
    );

    // Run the client
    if let Err(e) = run_client(config, &mut runtime).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
