//! Signaling coordinator server for browser video-call rooms.
//!
//! Relays presence and chat events per room over WebSocket and hands out the
//! peer media-transport coordinates to room pages.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chanoma-server
//! cargo run --bin chanoma-server -- --host 0.0.0.0 --port 3000 --peer-port 3001
//! ```

use std::sync::Arc;

use chanoma_server::{
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryRoomDirectory,
    },
    ui::{PeerConfig, Server},
    usecase::{
        GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase, LeaveRoomUseCase,
        PostMessageUseCase,
    },
};
use chanoma_shared::logger::setup_logger;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chanoma-server")]
#[command(about = "Room presence and chat coordinator for video-call rooms", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Host of the peer media-transport server handed to room pages
    #[arg(long, default_value = "/")]
    peer_host: String,

    /// Port of the peer media-transport server handed to room pages
    #[arg(long, default_value = "3001")]
    peer_port: u16,

    /// Whether room pages should reach the peer media-transport over TLS
    #[arg(long, default_value_t = false)]
    peer_secure: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Directory
    // 2. MessagePusher
    // 3. UseCases
    // 4. Server

    // 1. Create the Room Directory (in-memory, rooms are created lazily)
    let directory = Arc::new(InMemoryRoomDirectory::new());

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 3. Create UseCases
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(
        directory.clone(),
        message_pusher.clone(),
    ));
    let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(
        directory.clone(),
        message_pusher.clone(),
    ));
    let post_message_usecase = Arc::new(PostMessageUseCase::new(
        directory.clone(),
        message_pusher.clone(),
    ));
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(directory.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(directory.clone()));

    // 4. Create and run the server
    let server = Server::new(
        join_room_usecase,
        leave_room_usecase,
        post_message_usecase,
        get_rooms_usecase,
        get_room_detail_usecase,
        PeerConfig {
            host: args.peer_host,
            port: args.peer_port,
            secure: args.peer_secure,
        },
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
