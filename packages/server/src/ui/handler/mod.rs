//! HTTP / WebSocket handlers.

mod http;
mod websocket;

pub use http::{get_room_detail, get_rooms, health_check, room_entry, room_page};
pub use websocket::websocket_handler;
