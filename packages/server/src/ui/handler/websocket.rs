//! WebSocket connection handlers.
//!
//! The join flow sends `room-users` and `chat-history` directly on the
//! socket sink before the pusher loop starts draining queued fan-out, so the
//! joiner always receives its snapshot before any live broadcast that was
//! sent after the join.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, ConnectionRecord, DisplayName, MessageText, ParticipantId, RoomId},
    infrastructure::dto::websocket::{
        ChatBroadcastMessage, ChatHistoryMessage, ChatMessageDto, ChatSendMessage,
        JoinRoomMessage, MessageType, RoomUserDto, RoomUsersMessage, UserConnectedMessage,
        UserDisconnectedMessage,
    },
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Read frames until the client's join-room event arrives.
///
/// The wire protocol requires join-room as the first text frame; anything
/// else closes the connection.
async fn read_join_request(receiver: &mut SplitStream<WebSocket>) -> Option<JoinRoomMessage> {
    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                return match serde_json::from_str::<JoinRoomMessage>(&text) {
                    Ok(join) if join.r#type == MessageType::JoinRoom => Some(join),
                    Ok(_) | Err(_) => {
                        tracing::warn!("Expected join-room as first event, got: {}", text);
                        None
                    }
                };
            }
            Ok(Message::Close(_)) => return None,
            Ok(_) => {
                // Ping/pong and binary frames before join are ignored
            }
            Err(e) => {
                tracing::error!("WebSocket error before join: {}", e);
                return None;
            }
        }
    }
    None
}

/// Spawns a task that receives messages from the rx channel and pushes them
/// to the WebSocket sender.
///
/// This function handles the outbound message flow: messages from other
/// connections (via rx channel) are sent to this client's WebSocket.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            // Send the message to this client
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let Some(join) = read_join_request(&mut receiver).await else {
        tracing::warn!("Connection closed before a valid join-room event");
        return;
    };

    // Convert wire values -> Domain Models
    let room_id = match RoomId::try_from(join.room_id.clone()) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Invalid room_id '{}': {}", join.room_id, e);
            return;
        }
    };
    let participant_id = match ParticipantId::try_from(join.participant_id.clone()) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Invalid participant_id '{}': {}", join.participant_id, e);
            return;
        }
    };
    let display_name = DisplayName::resolve(join.display_name.clone(), &participant_id);

    // The connection handle is owned by this transport layer: created on
    // join, destroyed on disconnect.
    let connection_id = ConnectionId::generate();
    let record = ConnectionRecord::new(
        connection_id,
        participant_id.clone(),
        display_name,
        room_id.clone(),
    );

    // Create a channel for this connection to receive messages
    let (tx, rx) = mpsc::unbounded_channel();

    // Use JoinRoomUseCase to handle the join (channel registration and the
    // atomic directory join happen inside the UseCase)
    let joined = match state.join_room_usecase.execute(record, tx).await {
        Ok(joined) => joined,
        Err(e) => {
            // DuplicateRegistration is fatal to this connection only
            tracing::error!("Failed to join room '{}': {}", room_id, e);
            return;
        }
    };
    tracing::info!(
        "Connection '{}' joined room '{}' as participant '{}'",
        connection_id,
        joined.room_id,
        joined.participant_id
    );

    // Broadcast user-connected to the other connections, unless another
    // connection already carried this participant (duplicate tab/reconnect).
    // This happens before the snapshot sends so that a failing socket never
    // produces a user-disconnected without its matching user-connected.
    if joined.announce {
        let connected_msg = UserConnectedMessage {
            r#type: MessageType::UserConnected,
            participant_id: joined.participant_id.as_str().to_string(),
            display_name: joined.resolved_name.as_str().to_string(),
        };

        let connected_json = serde_json::to_string(&connected_msg).unwrap();
        if let Err(e) = state
            .join_room_usecase
            .broadcast_user_connected(&joined, &connected_json)
            .await
        {
            tracing::warn!("Failed to broadcast user-connected: {}", e);
        } else {
            tracing::info!(
                "Broadcasted user-connected for '{}'",
                joined.participant_id
            );
        }
    } else {
        tracing::info!(
            "Participant '{}' already present in room '{}', suppressing user-connected",
            joined.participant_id,
            joined.room_id
        );
    }

    // Send the deduplicated participant view to the newly joined connection
    {
        let users: Vec<RoomUserDto> = joined.others.iter().cloned().map(Into::into).collect();
        let room_users = RoomUsersMessage {
            r#type: MessageType::RoomUsers,
            users,
            own_name: joined.resolved_name.as_str().to_string(),
        };

        let room_users_json = serde_json::to_string(&room_users).unwrap();
        if let Err(e) = sender.send(Message::Text(room_users_json.into())).await {
            tracing::error!("Failed to send room-users to '{}': {}", connection_id, e);
            finalize_disconnect(&state, connection_id).await;
            return;
        }
        tracing::info!("Sent room-users to '{}'", connection_id);
    }

    // Send the chat history snapshot, exactly once per join
    {
        let messages: Vec<ChatMessageDto> =
            joined.history.iter().cloned().map(Into::into).collect();
        let history = ChatHistoryMessage {
            r#type: MessageType::ChatHistory,
            messages,
        };

        let history_json = serde_json::to_string(&history).unwrap();
        if let Err(e) = sender.send(Message::Text(history_json.into())).await {
            tracing::error!("Failed to send chat-history to '{}': {}", connection_id, e);
            finalize_disconnect(&state, connection_id).await;
            return;
        }
        tracing::info!("Sent chat-history to '{}'", connection_id);
    }

    let state_clone = state.clone();

    // Spawn a task to receive messages from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match message {
                Message::Text(text) => {
                    let chat = match serde_json::from_str::<ChatSendMessage>(&text) {
                        Ok(chat) => chat,
                        Err(e) => {
                            tracing::warn!("Failed to parse chat-message frame: {}", e);
                            continue;
                        }
                    };

                    let text_vo = match MessageText::try_from(chat.text) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!("Invalid chat message from '{}': {}", connection_id, e);
                            continue;
                        }
                    };

                    // Use PostMessageUseCase to resolve the sender, append to
                    // history and pick the fan-out targets
                    match state_clone
                        .post_message_usecase
                        .execute(connection_id, text_vo)
                        .await
                    {
                        Ok(relayed) => {
                            let broadcast = ChatBroadcastMessage {
                                r#type: MessageType::ChatMessage,
                                sender: relayed.message.sender.as_str().to_string(),
                                sender_name: relayed.message.sender_name.as_str().to_string(),
                                text: relayed.message.text.as_str().to_string(),
                                timestamp: relayed.message.timestamp.value(),
                            };
                            let broadcast_json = serde_json::to_string(&broadcast).unwrap();
                            if let Err(e) = state_clone
                                .post_message_usecase
                                .broadcast_message(relayed.targets, &broadcast_json)
                                .await
                            {
                                tracing::warn!("Failed to broadcast chat-message: {}", e);
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Failed to relay chat-message: {}", e);
                        }
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to receive messages from other connections and send to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    finalize_disconnect(&state, connection_id).await;
}

/// Run the leave flow for a disconnected connection.
///
/// The leave notification is suppressed while another connection still
/// carries the same participant id.
async fn finalize_disconnect(state: &Arc<AppState>, connection_id: ConnectionId) {
    match state.leave_room_usecase.execute(connection_id).await {
        Some(departed) if departed.departed => {
            tracing::info!(
                "Connection '{}' disconnected, participant '{}' left room '{}'",
                connection_id,
                departed.participant_id,
                departed.room_id
            );

            let left_msg = UserDisconnectedMessage {
                r#type: MessageType::UserDisconnected,
                participant_id: departed.participant_id.as_str().to_string(),
            };

            let left_json = serde_json::to_string(&left_msg).unwrap();
            if let Err(e) = state
                .leave_room_usecase
                .broadcast_user_disconnected(departed.notify_targets.clone(), &left_json)
                .await
            {
                tracing::warn!("Failed to broadcast user-disconnected: {}", e);
            } else {
                tracing::info!(
                    "Broadcasted user-disconnected for '{}'",
                    departed.participant_id
                );
            }
        }
        Some(departed) => {
            tracing::info!(
                "Connection '{}' disconnected, suppressing user-disconnected: another connection for '{}' is still active",
                connection_id,
                departed.participant_id
            );
        }
        None => {
            tracing::warn!(
                "Connection '{}' was not registered at disconnect",
                connection_id
            );
        }
    }
}
