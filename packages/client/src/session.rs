//! シグナリングセッション
//!
//! コーディネータと WebSocket で接続し、join-room を送ってから
//! 単一のイベントループでローカル状態を駆動します。中断点は
//! シグナリング・メディア・トランスポートのイベントだけで、
//! どの操作もループをブロックしません。

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use chanoma_server::infrastructure::dto::websocket::{
    ChatBroadcastMessage, ChatHistoryMessage, ChatSendMessage, JoinRoomMessage, MessageType,
    RoomUsersMessage, UserConnectedMessage, UserDisconnectedMessage,
};

use crate::{
    error::ClientError,
    formatter::MessageFormatter,
    manager::{ConnectionManager, LinkEvent},
    media::MediaSource,
    transport::IncomingCall,
};

/// セッションの接続パラメータ
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// シグナリングサーバーの WebSocket URL
    pub url: String,
    /// 参加するルーム ID
    pub room_id: String,
    /// 参加者 ID（タブセッションの寿命で安定）
    pub participant_id: String,
    /// 表示名（省略時はサーバーがフォールバックを導出する）
    pub display_name: Option<String>,
}

/// セッションをまたいで生き続けるクライアント側の実行状態
///
/// 再接続してもピアリンクとロスターは維持され、join 後の room-users
/// スナップショットが冪等に上書きする。
pub struct ClientRuntime {
    pub manager: ConnectionManager,
    pub link_events: mpsc::UnboundedReceiver<LinkEvent>,
    pub incoming_calls: mpsc::UnboundedReceiver<IncomingCall>,
    pub chat_input: mpsc::UnboundedReceiver<String>,
    pub media_source: Arc<dyn MediaSource>,
}

/// 1 回分のシグナリングセッションを実行する
///
/// 接続断で `Err`、入力の終了（ユーザーの退出）で `Ok` を返す。
pub async fn run_session(
    config: &SessionConfig,
    runtime: &mut ClientRuntime,
) -> Result<(), ClientError> {
    let (ws_stream, _response) = connect_async(&config.url)
        .await
        .map_err(|e| ClientError::Connection(e.to_string()))?;
    tracing::info!("Connected to signaling server at {}", config.url);

    let (mut write, mut read) = ws_stream.split();

    // join-room はワイヤ上の最初のイベント
    let join = JoinRoomMessage {
        r#type: MessageType::JoinRoom,
        room_id: config.room_id.clone(),
        participant_id: config.participant_id.clone(),
        display_name: config.display_name.clone(),
    };
    let join_json =
        serde_json::to_string(&join).map_err(|e| ClientError::Protocol(e.to_string()))?;
    write
        .send(Message::Text(join_json.into()))
        .await
        .map_err(|e| ClientError::Connection(e.to_string()))?;

    // ローカルメディアの取得を開始する（結果はイベントとして届く）。
    // 既に取得済み・失敗済みなら再取得しない。
    let (media_tx, mut media_rx) = mpsc::unbounded_channel();
    if runtime.manager.local_media().is_none() && !runtime.manager.media_failed() {
        let source = runtime.media_source.clone();
        tokio::spawn(async move {
            let _ = media_tx.send(source.acquire().await);
        });
    }

    let result = loop {
        tokio::select! {
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    handle_server_event(&text, &mut runtime.manager, config).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Server closed the connection");
                    break Err(ClientError::Connection("connection closed".to_string()));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break Err(ClientError::Connection(e.to_string()));
                }
            },
            Some(result) = media_rx.recv() => match result {
                Ok(stream) => runtime.manager.on_media_ready(stream).await,
                Err(e) => runtime.manager.on_media_failed(&e),
            },
            Some(incoming) = runtime.incoming_calls.recv() => {
                runtime.manager.on_incoming_call(incoming).await;
            }
            Some(event) = runtime.link_events.recv() => {
                runtime.manager.on_link_event(event);
            }
            line = runtime.chat_input.recv() => match line {
                Some(text) => {
                    let chat = ChatSendMessage {
                        r#type: MessageType::ChatMessage,
                        text: text.clone(),
                    };
                    let chat_json = serde_json::to_string(&chat)
                        .map_err(|e| ClientError::Protocol(e.to_string()))?;
                    if let Err(e) = write.send(Message::Text(chat_json.into())).await {
                        tracing::warn!("Failed to send chat message: {}", e);
                        break Err(ClientError::Connection(e.to_string()));
                    }
                    // 送信側は自分のメッセージを楽観的に描画する
                    // （サーバーはエコーを返さない）
                    print!("{}", MessageFormatter::format_sent_confirmation(&text));
                }
                None => {
                    tracing::info!("Input closed, leaving the room");
                    break Ok(());
                }
            },
        }
    };

    if result.is_ok() {
        // ページ離脱に相当：全リンクとシグナリングをベストエフォートで閉じる
        runtime.manager.shutdown();
        let _ = write.send(Message::Close(None)).await;
    }

    result
}

/// サーバーイベントを 1 件処理する
///
/// フレームは type 判別子を持つが、必須フィールドの組で一意に定まるため
/// 順にパースを試す。user-connected は user-disconnected より先に試す
/// （後者の必須フィールドは前者の部分集合）。
async fn handle_server_event(text: &str, manager: &mut ConnectionManager, config: &SessionConfig) {
    if let Ok(room_users) = serde_json::from_str::<RoomUsersMessage>(text) {
        print!(
            "{}",
            MessageFormatter::format_room_users(&room_users.users, &room_users.own_name)
        );
        let users: Vec<(String, String)> = room_users
            .users
            .into_iter()
            .map(|user| (user.id, user.name))
            .collect();
        manager.on_room_users(users, &config.participant_id).await;
    } else if let Ok(history) = serde_json::from_str::<ChatHistoryMessage>(text) {
        // 履歴はちょうど 1 回だけ適用され、手元のチャットビューを置き換える
        print!(
            "{}",
            MessageFormatter::format_chat_history(&history.messages, &config.participant_id)
        );
    } else if let Ok(connected) = serde_json::from_str::<UserConnectedMessage>(text) {
        print!(
            "{}",
            MessageFormatter::format_user_connected(
                &connected.participant_id,
                &connected.display_name
            )
        );
        manager
            .on_user_connected(connected.participant_id, connected.display_name)
            .await;
    } else if let Ok(chat) = serde_json::from_str::<ChatBroadcastMessage>(text) {
        let is_own = chat.sender == config.participant_id;
        let dto = chanoma_server::infrastructure::dto::websocket::ChatMessageDto {
            sender: chat.sender,
            sender_name: chat.sender_name,
            text: chat.text,
            timestamp: chat.timestamp,
        };
        print!("{}", MessageFormatter::format_chat_message(&dto, is_own));
    } else if let Ok(disconnected) = serde_json::from_str::<UserDisconnectedMessage>(text) {
        let name = manager
            .roster()
            .name_of(&disconnected.participant_id)
            .map(str::to_string);
        print!(
            "{}",
            MessageFormatter::format_user_disconnected(
                &disconnected.participant_id,
                name.as_deref()
            )
        );
        manager.on_user_disconnected(&disconnected.participant_id);
    } else {
        tracing::warn!("Unrecognized server event: {}", text);
    }
}
