//! UseCase: チャット中継処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - PostMessageUseCase::execute() メソッド
//! - チャット中継（送信者解決、履歴追加、配信対象選定）
//!
//! ### なぜこのテストが必要か
//! - ビジネスロジックの検証：送信者の接続だけが配信から除外される
//!   （同じ参加者 ID の別接続には配信される）
//! - 履歴の容量超過時に最古のメッセージが追い出されることを保証
//! - 未登録の接続からの送信がエラーになることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：メッセージの中継と履歴追加
//! - エッジケース：送信者のみが在室（配信対象なし）
//! - 異常系：未登録の接続からの送信

use std::sync::Arc;

use chanoma_shared::time::get_utc_timestamp;

use crate::domain::{
    ChatMessage, ConnectionId, MessagePusher, MessageText, RoomDirectory, Timestamp,
};

use super::error::PostMessageError;

/// チャット中継の結果
#[derive(Debug, Clone)]
pub struct RelayedMessage {
    /// 履歴に追加されたメッセージ
    pub message: ChatMessage,
    /// 配信対象（送信者の接続を除く在室接続）
    pub targets: Vec<ConnectionId>,
}

/// チャット中継のユースケース
pub struct PostMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    directory: Arc<dyn RoomDirectory>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl PostMessageUseCase {
    /// 新しい PostMessageUseCase を作成
    pub fn new(directory: Arc<dyn RoomDirectory>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            directory,
            message_pusher,
        }
    }

    /// チャット中継を実行
    ///
    /// 送信者の参加者 ID・表示名は Connection Registry から解決し、
    /// タイムスタンプは受信時点で打つ。送信者自身にはエコーしない
    /// （送信側は送信時に楽観的に描画する）。
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 送信元の接続ハンドル
    /// * `text` - メッセージ本文（Domain Model）
    ///
    /// # Returns
    ///
    /// * `Ok(RelayedMessage)` - 中継成功
    /// * `Err(PostMessageError)` - 中継失敗
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        text: MessageText,
    ) -> Result<RelayedMessage, PostMessageError> {
        // 1. 送信者を Connection Registry から解決
        let record = self
            .directory
            .lookup_connection(&connection_id)
            .await
            .ok_or_else(|| PostMessageError::UnknownConnection(connection_id.to_string()))?;

        // 2. 受信時点のタイムスタンプでメッセージを構築
        let message = ChatMessage::new(
            record.participant_id,
            record.display_name,
            text,
            Timestamp::new(get_utc_timestamp()),
        );

        // 3. 履歴に追加（容量超過時は最古を追い出し）し、配信対象を決定
        let members = self
            .directory
            .append_message(&record.room_id, message.clone())
            .await
            .map_err(|e| PostMessageError::RelayFailed(e.to_string()))?;

        let targets: Vec<ConnectionId> = members
            .into_iter()
            .filter(|id| *id != connection_id)
            .collect();

        Ok(RelayedMessage { message, targets })
    }

    /// メッセージを配信対象にブロードキャスト
    ///
    /// # Arguments
    ///
    /// * `targets` - ブロードキャスト対象の接続ハンドル
    /// * `message` - ブロードキャストするメッセージ（JSON）
    pub async fn broadcast_message(
        &self,
        targets: Vec<ConnectionId>,
        message: &str,
    ) -> Result<(), String> {
        self.message_pusher
            .broadcast(targets, message)
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionRecord, DisplayName, ParticipantId, RoomId},
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemoryRoomDirectory,
        },
    };
    use std::sync::Arc;

    fn test_record(participant: &str, room: &str) -> ConnectionRecord {
        let participant_id = ParticipantId::new(participant.to_string()).unwrap();
        ConnectionRecord::new(
            ConnectionId::generate(),
            participant_id.clone(),
            DisplayName::fallback_for(&participant_id),
            RoomId::new(room.to_string()).unwrap(),
        )
    }

    fn create_test_usecase() -> (Arc<InMemoryRoomDirectory>, PostMessageUseCase) {
        let directory = Arc::new(InMemoryRoomDirectory::new());
        let message_pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = PostMessageUseCase::new(directory.clone(), message_pusher);
        (directory, usecase)
    }

    #[tokio::test]
    async fn test_relay_excludes_sender_connection() {
        // テスト項目: 配信対象から送信者の接続だけが除外される
        // given (前提条件):
        let (directory, usecase) = create_test_usecase();
        let alice = test_record("alice", "room-1");
        let bob = test_record("bob", "room-1");
        let charlie = test_record("charlie", "room-1");
        directory.join_room(alice.clone()).await.unwrap();
        directory.join_room(bob.clone()).await.unwrap();
        directory.join_room(charlie.clone()).await.unwrap();

        // when (操作): alice がメッセージを送信
        let result = usecase
            .execute(alice.id, MessageText::new("hi".to_string()).unwrap())
            .await;

        // then (期待する結果):
        let relayed = result.unwrap();
        assert_eq!(relayed.message.sender.as_str(), "alice");
        assert_eq!(relayed.message.text.as_str(), "hi");
        assert_eq!(relayed.targets.len(), 2);
        assert!(relayed.targets.contains(&bob.id));
        assert!(relayed.targets.contains(&charlie.id));
        assert!(!relayed.targets.contains(&alice.id));
    }

    #[tokio::test]
    async fn test_relay_reaches_senders_other_connection() {
        // テスト項目: 送信者の別の接続（同じ参加者 ID のタブ）には配信される
        // given (前提条件):
        let (directory, usecase) = create_test_usecase();
        let tab1 = test_record("alice", "room-1");
        let tab2 = test_record("alice", "room-1");
        directory.join_room(tab1.clone()).await.unwrap();
        directory.join_room(tab2.clone()).await.unwrap();

        // when (操作): 1 つ目のタブからメッセージを送信
        let result = usecase
            .execute(tab1.id, MessageText::new("hi".to_string()).unwrap())
            .await;

        // then (期待する結果): 2 つ目のタブが配信対象になる
        let relayed = result.unwrap();
        assert_eq!(relayed.targets, vec![tab2.id]);
    }

    #[tokio::test]
    async fn test_relay_with_no_other_connections() {
        // テスト項目: 送信者のみが在室している場合、配信対象は空
        // given (前提条件):
        let (directory, usecase) = create_test_usecase();
        let alice = test_record("alice", "room-1");
        directory.join_room(alice.clone()).await.unwrap();

        // when (操作):
        let result = usecase
            .execute(alice.id, MessageText::new("hi".to_string()).unwrap())
            .await;

        // then (期待する結果):
        let relayed = result.unwrap();
        assert!(relayed.targets.is_empty());

        // 履歴には追加されている
        assert_eq!(directory.chat_log(&alice.room_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_relay_from_unknown_connection_fails() {
        // テスト項目: 未登録の接続からの送信はエラーになる
        // given (前提条件):
        let (_directory, usecase) = create_test_usecase();

        // when (操作):
        let result = usecase
            .execute(
                ConnectionId::generate(),
                MessageText::new("hi".to_string()).unwrap(),
            )
            .await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(PostMessageError::UnknownConnection(_))
        ));
    }

    #[tokio::test]
    async fn test_history_evicts_oldest_beyond_capacity() {
        // テスト項目: 101 件目の投稿でちょうど最古の 1 件が追い出される
        // given (前提条件):
        let (directory, usecase) = create_test_usecase();
        let alice = test_record("alice", "room-1");
        directory.join_room(alice.clone()).await.unwrap();

        for i in 0..100 {
            usecase
                .execute(
                    alice.id,
                    MessageText::new(format!("message {}", i)).unwrap(),
                )
                .await
                .unwrap();
        }

        // when (操作): 101 件目を投稿
        usecase
            .execute(alice.id, MessageText::new("overflow".to_string()).unwrap())
            .await
            .unwrap();

        // then (期待する結果):
        let history = directory.chat_log(&alice.room_id).await;
        assert_eq!(history.len(), 100);
        assert_eq!(history[0].text.as_str(), "message 1");
        assert_eq!(history[99].text.as_str(), "overflow");
    }
}
