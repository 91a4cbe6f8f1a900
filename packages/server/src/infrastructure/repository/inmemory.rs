//! InMemory Room Directory 実装
//!
//! ドメイン層が定義する RoomDirectory trait の具体的な実装。
//! Connection Registry と全ルームを単一の Mutex の下に置き、
//! join / leave / append をロック 1 回の中で完結させます。
//! 1 つのイベントが完了してから次のイベントが処理されるため、
//! ルーム状態の途中経過が観測されることはありません。
//!
//! ルームは最初の join で遅延生成され、明示的には破棄されません。
//! 空になったルームのチャット履歴も（プロセスが生きている限り）残ります。

use std::collections::HashMap;

use async_trait::async_trait;
use chanoma_shared::time::get_utc_timestamp;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, ConnectionId, ConnectionRecord, ConnectionRegistry, DirectoryError, Participant,
    Room, RoomDirectory, RoomId, RoomJoin, RoomLeave, RoomSummary, Timestamp,
};

/// Directory の内部状態（単一ロックの下で一括管理）
#[derive(Debug, Default)]
struct DirectoryState {
    registry: ConnectionRegistry,
    rooms: HashMap<RoomId, Room>,
}

/// インメモリ Room Directory 実装
pub struct InMemoryRoomDirectory {
    state: Mutex<DirectoryState>,
    /// ルームごとのチャット履歴保持件数
    chat_capacity: usize,
}

impl InMemoryRoomDirectory {
    /// 新しい InMemoryRoomDirectory を作成
    pub fn new() -> Self {
        Self::with_chat_capacity(crate::domain::ChatLog::DEFAULT_CAPACITY)
    }

    /// チャット履歴の保持件数を指定して作成
    pub fn with_chat_capacity(chat_capacity: usize) -> Self {
        Self {
            state: Mutex::new(DirectoryState::default()),
            chat_capacity,
        }
    }
}

impl Default for InMemoryRoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomDirectory for InMemoryRoomDirectory {
    async fn join_room(&self, record: ConnectionRecord) -> Result<RoomJoin, DirectoryError> {
        let mut state = self.state.lock().await;

        // 先に Registry へ登録（二重登録ならルームは変更しない）
        state.registry.register(record.clone())?;

        let chat_capacity = self.chat_capacity;
        let room = state
            .rooms
            .entry(record.room_id.clone())
            .or_insert_with(|| {
                Room::with_chat_capacity(
                    record.room_id.clone(),
                    Timestamp::new(get_utc_timestamp()),
                    chat_capacity,
                )
            });

        // スナップショットは join 前のルームから取る：
        // 参加者ビュー・通知対象は参加した接続自身を含まない
        let others = room.participants();
        let broadcast_targets = room.member_connections();
        let history = room.chat().snapshot();

        let already_present = room.add_connection(&record);

        Ok(RoomJoin {
            already_present,
            others,
            history,
            broadcast_targets,
        })
    }

    async fn leave_room(&self, connection_id: &ConnectionId) -> Option<RoomLeave> {
        let mut state = self.state.lock().await;

        let record = state.registry.unregister(connection_id)?;

        let Some(room) = state.rooms.get_mut(&record.room_id) else {
            // Registry にあってルームに無いことは通常起こらない
            tracing::warn!(
                "Connection '{}' was registered but room '{}' does not exist",
                connection_id,
                record.room_id
            );
            return Some(RoomLeave {
                record,
                departed: true,
                remaining: Vec::new(),
            });
        };

        let departed = room.remove_connection(&record);
        let remaining = room.member_connections();

        Some(RoomLeave {
            record,
            departed,
            remaining,
        })
    }

    async fn lookup_connection(&self, connection_id: &ConnectionId) -> Option<ConnectionRecord> {
        let state = self.state.lock().await;
        state.registry.lookup(connection_id).cloned()
    }

    async fn append_message(
        &self,
        room_id: &RoomId,
        message: ChatMessage,
    ) -> Result<Vec<ConnectionId>, DirectoryError> {
        let mut state = self.state.lock().await;

        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| DirectoryError::RoomNotFound(room_id.as_str().to_string()))?;

        room.chat_mut().push(message);

        Ok(room.member_connections())
    }

    async fn live_participants(&self, room_id: &RoomId) -> Vec<Participant> {
        let state = self.state.lock().await;
        state
            .rooms
            .get(room_id)
            .map(|room| room.participants())
            .unwrap_or_default()
    }

    async fn chat_log(&self, room_id: &RoomId) -> Vec<ChatMessage> {
        let state = self.state.lock().await;
        state
            .rooms
            .get(room_id)
            .map(|room| room.chat().snapshot())
            .unwrap_or_default()
    }

    async fn room_summaries(&self) -> Vec<RoomSummary> {
        let state = self.state.lock().await;
        state
            .rooms
            .values()
            .map(|room| RoomSummary {
                id: room.id.clone(),
                participants: room.participants(),
                connection_count: room.connection_count(),
                message_count: room.chat().len(),
                created_at: room.created_at,
            })
            .collect()
    }

    async fn room_summary(&self, room_id: &RoomId) -> Option<RoomSummary> {
        let state = self.state.lock().await;
        state.rooms.get(room_id).map(|room| RoomSummary {
            id: room.id.clone(),
            participants: room.participants(),
            connection_count: room.connection_count(),
            message_count: room.chat().len(),
            created_at: room.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, MessageText, ParticipantId};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryRoomDirectory の join / leave / append の原子的な操作
    // - 同じ参加者 ID を名乗る複数接続の重複排除（already_present / departed）
    // - join スナップショットの内容（参加者ビュー・履歴・通知対象）
    //
    // 【なぜこのテストが必要か】
    // - Directory は Presence Coordinator と Chat Relay の正しさの土台
    // - 重複排除を誤ると join/leave 通知の重複や早すぎる退室通知が発生する
    // - join と leave の通知有無が参加者ごとに厳密に交互であることを保証する
    //
    // 【どのようなシナリオをテストするか】
    // 1. 2 参加者・3 接続のシナリオ（タブ複製 → 順次切断）
    // 2. join/leave を繰り返しても通知が交互になること
    // 3. 履歴が join 前のメッセージだけを含むこと
    // ========================================

    fn record(participant: &str, name: &str, room: &str) -> ConnectionRecord {
        ConnectionRecord::new(
            ConnectionId::generate(),
            ParticipantId::new(participant.to_string()).unwrap(),
            DisplayName::new(name.to_string()).unwrap(),
            RoomId::new(room.to_string()).unwrap(),
        )
    }

    fn message(sender: &str, text: &str) -> ChatMessage {
        let participant_id = ParticipantId::new(sender.to_string()).unwrap();
        ChatMessage::new(
            participant_id.clone(),
            DisplayName::fallback_for(&participant_id),
            MessageText::new(text.to_string()).unwrap(),
            Timestamp::new(1000),
        )
    }

    #[tokio::test]
    async fn test_two_participants_and_duplicate_tab_scenario() {
        // テスト項目: タブ複製を含む一連の join/leave で通知の有無が正しく決まる
        // given (前提条件):
        let directory = InMemoryRoomDirectory::new();

        // when/then: A が空のルームに join → 参加者ビューは空
        let a_tab1 = record("user-a", "Anna", "room-1");
        let join = directory.join_room(a_tab1.clone()).await.unwrap();
        assert!(!join.already_present);
        assert!(join.others.is_empty());
        assert!(join.broadcast_targets.is_empty());

        // B が "Bob" として join → A が通知対象、ビューには A が載る
        let b = record("user-b", "Bob", "room-1");
        let join = directory.join_room(b.clone()).await.unwrap();
        assert!(!join.already_present);
        assert_eq!(join.others.len(), 1);
        assert_eq!(join.others[0].id.as_str(), "user-a");
        assert_eq!(join.broadcast_targets, vec![a_tab1.id]);

        // A の 2 つ目のタブが join → 通知は抑制、ビューには A と B が載る
        let a_tab2 = record("user-a", "Anna", "room-1");
        let join = directory.join_room(a_tab2.clone()).await.unwrap();
        assert!(join.already_present);
        let ids: Vec<&str> = join.others.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["user-a", "user-b"]);

        // A の最初のタブが切断 → まだ退室ではない
        let leave = directory.leave_room(&a_tab1.id).await.unwrap();
        assert!(!leave.departed);

        // A の 2 つ目のタブが切断 → 退室となり、B が通知対象
        let leave = directory.leave_room(&a_tab2.id).await.unwrap();
        assert!(leave.departed);
        assert_eq!(leave.remaining, vec![b.id]);
    }

    #[tokio::test]
    async fn test_presence_notifications_strictly_alternate() {
        // テスト項目: 同じ参加者 ID の join/leave を繰り返しても、
        //             通知される join と leave が厳密に交互になる
        // given (前提条件):
        let directory = InMemoryRoomDirectory::new();
        let mut notified = Vec::new();

        // when (操作): 接続の重なり方を変えながら join/leave を繰り返す
        let tab1 = record("user-a", "Anna", "room-1");
        let tab2 = record("user-a", "Anna", "room-1");
        let tab3 = record("user-a", "Anna", "room-1");

        if !directory
            .join_room(tab1.clone())
            .await
            .unwrap()
            .already_present
        {
            notified.push("join");
        }
        if !directory
            .join_room(tab2.clone())
            .await
            .unwrap()
            .already_present
        {
            notified.push("join");
        }
        if directory.leave_room(&tab1.id).await.unwrap().departed {
            notified.push("leave");
        }
        if directory.leave_room(&tab2.id).await.unwrap().departed {
            notified.push("leave");
        }
        if !directory
            .join_room(tab3.clone())
            .await
            .unwrap()
            .already_present
        {
            notified.push("join");
        }
        if directory.leave_room(&tab3.id).await.unwrap().departed {
            notified.push("leave");
        }

        // then (期待する結果): join と leave が交互で、join から始まる
        assert_eq!(notified, vec!["join", "leave", "join", "leave"]);
    }

    #[tokio::test]
    async fn test_join_snapshot_contains_only_prior_messages() {
        // テスト項目: join スナップショットの履歴には join 前のメッセージだけが含まれ、
        //             join 後の配信対象には新しい接続が含まれる
        // given (前提条件):
        let directory = InMemoryRoomDirectory::new();
        let room_id = RoomId::new("room-1".to_string()).unwrap();
        let alice = record("alice", "Alice", "room-1");
        directory.join_room(alice.clone()).await.unwrap();
        directory
            .append_message(&room_id, message("alice", "before join"))
            .await
            .unwrap();

        // when (操作): bob が join し、その後に 2 件目が投稿される
        let bob = record("bob", "Bob", "room-1");
        let join = directory.join_room(bob.clone()).await.unwrap();
        let targets_after = directory
            .append_message(&room_id, message("alice", "after join"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(join.history.len(), 1);
        assert_eq!(join.history[0].text.as_str(), "before join");
        assert!(targets_after.contains(&bob.id));
    }

    #[tokio::test]
    async fn test_append_to_unknown_room_fails() {
        // テスト項目: 存在しないルームへの履歴追加はエラーになる
        // given (前提条件):
        let directory = InMemoryRoomDirectory::new();
        let room_id = RoomId::new("nowhere".to_string()).unwrap();

        // when (操作):
        let result = directory
            .append_message(&room_id, message("alice", "hi"))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(DirectoryError::RoomNotFound(_))));
    }

    #[tokio::test]
    async fn test_chat_history_survives_empty_room() {
        // テスト項目: ルームが空になってもチャット履歴は保持される
        // given (前提条件):
        let directory = InMemoryRoomDirectory::new();
        let room_id = RoomId::new("room-1".to_string()).unwrap();
        let alice = record("alice", "Alice", "room-1");
        directory.join_room(alice.clone()).await.unwrap();
        directory
            .append_message(&room_id, message("alice", "hi"))
            .await
            .unwrap();

        // when (操作): 全員が退室した後に再 join する
        directory.leave_room(&alice.id).await.unwrap();
        let returning = record("alice", "Alice", "room-1");
        let join = directory.join_room(returning).await.unwrap();

        // then (期待する結果): 履歴が再送される
        assert_eq!(join.history.len(), 1);
        assert_eq!(join.history[0].text.as_str(), "hi");
    }

    #[tokio::test]
    async fn test_duplicate_connection_handle_is_rejected() {
        // テスト項目: 同じ接続ハンドルの二重 join はエラーになり、状態は変化しない
        // given (前提条件):
        let directory = InMemoryRoomDirectory::new();
        let alice = record("alice", "Alice", "room-1");
        directory.join_room(alice.clone()).await.unwrap();

        // when (操作):
        let result = directory.join_room(alice.clone()).await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(DirectoryError::DuplicateRegistration(_))
        ));
        let room_id = RoomId::new("room-1".to_string()).unwrap();
        let summary = directory.room_summary(&room_id).await.unwrap();
        assert_eq!(summary.connection_count, 1);
    }
}
