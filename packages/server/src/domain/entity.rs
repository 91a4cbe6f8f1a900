//! ドメインエンティティ定義
//!
//! - `ConnectionRecord`: トランスポート接続 1 本につき 1 レコード
//! - `Room`: 接続の集合・参加者の在室カウント・チャット履歴を保持
//! - `ChatLog`: 容量制限付きのチャット履歴（FIFO、最古から追い出し）
//!
//! ルームの参加者ビューは接続ではなく参加者 ID 単位で重複排除されます。
//! 在室判定は参加者 ID → 接続本数のマップで O(1) に保ちます。

use std::collections::{HashMap, HashSet, VecDeque};

use super::value_object::{
    ConnectionId, DisplayName, MessageText, ParticipantId, RoomId, Timestamp,
};

/// トランスポート接続 1 本分の接続レコード
///
/// 接続の join で生成され、切断で破棄される。寿命はトランスポート層が管理する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    /// 接続ハンドル
    pub id: ConnectionId,
    /// この接続が名乗る参加者 ID
    pub participant_id: ParticipantId,
    /// 表示名（解決済み）
    pub display_name: DisplayName,
    /// 参加先ルーム
    pub room_id: RoomId,
}

impl ConnectionRecord {
    pub fn new(
        id: ConnectionId,
        participant_id: ParticipantId,
        display_name: DisplayName,
        room_id: RoomId,
    ) -> Self {
        Self {
            id,
            participant_id,
            display_name,
            room_id,
        }
    }
}

/// 重複排除済みの参加者ビューの 1 エントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: DisplayName,
}

/// チャットメッセージ（生成後は不変）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// 送信者の参加者 ID
    pub sender: ParticipantId,
    /// 送信時点の表示名
    pub sender_name: DisplayName,
    /// 本文
    pub text: MessageText,
    /// サーバー受信時刻
    pub timestamp: Timestamp,
}

impl ChatMessage {
    pub fn new(
        sender: ParticipantId,
        sender_name: DisplayName,
        text: MessageText,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            sender,
            sender_name,
            text,
            timestamp,
        }
    }
}

/// 容量制限付きチャット履歴
///
/// 容量を超えると最古のメッセージから追い出される（FIFO リングバッファ）。
#[derive(Debug, Clone)]
pub struct ChatLog {
    messages: VecDeque<ChatMessage>,
    capacity: usize,
}

impl ChatLog {
    /// デフォルトの履歴保持件数
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// メッセージを追加し、容量超過時に追い出された最古のメッセージを返す
    pub fn push(&mut self, message: ChatMessage) -> Option<ChatMessage> {
        self.messages.push_back(message);
        if self.messages.len() > self.capacity {
            self.messages.pop_front()
        } else {
            None
        }
    }

    /// 履歴のスナップショットを古い順に取得
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new()
    }
}

/// 参加者 ID ごとの在室情報
#[derive(Debug, Clone)]
struct PresenceEntry {
    /// この参加者 ID を名乗る接続の本数
    connections: usize,
    /// 最後に登録された表示名（後勝ち）
    name: DisplayName,
}

/// ルーム
///
/// 最初の join で遅延生成され、明示的には破棄されない。
/// チャット履歴はルームが空になっても保持される。
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    /// 在室中の接続ハンドル
    members: HashSet<ConnectionId>,
    /// 参加者 ID → 在室情報（接続本数カウントで重複排除を O(1) に保つ）
    presence: HashMap<ParticipantId, PresenceEntry>,
    /// チャット履歴
    chat: ChatLog,
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(id: RoomId, created_at: Timestamp) -> Self {
        Self::with_chat_capacity(id, created_at, ChatLog::DEFAULT_CAPACITY)
    }

    pub fn with_chat_capacity(id: RoomId, created_at: Timestamp, chat_capacity: usize) -> Self {
        Self {
            id,
            members: HashSet::new(),
            presence: HashMap::new(),
            chat: ChatLog::with_capacity(chat_capacity),
            created_at,
        }
    }

    /// 接続をルームに追加する
    ///
    /// 戻り値は、追加前の時点で同じ参加者 ID を名乗る接続が既に存在していたかどうか。
    /// 表示名は後勝ちで更新される。
    pub fn add_connection(&mut self, record: &ConnectionRecord) -> bool {
        let already_present = self.carries(&record.participant_id);
        self.members.insert(record.id);
        self.presence
            .entry(record.participant_id.clone())
            .and_modify(|entry| {
                entry.connections += 1;
                entry.name = record.display_name.clone();
            })
            .or_insert(PresenceEntry {
                connections: 1,
                name: record.display_name.clone(),
            });
        already_present
    }

    /// 接続をルームから取り除く
    ///
    /// 戻り値は、この接続の除去で参加者が完全に退室したかどうか
    /// （同じ参加者 ID を名乗る接続が残っていれば `false`）。
    pub fn remove_connection(&mut self, record: &ConnectionRecord) -> bool {
        if !self.members.remove(&record.id) {
            return false;
        }
        match self.presence.get_mut(&record.participant_id) {
            Some(entry) if entry.connections > 1 => {
                entry.connections -= 1;
                false
            }
            Some(_) => {
                self.presence.remove(&record.participant_id);
                true
            }
            None => false,
        }
    }

    /// 指定した参加者 ID を名乗る接続が在室しているか
    pub fn carries(&self, participant_id: &ParticipantId) -> bool {
        self.presence.contains_key(participant_id)
    }

    /// 在室中の接続ハンドル一覧
    pub fn member_connections(&self) -> Vec<ConnectionId> {
        self.members.iter().copied().collect()
    }

    /// 在室中の接続本数
    pub fn connection_count(&self) -> usize {
        self.members.len()
    }

    /// 重複排除済みの参加者ビュー（参加者 ID 順）
    pub fn participants(&self) -> Vec<Participant> {
        let mut participants: Vec<Participant> = self
            .presence
            .iter()
            .map(|(id, entry)| Participant {
                id: id.clone(),
                name: entry.name.clone(),
            })
            .collect();

        // Sort by participant id for consistent ordering
        participants.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));

        participants
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatLog {
        &mut self.chat
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_room() -> Room {
        Room::new(
            RoomId::new("room-1".to_string()).unwrap(),
            Timestamp::new(1000),
        )
    }

    fn test_record(connection_id: ConnectionId, participant: &str, name: &str) -> ConnectionRecord {
        ConnectionRecord::new(
            connection_id,
            ParticipantId::new(participant.to_string()).unwrap(),
            DisplayName::new(name.to_string()).unwrap(),
            RoomId::new("room-1".to_string()).unwrap(),
        )
    }

    fn test_message(sender: &str, text: &str, timestamp: i64) -> ChatMessage {
        ChatMessage::new(
            ParticipantId::new(sender.to_string()).unwrap(),
            DisplayName::new(sender.to_string()).unwrap(),
            MessageText::new(text.to_string()).unwrap(),
            Timestamp::new(timestamp),
        )
    }

    #[test]
    fn test_add_first_connection_is_not_already_present() {
        // テスト項目: 参加者の最初の接続では already_present が false になる
        // given (前提条件):
        let mut room = test_room();
        let record = test_record(ConnectionId::generate(), "alice", "Alice");

        // when (操作):
        let already_present = room.add_connection(&record);

        // then (期待する結果):
        assert!(!already_present);
        assert!(room.carries(&record.participant_id));
        assert_eq!(room.connection_count(), 1);
    }

    #[test]
    fn test_add_second_connection_for_same_participant() {
        // テスト項目: 同じ参加者 ID の 2 本目の接続では already_present が true になる
        // given (前提条件):
        let mut room = test_room();
        let tab1 = test_record(ConnectionId::generate(), "alice", "Alice");
        let tab2 = test_record(ConnectionId::generate(), "alice", "Alice");
        room.add_connection(&tab1);

        // when (操作):
        let already_present = room.add_connection(&tab2);

        // then (期待する結果):
        assert!(already_present);
        assert_eq!(room.connection_count(), 2);
        // 参加者ビューは重複排除される
        assert_eq!(room.participants().len(), 1);
    }

    #[test]
    fn test_display_name_last_value_wins() {
        // テスト項目: 同じ参加者 ID の再 join では最後に登録された表示名が有効になる
        // given (前提条件):
        let mut room = test_room();
        let tab1 = test_record(ConnectionId::generate(), "alice", "Alice");
        let tab2 = test_record(ConnectionId::generate(), "alice", "Alicia");
        room.add_connection(&tab1);

        // when (操作):
        room.add_connection(&tab2);

        // then (期待する結果):
        let participants = room.participants();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].name.as_str(), "Alicia");
    }

    #[test]
    fn test_remove_connection_with_sibling_is_not_departure() {
        // テスト項目: 同じ参加者 ID の接続が残っている場合、除去は退室にならない
        // given (前提条件):
        let mut room = test_room();
        let tab1 = test_record(ConnectionId::generate(), "alice", "Alice");
        let tab2 = test_record(ConnectionId::generate(), "alice", "Alice");
        room.add_connection(&tab1);
        room.add_connection(&tab2);

        // when (操作):
        let departed = room.remove_connection(&tab1);

        // then (期待する結果):
        assert!(!departed);
        assert!(room.carries(&tab1.participant_id));
    }

    #[test]
    fn test_remove_last_connection_is_departure() {
        // テスト項目: 最後の接続の除去で参加者が完全に退室する
        // given (前提条件):
        let mut room = test_room();
        let record = test_record(ConnectionId::generate(), "alice", "Alice");
        room.add_connection(&record);

        // when (操作):
        let departed = room.remove_connection(&record);

        // then (期待する結果):
        assert!(departed);
        assert!(!room.carries(&record.participant_id));
        assert!(room.is_empty());
    }

    #[test]
    fn test_remove_unknown_connection_is_noop() {
        // テスト項目: 未登録の接続の除去は何も起こさない（冪等性）
        // given (前提条件):
        let mut room = test_room();
        let record = test_record(ConnectionId::generate(), "alice", "Alice");

        // when (操作):
        let departed = room.remove_connection(&record);

        // then (期待する結果):
        assert!(!departed);
        assert!(room.is_empty());
    }

    #[test]
    fn test_participants_sorted_and_deduplicated() {
        // テスト項目: 参加者ビューは参加者 ID 順かつ重複排除済みで返される
        // given (前提条件):
        let mut room = test_room();
        room.add_connection(&test_record(ConnectionId::generate(), "charlie", "Charlie"));
        room.add_connection(&test_record(ConnectionId::generate(), "alice", "Alice"));
        room.add_connection(&test_record(ConnectionId::generate(), "bob", "Bob"));
        room.add_connection(&test_record(ConnectionId::generate(), "alice", "Alice"));

        // when (操作):
        let participants = room.participants();

        // then (期待する結果):
        assert_eq!(participants.len(), 3);
        assert_eq!(participants[0].id.as_str(), "alice");
        assert_eq!(participants[1].id.as_str(), "bob");
        assert_eq!(participants[2].id.as_str(), "charlie");
    }

    #[test]
    fn test_chat_log_keeps_messages_in_order() {
        // テスト項目: チャット履歴は追加順に保持される
        // given (前提条件):
        let mut log = ChatLog::new();

        // when (操作):
        log.push(test_message("alice", "first", 1));
        log.push(test_message("bob", "second", 2));

        // then (期待する結果):
        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].text.as_str(), "first");
        assert_eq!(snapshot[1].text.as_str(), "second");
    }

    #[test]
    fn test_chat_log_evicts_oldest_beyond_capacity() {
        // テスト項目: 容量を超えるとちょうど最古の 1 件が追い出される
        // given (前提条件):
        let mut log = ChatLog::new();
        for i in 0..ChatLog::DEFAULT_CAPACITY {
            log.push(test_message("alice", &format!("message {}", i), i as i64));
        }
        assert_eq!(log.len(), ChatLog::DEFAULT_CAPACITY);

        // when (操作): 101 件目を追加
        let evicted = log.push(test_message("alice", "overflow", 999));

        // then (期待する結果):
        assert_eq!(log.len(), ChatLog::DEFAULT_CAPACITY);
        let evicted = evicted.expect("oldest message should be evicted");
        assert_eq!(evicted.text.as_str(), "message 0");
        let snapshot = log.snapshot();
        assert_eq!(snapshot[0].text.as_str(), "message 1");
        assert_eq!(
            snapshot[ChatLog::DEFAULT_CAPACITY - 1].text.as_str(),
            "overflow"
        );
    }

    #[test]
    fn test_chat_log_with_custom_capacity() {
        // テスト項目: 指定した容量で履歴が制限される
        // given (前提条件):
        let mut log = ChatLog::with_capacity(2);

        // when (操作):
        log.push(test_message("alice", "one", 1));
        log.push(test_message("alice", "two", 2));
        log.push(test_message("alice", "three", 3));

        // then (期待する結果):
        assert_eq!(log.len(), 2);
        let snapshot = log.snapshot();
        assert_eq!(snapshot[0].text.as_str(), "two");
        assert_eq!(snapshot[1].text.as_str(), "three");
    }
}
