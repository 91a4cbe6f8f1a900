//! Room Directory trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 原子性について
//!
//! join / leave / append はそれぞれ 1 回の操作として原子的に実行されます。
//! join はプレゼンス状態の更新と同時にスナップショット（参加者ビュー・
//! チャット履歴・通知対象）を取得するため、参加直後のクライアントには
//! 履歴がちょうど 1 回だけ届き、以降のライブ配信と重複も欠落もしません。

use async_trait::async_trait;

use super::entity::{ChatMessage, ConnectionRecord, Participant};
use super::error::DirectoryError;
use super::value_object::{ConnectionId, RoomId, Timestamp};

/// join の結果スナップショット
#[derive(Debug, Clone)]
pub struct RoomJoin {
    /// join 前の時点で同じ参加者 ID を名乗る別の接続が在室していたか
    /// （true の場合、join 通知は抑制される）
    pub already_present: bool,
    /// join した接続を除く参加者ビュー（重複排除済み）
    ///
    /// 再接続の場合、別の接続が名乗る自分自身の参加者 ID は含まれる。
    pub others: Vec<Participant>,
    /// join 時点のチャット履歴
    pub history: Vec<ChatMessage>,
    /// join 通知の配信対象（join した接続を除く在室接続）
    pub broadcast_targets: Vec<ConnectionId>,
}

/// leave の結果
#[derive(Debug, Clone)]
pub struct RoomLeave {
    /// 除去された接続レコード
    pub record: ConnectionRecord,
    /// この接続の除去で参加者が完全に退室したか
    /// （false の場合、leave 通知は抑制される）
    pub departed: bool,
    /// ルームに残っている接続
    pub remaining: Vec<ConnectionId>,
}

/// ルームの概要（HTTP API 用の読み取りモデル）
#[derive(Debug, Clone)]
pub struct RoomSummary {
    pub id: RoomId,
    pub participants: Vec<Participant>,
    pub connection_count: usize,
    pub message_count: usize,
    pub created_at: Timestamp,
}

/// Room Directory trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// 接続をルームに参加させる
    ///
    /// ルームは最初の join で遅延生成される。接続レコードの登録・ルームへの
    /// 追加・スナップショット取得を原子的に行う。
    async fn join_room(&self, record: ConnectionRecord) -> Result<RoomJoin, DirectoryError>;

    /// 接続をルームから退去させる
    ///
    /// 未登録のハンドルに対しては `None`（冪等）。
    async fn leave_room(&self, connection_id: &ConnectionId) -> Option<RoomLeave>;

    /// 接続レコードを取得
    async fn lookup_connection(&self, connection_id: &ConnectionId) -> Option<ConnectionRecord>;

    /// チャットメッセージをルームの履歴に追加する
    ///
    /// 容量超過時は最古のメッセージが追い出される。戻り値は追加時点で
    /// 在室していた接続のスナップショット（配信対象の決定に使用）。
    async fn append_message(
        &self,
        room_id: &RoomId,
        message: ChatMessage,
    ) -> Result<Vec<ConnectionId>, DirectoryError>;

    /// ルームの重複排除済み参加者ビューを取得
    async fn live_participants(&self, room_id: &RoomId) -> Vec<Participant>;

    /// ルームのチャット履歴を取得（読み取り専用ビュー）
    async fn chat_log(&self, room_id: &RoomId) -> Vec<ChatMessage>;

    /// 全ルームの概要を取得
    async fn room_summaries(&self) -> Vec<RoomSummary>;

    /// 指定したルームの概要を取得
    async fn room_summary(&self, room_id: &RoomId) -> Option<RoomSummary>;
}
