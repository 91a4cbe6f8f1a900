//! UseCase: ルーム参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - 参加処理（接続登録、在室判定、スナップショット取得）
//!
//! ### なぜこのテストが必要か
//! - ビジネスロジックの検証：同じ参加者 ID の重複 join で通知が抑制される
//! - 参加者ビューが重複排除され、参加した接続自身が除外されることを保証
//! - チャット履歴が join 時点のスナップショットとして取得されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規参加者の join（通知あり）
//! - 正常系：同じ参加者 ID での再 join（通知抑制）
//! - 異常系：接続ハンドルの二重登録

use std::sync::Arc;

use crate::domain::{
    ChatMessage, ConnectionId, ConnectionRecord, DisplayName, MessagePusher, Participant,
    ParticipantId, PusherChannel, RoomDirectory, RoomId,
};

use super::error::JoinError;

/// 参加処理の結果
///
/// ハンドラはこの結果をもとに `room-users` / `chat-history` の送信と、
/// `announce` が true の場合のみ `user-connected` のブロードキャストを行う。
#[derive(Debug, Clone)]
pub struct JoinedRoom {
    /// 参加した接続のハンドル
    pub connection_id: ConnectionId,
    /// 参加先ルーム
    pub room_id: RoomId,
    /// 参加者 ID
    pub participant_id: ParticipantId,
    /// 解決済みの表示名（クライアント指定またはフォールバック）
    pub resolved_name: DisplayName,
    /// 参加した接続を除く参加者ビュー（重複排除済み）
    pub others: Vec<Participant>,
    /// join 時点のチャット履歴
    pub history: Vec<ChatMessage>,
    /// join 通知を配信するか（同じ参加者 ID が在室済みの場合は false）
    pub announce: bool,
    /// join 通知の配信対象
    pub broadcast_targets: Vec<ConnectionId>,
}

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    directory: Arc<dyn RoomDirectory>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
    pub fn new(directory: Arc<dyn RoomDirectory>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            directory,
            message_pusher,
        }
    }

    /// ルーム参加を実行
    ///
    /// 送信チャンネルを先に登録してから Directory に原子的に参加させる。
    /// この順序により、参加直後に他の接続から届くライブ配信は必ず
    /// スナップショット（履歴）の後に並ぶ。
    ///
    /// # Arguments
    ///
    /// * `record` - 参加する接続のレコード（Domain Model）
    /// * `sender` - この接続へのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(JoinedRoom)` - 参加成功
    /// * `Err(JoinError)` - 参加失敗（接続ハンドルの二重登録）
    pub async fn execute(
        &self,
        record: ConnectionRecord,
        sender: PusherChannel,
    ) -> Result<JoinedRoom, JoinError> {
        // 1. MessagePusher にチャンネルを登録
        self.message_pusher
            .register_connection(record.id, sender)
            .await;

        // 2. Directory に原子的に参加（登録・在室判定・スナップショット）
        let join = match self.directory.join_room(record.clone()).await {
            Ok(join) => join,
            Err(error) => {
                // 失敗した接続のチャンネルは残さない
                self.message_pusher.unregister_connection(&record.id).await;
                return Err(JoinError::from(error));
            }
        };

        Ok(JoinedRoom {
            connection_id: record.id,
            room_id: record.room_id,
            participant_id: record.participant_id,
            resolved_name: record.display_name,
            others: join.others,
            history: join.history,
            announce: !join.already_present,
            broadcast_targets: join.broadcast_targets,
        })
    }

    /// 参加者が join したことを既存の在室接続にブロードキャスト
    ///
    /// # Arguments
    ///
    /// * `joined` - 参加処理の結果
    /// * `message` - ブロードキャストするメッセージ（JSON）
    pub async fn broadcast_user_connected(
        &self,
        joined: &JoinedRoom,
        message: &str,
    ) -> Result<(), String> {
        self.message_pusher
            .broadcast(joined.broadcast_targets.clone(), message)
            .await
            .map_err(|e| e.to_string())
    }
}
