//! UseCase: ルーム退去処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LeaveRoomUseCase::execute() メソッド
//! - 退去処理（レコード除去、退室判定、通知対象選定）
//!
//! ### なぜこのテストが必要か
//! - ビジネスロジックの検証：同じ参加者 ID の接続が残っている間は
//!   leave 通知が抑制される
//! - 最後の接続の切断で初めて leave 通知が配信されることを保証
//! - 未登録ハンドルの切断が冪等に処理されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：最後の接続の切断と通知
//! - 正常系：タブ残存時の通知抑制
//! - エッジケース：未登録ハンドルの切断（後始末と切断の競合）

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, ParticipantId, RoomDirectory, RoomId};

/// 退去処理の結果
#[derive(Debug, Clone)]
pub struct DepartedPresence {
    /// 切断した接続が名乗っていた参加者 ID
    pub participant_id: ParticipantId,
    /// 退去元ルーム
    pub room_id: RoomId,
    /// 参加者が完全に退室したか（false なら leave 通知は抑制）
    pub departed: bool,
    /// leave 通知の配信対象（退室していない場合は空）
    pub notify_targets: Vec<ConnectionId>,
}

/// ルーム退去のユースケース
pub struct LeaveRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    directory: Arc<dyn RoomDirectory>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl LeaveRoomUseCase {
    /// 新しい LeaveRoomUseCase を作成
    pub fn new(directory: Arc<dyn RoomDirectory>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            directory,
            message_pusher,
        }
    }

    /// ルーム退去を実行
    ///
    /// レコードの除去が先、残存判定はその後。同じ参加者 ID を名乗る接続が
    /// 残っていれば leave 通知は抑制される。
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 切断した接続のハンドル
    ///
    /// # Returns
    ///
    /// * `Some(DepartedPresence)` - 退去処理の結果
    /// * `None` - 接続が登録されていなかった（冪等に無視）
    pub async fn execute(&self, connection_id: ConnectionId) -> Option<DepartedPresence> {
        let left = self.directory.leave_room(&connection_id).await;

        // チャンネルの解除は登録の有無にかかわらず行う（冪等）
        self.message_pusher
            .unregister_connection(&connection_id)
            .await;

        left.map(|leave| DepartedPresence {
            participant_id: leave.record.participant_id,
            room_id: leave.record.room_id,
            departed: leave.departed,
            notify_targets: if leave.departed {
                leave.remaining
            } else {
                Vec::new()
            },
        })
    }

    /// 参加者が退室したことを残りの在室接続にブロードキャスト
    ///
    /// # Arguments
    ///
    /// * `targets` - ブロードキャスト対象の接続ハンドル
    /// * `message` - ブロードキャストするメッセージ（JSON）
    pub async fn broadcast_user_disconnected(
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
