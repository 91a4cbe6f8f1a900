//! UseCase: ルーム詳細取得処理

use std::sync::Arc;

use crate::domain::{RoomDirectory, RoomId, RoomSummary};

use super::error::GetRoomDetailError;

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    /// Repository（データアクセス層の抽象化）
    directory: Arc<dyn RoomDirectory>,
}

impl GetRoomDetailUseCase {
    /// 新しい GetRoomDetailUseCase を作成
    pub fn new(directory: Arc<dyn RoomDirectory>) -> Self {
        Self { directory }
    }

    /// 指定したルームの詳細を取得
    ///
    /// # Arguments
    ///
    /// * `room_id` - ルーム ID（未検証の文字列）
    pub async fn execute(&self, room_id: String) -> Result<RoomSummary, GetRoomDetailError> {
        let room_id = RoomId::new(room_id).map_err(|_| GetRoomDetailError::RoomNotFound)?;
        self.directory
            .room_summary(&room_id)
            .await
            .ok_or(GetRoomDetailError::RoomNotFound)
    }
}
