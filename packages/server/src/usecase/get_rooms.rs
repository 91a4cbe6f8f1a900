//! UseCase: ルーム一覧取得処理

use std::sync::Arc;

use crate::domain::{RoomDirectory, RoomSummary};

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    /// Repository（データアクセス層の抽象化）
    directory: Arc<dyn RoomDirectory>,
}

impl GetRoomsUseCase {
    /// 新しい GetRoomsUseCase を作成
    pub fn new(directory: Arc<dyn RoomDirectory>) -> Self {
        Self { directory }
    }

    /// 全ルームの概要を取得（ルーム ID 順）
    pub async fn execute(&self) -> Vec<RoomSummary> {
        let mut summaries = self.directory.room_summaries().await;
        summaries.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        summaries
    }
}
