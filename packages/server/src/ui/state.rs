//! Server state shared across handlers.

use std::sync::Arc;

use crate::usecase::{
    GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase, LeaveRoomUseCase, PostMessageUseCase,
};

use super::server::PeerConfig;

/// Shared application state
pub struct AppState {
    /// JoinRoomUseCase（ルーム参加のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// LeaveRoomUseCase（ルーム退去のユースケース）
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// PostMessageUseCase（チャット中継のユースケース）
    pub post_message_usecase: Arc<PostMessageUseCase>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// ピア接続（メディアトランスポート）の座標
    pub peer_config: PeerConfig,
}
