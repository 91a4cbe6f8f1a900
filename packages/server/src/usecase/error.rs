//! UseCase 層のエラー型定義

use thiserror::Error;

/// 参加処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// 同一の接続ハンドルが二重に登録された
    ///
    /// 正しいトランスポート層の使用では発生しない。発生した場合は
    /// その接続に対して致命的として扱い、ログに残して切断する。
    #[error("connection '{0}' is already registered")]
    DuplicateRegistration(String),

    /// Directory の操作に失敗した
    #[error("failed to join room: {0}")]
    DirectoryFailure(String),
}

impl From<crate::domain::DirectoryError> for JoinError {
    fn from(error: crate::domain::DirectoryError) -> Self {
        match error {
            crate::domain::DirectoryError::DuplicateRegistration(id) => {
                Self::DuplicateRegistration(id.to_string())
            }
            other => Self::DirectoryFailure(other.to_string()),
        }
    }
}

/// チャット中継のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostMessageError {
    /// 送信元の接続が登録されていない
    #[error("connection '{0}' is not registered")]
    UnknownConnection(String),

    /// 履歴への追加に失敗
    #[error("failed to relay message: {0}")]
    RelayFailed(String),
}

/// ルーム詳細取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    /// ルームが存在しない
    #[error("room not found")]
    RoomNotFound,
}
