//! ドメイン層のエラー型定義

use thiserror::Error;

use super::value_object::ConnectionId;

/// Value Object の生成時バリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 空文字列は許可されない
    #[error("value must not be empty")]
    Empty,

    /// 最大長を超過
    #[error("value exceeds maximum length of {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },
}

/// Connection Registry のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// 同一の接続ハンドルが二重に登録された（トランスポート層の使用誤り）
    #[error("connection '{0}' is already registered")]
    DuplicateRegistration(ConnectionId),
}

/// Room Directory のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// 同一の接続ハンドルが二重に登録された
    #[error("connection '{0}' is already registered")]
    DuplicateRegistration(ConnectionId),

    /// 接続が登録されていない
    #[error("connection '{0}' is not registered")]
    ConnectionNotFound(ConnectionId),

    /// ルームが存在しない
    #[error("room '{0}' does not exist")]
    RoomNotFound(String),
}

impl From<RegistryError> for DirectoryError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::DuplicateRegistration(id) => Self::DuplicateRegistration(id),
        }
    }
}

/// MessagePusher のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// 送信先の接続が見つからない
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    /// メッセージ送信に失敗
    #[error("failed to push message: {0}")]
    PushFailed(String),
}
