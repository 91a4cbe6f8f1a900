//! Value Object 定義
//!
//! 不正な値がドメイン層に入り込まないよう、生成時にバリデーションを行います。
//! 参加者 ID・ルーム ID はクライアントが提示する不透明な文字列、
//! 接続 ID はトランスポート層（サーバー側）が採番する UUID です。

use std::fmt;

use uuid::Uuid;

use super::error::ValidationError;

/// ルームを識別する不透明な文字列
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    pub const MAX_LENGTH: usize = 128;

    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::Empty);
        }
        if value.chars().count() > Self::MAX_LENGTH {
            return Err(ValidationError::TooLong {
                max: Self::MAX_LENGTH,
                actual: value.chars().count(),
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// RoomId のファクトリ
///
/// HTTP のルーム入口（`GET /`）が新規ルームへリダイレクトする際に使用します。
pub struct RoomIdFactory;

impl RoomIdFactory {
    /// UUID v4 ベースの新しい RoomId を生成
    pub fn generate() -> Result<RoomId, ValidationError> {
        RoomId::new(Uuid::new_v4().to_string())
    }
}

/// 論理的な参加者（ユーザー）を識別する不透明な文字列
///
/// ブラウザのタブセッションごとに安定しており、再接続をまたいで維持される。
/// 同一の値を持つトランスポート接続が同時に複数存在しうる（タブ複製・高速再接続）。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub const MAX_LENGTH: usize = 128;

    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::Empty);
        }
        if value.chars().count() > Self::MAX_LENGTH {
            return Err(ValidationError::TooLong {
                max: Self::MAX_LENGTH,
                actual: value.chars().count(),
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// トランスポート接続ごとの接続ハンドル（サーバー側で採番）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// 新しい ConnectionId を採番
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 表示名
///
/// クライアント指定、またはサーバー導出のフォールバック（参加者 ID の先頭 8 文字）。
/// 再接続時は後勝ち（最後に登録された値が有効）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    pub const MAX_LENGTH: usize = 64;

    /// フォールバック導出に使う参加者 ID の先頭文字数
    const FALLBACK_PREFIX_LENGTH: usize = 8;

    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::Empty);
        }
        if value.chars().count() > Self::MAX_LENGTH {
            return Err(ValidationError::TooLong {
                max: Self::MAX_LENGTH,
                actual: value.chars().count(),
            });
        }
        Ok(Self(value))
    }

    /// 参加者 ID から表示名のフォールバックを導出
    pub fn fallback_for(participant_id: &ParticipantId) -> Self {
        Self(
            participant_id
                .as_str()
                .chars()
                .take(Self::FALLBACK_PREFIX_LENGTH)
                .collect(),
        )
    }

    /// クライアント指定の表示名を解決
    ///
    /// 指定が無い・不正な場合はフォールバックを導出する。
    pub fn resolve(provided: Option<String>, participant_id: &ParticipantId) -> Self {
        match provided {
            Some(value) => Self::new(value).unwrap_or_else(|_| Self::fallback_for(participant_id)),
            None => Self::fallback_for(participant_id),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// チャットメッセージ本文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageText(String);

impl MessageText {
    pub const MAX_LENGTH: usize = 2000;

    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::Empty);
        }
        if value.chars().count() > Self::MAX_LENGTH {
            return Err(ValidationError::TooLong {
                max: Self::MAX_LENGTH,
                actual: value.chars().count(),
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageText {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unix タイムスタンプ（UTC、ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
