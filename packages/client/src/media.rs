//! ローカルメディア取得の抽象化
//!
//! ブラウザのメディアキャプチャ（カメラ・マイク）に相当する外部コラボレータ。
//! 取得は非同期で、許可ダイアログなどにより任意に時間がかかり、拒否により
//! 失敗しうる。失敗してもクライアントは落ちず、閲覧専用の参加者として
//! 動作を続ける（ロスターとチャットはプレゼンスイベントから更新される）。

use async_trait::async_trait;
use thiserror::Error;

/// ローカル / リモートのメディアストリームを指す不透明なハンドル
///
/// メディアの中身はトランスポート実装の側にあり、この型は識別子だけを持つ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStream {
    id: String,
}

impl MediaStream {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// メディア取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    /// ユーザーがキャプチャを拒否した
    #[error("media capture permission denied")]
    PermissionDenied,

    /// キャプチャが利用できない
    #[error("media capture unavailable: {0}")]
    Unavailable(String),
}

/// ローカルメディア取得の trait
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// ローカルの音声・映像ストリームを取得する
    async fn acquire(&self) -> Result<MediaStream, MediaError>;
}

/// ヘッドレス動作用の MediaSource 実装
///
/// キャプチャは常に利用不可。クライアントは閲覧専用の参加者になる。
pub struct NoCaptureSource;

#[async_trait]
impl MediaSource for NoCaptureSource {
    async fn acquire(&self) -> Result<MediaStream, MediaError> {
        Err(MediaError::Unavailable(
            "media capture is disabled in this client".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_capture_source_is_always_unavailable() {
        // テスト項目: NoCaptureSource の取得は常に Unavailable になる
        // given (前提条件):
        let source = NoCaptureSource;

        // when (操作):
        let result = source.acquire().await;

        // then (期待する結果):
        assert!(matches!(result, Err(MediaError::Unavailable(_))));
    }
}
