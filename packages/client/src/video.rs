//! ビデオ描画面の抽象化
//!
//! リモート参加者 ID をキーにビデオ要素を生成・破棄する外部コラボレータ。
//! `detach` は未バインドの ID に対して no-op でなければならない
//! （閉鎖済みリンクの後始末が二重に走るため）。

use crate::media::MediaStream;

/// ビデオ描画面の trait
pub trait VideoRenderer: Send + Sync {
    /// リモート参加者のストリームをビデオ要素にバインドする
    fn attach(&self, participant_id: &str, stream: &MediaStream);

    /// リモート参加者のビデオ要素を破棄する（未バインドなら no-op）
    fn detach(&self, participant_id: &str);
}

/// ヘッドレス動作用の VideoRenderer 実装（ログ出力のみ）
pub struct NullRenderer;

impl VideoRenderer for NullRenderer {
    fn attach(&self, participant_id: &str, stream: &MediaStream) {
        tracing::debug!(
            "Video stream '{}' attached for participant '{}'",
            stream.id(),
            participant_id
        );
    }

    fn detach(&self, participant_id: &str) {
        tracing::debug!("Video surface detached for participant '{}'", participant_id);
    }
}
