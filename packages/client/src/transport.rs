//! ピアメディアトランスポートの抽象化
//!
//! 参加者 ID をキーに双方向のメディアセッションを張る外部コラボレータ。
//! 確立済みのコールからは stream / close / error のイベントがチャンネル
//! 経由で届く。置き換え済みのリンクから漏れてくるイベントは、リンクの
//! 世代番号（generation）で識別して無視する。

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::media::MediaStream;

/// ピアリンクの世代番号
///
/// 同じ相手に対してリンクを張り直すたびに増える。古い世代のイベントは
/// 破棄される（キャンセル済みリンクの迷子コールバック対策）。
pub type LinkGeneration = u64;

/// コールから届くイベント
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    /// 相手側のメディアストリームが届いた
    RemoteStream(MediaStream),
    /// コールが閉じられた
    Closed,
    /// ネゴシエーションまたは転送の失敗（非同期に報告される）
    Failed(String),
}

/// 相手側から着信したコール
#[derive(Debug, Clone)]
pub struct IncomingCall {
    /// 発信元の参加者 ID
    pub remote: String,
}

/// ピアトランスポートのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// トランスポート層の失敗
    #[error("peer transport failure: {0}")]
    Transport(String),
}

/// 確立中・確立済みコールへのハンドル
///
/// `close` は冪等でなければならない。閉鎖済みコールへの `close` は no-op。
pub trait CallHandle: Send + Sync {
    fn close(&self);
}

/// 1 本のピアコール
///
/// イベントチャンネルの受信側はマネージャが所有し、リンクの世代番号を
/// 付けてイベントループへ転送する。
pub struct PeerCall {
    /// 相手の参加者 ID
    pub remote: String,
    /// このコールからのイベント
    pub events: mpsc::UnboundedReceiver<CallEvent>,
    /// コールの操作ハンドル
    pub handle: Box<dyn CallHandle>,
}

/// ピアトランスポートの trait
#[async_trait]
pub trait PeerConnector: Send + Sync {
    /// 相手に発信する
    async fn call(&self, remote: &str, local: MediaStream) -> Result<PeerCall, CallError>;

    /// 着信にローカルストリームで応答する
    async fn answer(&self, incoming: IncomingCall, local: MediaStream)
    -> Result<PeerCall, CallError>;
}

/// ヘッドレス動作用の PeerConnector 実装
///
/// メディアトランスポートを持たないため、発信・応答は常に失敗する。
/// ローカルメディアが無い構成（NoCaptureSource）では呼び出されない。
pub struct DisabledConnector;

#[async_trait]
impl PeerConnector for DisabledConnector {
    async fn call(&self, _remote: &str, _local: MediaStream) -> Result<PeerCall, CallError> {
        Err(CallError::Transport(
            "peer media transport is disabled in this client".to_string(),
        ))
    }

    async fn answer(
        &self,
        _incoming: IncomingCall,
        _local: MediaStream,
    ) -> Result<PeerCall, CallError> {
        Err(CallError::Transport(
            "peer media transport is disabled in this client".to_string(),
        ))
    }
}
