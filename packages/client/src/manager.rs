//! Client Connection Manager
//!
//! リモート参加者 ID ごとのローカル状態機械を駆動します：
//!
//! - プレゼンスイベント → ロスター更新と発信リンクの確立・解体
//! - ローカルメディアが未準備のうちに届いた相手は Pending Queue に積み、
//!   準備完了の明示的なシグナルで到着順にちょうど 1 回だけ処理する
//!   （固定間隔のポーリングはしない）
//! - 同じ相手へのリンクは常に 1 本。張り直し時は古いリンクを先に解体する
//! - 置き換え済みリンクからの迷子イベントは世代番号で無視する
//!
//! メディア取得の失敗は致命的ではなく、閲覧専用の参加者に縮退します
//! （ロスターとチャットはそのまま機能し、発信リンクだけが張られない）。

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::media::{MediaError, MediaStream};
use crate::roster::Roster;
use crate::transport::{CallEvent, CallHandle, IncomingCall, LinkGeneration, PeerCall, PeerConnector};
use crate::video::VideoRenderer;

/// 世代番号付きのリンクイベント
///
/// トランスポートのコールバックはこの形でイベントループへ届く。
#[derive(Debug)]
pub struct LinkEvent {
    pub remote: String,
    pub generation: LinkGeneration,
    pub event: CallEvent,
}

/// 1 本のピアリンク
struct PeerLink {
    generation: LinkGeneration,
    handle: Box<dyn CallHandle>,
    /// 相手のストリームがビデオ要素にバインド済みか
    linked: bool,
}

/// Client Connection Manager
pub struct ConnectionManager {
    connector: Arc<dyn PeerConnector>,
    renderer: Arc<dyn VideoRenderer>,
    roster: Roster,
    /// リモート参加者 ID → ピアリンク（高々 1 本）
    links: HashMap<String, PeerLink>,
    /// ローカルメディア準備前に届いた (id, name)。到着順に保持
    pending_peers: VecDeque<(String, String)>,
    /// ローカルメディア準備前に届いた着信
    pending_calls: Vec<IncomingCall>,
    local_media: Option<MediaStream>,
    media_failed: bool,
    /// メディア準備完了の明示的なシグナル（ポーリングの代替）
    media_ready: watch::Sender<Option<MediaStream>>,
    next_generation: LinkGeneration,
    /// リンクイベントの転送先
    events_tx: mpsc::UnboundedSender<LinkEvent>,
}

impl ConnectionManager {
    /// マネージャと、リンクイベントの受信側を作成する
    pub fn new(
        connector: Arc<dyn PeerConnector>,
        renderer: Arc<dyn VideoRenderer>,
    ) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (media_ready, _) = watch::channel(None);
        let manager = Self {
            connector,
            renderer,
            roster: Roster::new(),
            links: HashMap::new(),
            pending_peers: VecDeque::new(),
            pending_calls: Vec::new(),
            local_media: None,
            media_failed: false,
            media_ready,
            next_generation: 0,
            events_tx,
        };
        (manager, events_rx)
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn local_media(&self) -> Option<&MediaStream> {
        self.local_media.as_ref()
    }

    pub fn media_failed(&self) -> bool {
        self.media_failed
    }

    /// メディア準備完了を待ち受けるための watch チャンネル
    pub fn media_watch(&self) -> watch::Receiver<Option<MediaStream>> {
        self.media_ready.subscribe()
    }

    /// リンクが確立済み（ストリームがバインド済み）か
    pub fn is_linked(&self, id: &str) -> bool {
        self.links.get(id).is_some_and(|link| link.linked)
    }

    /// リンクが存在するか（確立中も含む）
    pub fn has_link(&self, id: &str) -> bool {
        self.links.contains_key(id)
    }

    /// 参加時の room-users スナップショットを処理する
    ///
    /// 自分自身の参加者 ID は無視する（再接続時、別タブの自分が載ることがある）。
    pub async fn on_room_users(&mut self, users: Vec<(String, String)>, own_id: &str) {
        for (id, name) in users {
            if id == own_id {
                continue;
            }
            self.announce(id, name).await;
        }
    }

    /// user-connected イベントを処理する
    pub async fn on_user_connected(&mut self, id: String, name: String) {
        self.announce(id, name).await;
    }

    /// 相手の在室を反映する
    ///
    /// ロスターへは即座に載せる（メディアリンクの有無にかかわらず参加者は
    /// リストに見える）。発信はローカルメディアの状態に応じて行う。
    async fn announce(&mut self, id: String, name: String) {
        self.roster.upsert(&id, &name);

        match self.local_media.clone() {
            Some(stream) => self.establish_link(&id, stream).await,
            None if self.media_failed => {
                // 閲覧専用：発信リンクは張らない
            }
            None => self.pending_peers.push_back((id, name)),
        }
    }

    /// 発信リンクを確立する
    ///
    /// 同じ相手の古いリンクが残っていれば先に解体する（close イベントが
    /// 届く前に相手が再接続してきた場合の対処）。
    async fn establish_link(&mut self, id: &str, stream: MediaStream) {
        if let Some(stale) = self.links.remove(id) {
            stale.handle.close();
            self.renderer.detach(id);
            tracing::debug!("Replaced stale peer link for '{}'", id);
        }

        let generation = self.next_generation;
        self.next_generation += 1;

        match self.connector.call(id, stream).await {
            Ok(call) => self.track_link(generation, call),
            Err(e) => {
                // 再試行はしない。相手はロスターに残り、ビデオタイルだけが出ない
                tracing::warn!("Peer call to '{}' failed: {}", id, e);
            }
        }
    }

    /// コールをリンクとして登録し、イベントの転送タスクを張る
    fn track_link(&mut self, generation: LinkGeneration, call: PeerCall) {
        let PeerCall {
            remote,
            mut events,
            handle,
        } = call;

        self.links.insert(
            remote.clone(),
            PeerLink {
                generation,
                handle,
                linked: false,
            },
        );

        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if tx
                    .send(LinkEvent {
                        remote: remote.clone(),
                        generation,
                        event,
                    })
                    .is_err()
                {
                    break;
                }
            }
        });
    }

    /// ローカルメディアの準備完了を処理する
    ///
    /// Pending Queue を到着順にちょうど 1 回だけ処理して破棄し、
    /// 待たされていた着信にも応答する。
    pub async fn on_media_ready(&mut self, stream: MediaStream) {
        self.local_media = Some(stream.clone());
        let _ = self.media_ready.send(Some(stream.clone()));
        tracing::info!("Local media ready");

        let queued: Vec<(String, String)> = self.pending_peers.drain(..).collect();
        for (id, name) in queued {
            self.roster.upsert(&id, &name);
            self.establish_link(&id, stream.clone()).await;
        }

        let calls: Vec<IncomingCall> = std::mem::take(&mut self.pending_calls);
        for incoming in calls {
            self.accept_call(incoming, stream.clone()).await;
        }
    }

    /// ローカルメディアの取得失敗を処理する
    ///
    /// 閲覧専用の参加者に縮退する。ロスターはプレゼンスイベントから
    /// 更新され続け、発信リンクだけが張られなくなる。
    pub fn on_media_failed(&mut self, error: &MediaError) {
        tracing::warn!("Local media unavailable: {}", error);
        self.media_failed = true;
        self.pending_peers.clear();
        self.pending_calls.clear();
    }

    /// 着信を処理する
    ///
    /// ローカルメディアが準備済みなら即応答し、未準備なら準備完了まで待たせる。
    pub async fn on_incoming_call(&mut self, incoming: IncomingCall) {
        match self.local_media.clone() {
            Some(stream) => self.accept_call(incoming, stream).await,
            None if self.media_failed => {
                tracing::warn!(
                    "Dropping inbound call from '{}': no local media",
                    incoming.remote
                );
            }
            None => self.pending_calls.push(incoming),
        }
    }

    /// 着信に応答する
    ///
    /// 双方が同時に発信し合った場合の二重バインドを避けるため、
    /// 既にリンクがある相手からの着信は無視する。
    async fn accept_call(&mut self, incoming: IncomingCall, stream: MediaStream) {
        let remote = incoming.remote.clone();
        if self.links.contains_key(&remote) {
            tracing::debug!(
                "Ignoring inbound call from '{}': peer link already exists",
                remote
            );
            return;
        }

        let generation = self.next_generation;
        self.next_generation += 1;

        match self.connector.answer(incoming, stream).await {
            Ok(call) => self.track_link(generation, call),
            Err(e) => {
                tracing::warn!("Failed to answer call from '{}': {}", remote, e);
            }
        }
    }

    /// user-disconnected イベントを処理する
    ///
    /// リンクの解体・ビデオ要素の破棄・ロスターからの削除を行う。
    /// リンクが無い相手でも安全（解体は no-op）。
    pub fn on_user_disconnected(&mut self, id: &str) {
        if let Some(link) = self.links.remove(id) {
            link.handle.close();
        }
        self.renderer.detach(id);
        self.roster.remove(id);
        self.pending_peers.retain(|(pending_id, _)| pending_id != id);
        self.pending_calls.retain(|call| call.remote != id);
    }

    /// リンクイベントを処理する
    ///
    /// 置き換え済み・解体済みリンクからのイベントは世代番号の不一致で無視する。
    pub fn on_link_event(&mut self, event: LinkEvent) {
        let Some(link) = self.links.get_mut(&event.remote) else {
            tracing::debug!("Ignoring event for unknown link '{}'", event.remote);
            return;
        };
        if link.generation != event.generation {
            tracing::debug!("Ignoring event from replaced link for '{}'", event.remote);
            return;
        }

        match event.event {
            CallEvent::RemoteStream(stream) => {
                link.linked = true;
                self.renderer.attach(&event.remote, &stream);
                tracing::info!("Peer link with '{}' established", event.remote);
            }
            CallEvent::Closed => {
                self.links.remove(&event.remote);
                self.renderer.detach(&event.remote);
                tracing::info!("Peer link with '{}' closed", event.remote);
            }
            CallEvent::Failed(e) => {
                // ロスターのエントリは残す：参加者は見えるがビデオタイルは出ない
                tracing::warn!("Peer link with '{}' failed: {}", event.remote, e);
                self.links.remove(&event.remote);
                self.renderer.detach(&event.remote);
            }
        }
    }

    /// ページ離脱時の後始末
    ///
    /// 全リンクをベストエフォートで閉じる。失敗は無視する（プロセス終了中）。
    pub fn shutdown(&mut self) {
        for (id, link) in self.links.drain() {
            link.handle.close();
            self.renderer.detach(&id);
        }
        self.pending_peers.clear();
        self.pending_calls.clear();
    }

    /// Pending Queue の長さ（テスト・診断用）
    pub fn pending_count(&self) -> usize {
        self.pending_peers.len()
    }
}
