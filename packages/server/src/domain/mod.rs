//! ドメイン層
//!
//! ルームの在室状態（プレゼンス）とチャット履歴に関するドメインモデルと、
//! データアクセス・メッセージ通知のインターフェース（依存性の逆転）を定義します。

pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod registry;
pub mod repository;
pub mod value_object;

pub use entity::{ChatLog, ChatMessage, ConnectionRecord, Participant, Room};
pub use error::{DirectoryError, MessagePushError, RegistryError, ValidationError};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use registry::ConnectionRegistry;
pub use repository::{RoomDirectory, RoomJoin, RoomLeave, RoomSummary};
pub use value_object::{
    ConnectionId, DisplayName, MessageText, ParticipantId, RoomId, RoomIdFactory, Timestamp,
};
