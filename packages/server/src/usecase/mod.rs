//! UseCase 層
//!
//! プレゼンス調停（join / leave の通知抑制）とチャット中継のビジネスロジック。
//! Repository と MessagePusher の trait にのみ依存します。

mod error;
mod get_room_detail;
mod get_rooms;
mod join_room;
mod leave_room;
mod post_message;

pub use error::{GetRoomDetailError, JoinError, PostMessageError};
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::{JoinRoomUseCase, JoinedRoom};
pub use leave_room::{DepartedPresence, LeaveRoomUseCase};
pub use post_message::{PostMessageUseCase, RelayedMessage};
