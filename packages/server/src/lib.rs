//! Room presence and chat coordinator for browser video-call rooms.
//!
//! This library tracks which logical participants are present in a room
//! despite multiple underlying transport connections per participant,
//! deduplicates join/leave notifications, retains a bounded chat history per
//! room and replays it to latecomers. Media itself flows directly between
//! browsers; this crate only relays the signaling around it.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
