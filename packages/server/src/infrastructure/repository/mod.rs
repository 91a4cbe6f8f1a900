//! Room Directory 実装

mod inmemory;

pub use inmemory::InMemoryRoomDirectory;
