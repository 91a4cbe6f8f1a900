//! Shared utilities for the Chanoma video-call application.
//!
//! This crate provides the small pieces both the coordinator server and the
//! client binaries need: timestamp handling and logging setup.

pub mod logger;
pub mod time;
