//! Core types, configuration, and utilities shared by the AI Portal crates.
//!
//! - [`types`] — canonical chat request/result, provider tags, usage records
//! - [`config`] — `~/.aiportal/config.json` schema and loader
//! - [`utils`] — path and string helpers

pub mod config;
pub mod types;
pub mod utils;

pub use types::{
    CanonicalChatRequest, CanonicalChatResult, ChatResponse, ProviderTag, RequestError,
    UsageRecord,
};
