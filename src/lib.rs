#![forbid(unsafe_code)]

//! `clocktower` — an MCP time server over HTTP/SSE.
//!
//! Exposes two tools (`get_current_time`, `get_timezone_info`) to MCP
//! clients connecting through a Server-Sent Events stream paired with a
//! message-post endpoint, correlated by session ID.

pub mod config;
pub mod errors;
pub mod mcp;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
