//! Wire models for the mini-ci build service.

pub mod models;

/// Streaming build endpoint
pub const BUILD_STREAM_PATH: &str = "/build-stream";

/// Health endpoint
pub const HEALTH_PATH: &str = "/health";

/// Container keepalive endpoint prefix; the container id is appended
pub const PING_PATH: &str = "/ping/";
