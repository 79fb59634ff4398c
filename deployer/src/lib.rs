//! mini-ci client library
//!
//! Streams deployment logs from the build service and tracks each
//! deployment as a session.

pub mod app;
pub mod console;
pub mod errors;
pub mod http;
pub mod logs;
pub mod models;
pub mod session;
pub mod storage;
pub mod stream;
pub mod utils;
pub mod workers;
