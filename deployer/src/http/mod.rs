//! HTTP access to the build service

pub mod builds;
pub mod client;
