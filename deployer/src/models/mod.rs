//! Deployment request models

pub mod presets;
pub mod request;
