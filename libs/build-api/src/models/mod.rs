//! API models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Body of `POST /build-stream`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployPayload {
    pub repo_url: String,
    pub app_type: String,
    pub install_cmd: String,
    pub build_cmd: String,
    pub start_cmd: String,
    pub port: u16,
    pub root_folder: String,
    pub env: BTreeMap<String, String>,
}

/// Health state reported by `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub detail: String,
}
