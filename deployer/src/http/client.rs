//! HTTP client implementation

use std::time::Duration;

use build_api::models::{HealthReport, HealthStatus};
use reqwest::Client;
use tracing::{debug, error};

use crate::errors::DeployError;

/// Paths of the build service endpoints, relative to the base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub build: String,
    pub health: String,
    pub ping: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            build: build_api::BUILD_STREAM_PATH.to_string(),
            health: build_api::HEALTH_PATH.to_string(),
            ping: build_api::PING_PATH.to_string(),
        }
    }
}

/// HTTP client for the build service
pub struct HttpClient {
    pub(crate) client: Client,
    base_url: String,
    pub(crate) endpoints: Endpoints,
}

impl HttpClient {
    /// Create a new HTTP client with the default endpoints
    pub fn new(base_url: &str) -> Result<Self, DeployError> {
        Self::with_endpoints(base_url, Endpoints::default())
    }

    /// Create a new HTTP client
    ///
    /// Only connecting is time-limited; build streams stay open as long as the
    /// service keeps sending.
    pub fn with_endpoints(base_url: &str, endpoints: Endpoints) -> Result<Self, DeployError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoints,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check whether the build service can take deployments
    pub async fn health(&self) -> Result<HealthReport, DeployError> {
        let url = self.url(&self.endpoints.health);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            Ok(HealthReport {
                status: HealthStatus::Healthy,
                detail: body.trim().to_string(),
            })
        } else {
            error!("Health check failed: {} - {}", status, body.trim());
            Ok(HealthReport {
                status: HealthStatus::Unhealthy,
                detail: format!("{}: {}", status, body.trim()),
            })
        }
    }

    /// Mark a deployed container as in use so the service keeps it running
    pub async fn ping(&self, container_id: &str) -> Result<(), DeployError> {
        let url = format!("{}{}", self.url(&self.endpoints.ping), container_id);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Ping failed: {} - {}", status, body);
            return Err(DeployError::TransportError(format!(
                "Server responded with {}",
                status.as_u16()
            )));
        }

        Ok(())
    }
}
