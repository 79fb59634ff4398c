//! Streaming build endpoint

use async_trait::async_trait;
use build_api::models::DeployPayload;
use futures::{StreamExt, TryStreamExt};
use reqwest::{header, StatusCode};
use tracing::{debug, error};

use crate::errors::DeployError;
use crate::http::client::HttpClient;
use crate::session::service::{BuildService, ChunkStream};

#[async_trait]
impl BuildService for HttpClient {
    async fn start_build(&self, payload: &DeployPayload) -> Result<ChunkStream, DeployError> {
        let url = self.url(&self.endpoints.build);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "text/event-stream")
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Build request failed: {} - {}", status, body);
            return Err(DeployError::TransportError(format!(
                "Server responded with {}",
                status.as_u16()
            )));
        }

        if status == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
            return Err(DeployError::TransportError(
                "No response body received".to_string(),
            ));
        }

        Ok(response.bytes_stream().map_err(DeployError::from).boxed())
    }
}
