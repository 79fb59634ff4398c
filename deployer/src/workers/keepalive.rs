//! Container keepalive worker
//!
//! The build service stops containers nobody has pinged for a minute. While
//! the user keeps the client open after a successful deployment, this worker
//! pings the deployed container.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::errors::DeployError;
use crate::http::client::HttpClient;

/// Keepalive worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Ping interval
    pub interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

/// Something that can mark a container as in use
#[async_trait]
pub trait ContainerPinger: Send + Sync {
    async fn ping_container(&self, container_id: &str) -> Result<(), DeployError>;
}

#[async_trait]
impl ContainerPinger for HttpClient {
    async fn ping_container(&self, container_id: &str) -> Result<(), DeployError> {
        self.ping(container_id).await
    }
}

/// Run the keepalive worker until shutdown; returns the number of successful pings
pub async fn run<P, S, F>(
    options: &Options,
    pinger: &P,
    container_id: &str,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) -> u64
where
    P: ContainerPinger + ?Sized,
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Keepalive worker starting for container {}", container_id);
    let mut pings = 0;

    loop {
        match pinger.ping_container(container_id).await {
            Ok(()) => {
                pings += 1;
                debug!("Pinged container {}", container_id);
            }
            Err(e) => {
                // Will retry on next interval
                warn!("Failed to ping container {}: {}", container_id, e);
            }
        }

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Keepalive worker shutting down...");
                return pings;
            }
            _ = sleep_fn(options.interval) => {}
        }
    }
}
