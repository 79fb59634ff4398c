//! Build service seam

use async_trait::async_trait;
use build_api::models::DeployPayload;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::errors::DeployError;

/// Raw response body, chunk by chunk
pub type ChunkStream = BoxStream<'static, Result<Bytes, DeployError>>;

/// Starts a build and hands back its streamed log body
#[async_trait]
pub trait BuildService: Send + Sync {
    /// Fails with a transport error on non-2xx status or a missing body
    async fn start_build(&self, payload: &DeployPayload) -> Result<ChunkStream, DeployError>;
}
