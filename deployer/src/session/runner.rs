//! Drives one deployment attempt at a time
//!
//! The session lives inside a `watch` channel. Only the stream task of the
//! active attempt (or the runner itself while no task is running) writes to
//! it; presenters subscribe and read snapshots.

use std::sync::Arc;
use std::time::Duration;

use build_api::models::DeployPayload;
use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::errors::DeployError;
use crate::models::request::DeploymentRequest;
use crate::session::fsm::{DeploymentSession, SessionEvent, SessionStatus};
use crate::session::notify::Notifier;
use crate::session::service::{BuildService, ChunkStream};
use crate::stream::classifier::Classifier;
use crate::stream::pipeline::LogPipeline;

/// Stream consumption limits
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Longest wait for the next chunk
    pub idle_timeout: Option<Duration>,

    /// Longest time from request to end of stream
    pub total_timeout: Option<Duration>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            idle_timeout: Some(Duration::from_secs(300)),
            total_timeout: Some(Duration::from_secs(1800)),
        }
    }
}

struct ActiveStream {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the current session and the task consuming its stream
pub struct SessionRunner {
    service: Arc<dyn BuildService>,
    classifier: Arc<Classifier>,
    notifier: Arc<dyn Notifier>,
    options: StreamOptions,
    state: Arc<watch::Sender<DeploymentSession>>,
    active: Mutex<Option<ActiveStream>>,
}

impl SessionRunner {
    pub fn new(
        service: Arc<dyn BuildService>,
        classifier: Arc<Classifier>,
        notifier: Arc<dyn Notifier>,
        options: StreamOptions,
    ) -> Self {
        let (state, _) = watch::channel(DeploymentSession::new());
        Self {
            service,
            classifier,
            notifier,
            options,
            state: Arc::new(state),
            active: Mutex::new(None),
        }
    }

    /// Receive every session state change
    pub fn subscribe(&self) -> watch::Receiver<DeploymentSession> {
        self.state.subscribe()
    }

    /// Copy of the current session
    pub fn snapshot(&self) -> DeploymentSession {
        self.state.borrow().clone()
    }

    /// Start a new attempt
    ///
    /// Rejected with [`DeployError::SessionBusy`] while another attempt is in
    /// progress. A finished attempt is discarded first. Validation errors are
    /// returned before anything is sent and leave the session idle.
    pub async fn submit(&self, request: DeploymentRequest) -> Result<(), DeployError> {
        let mut active = self.active.lock().await;

        if self.state.borrow().status() == SessionStatus::InProgress {
            warn!("Rejecting submission: a deployment is already in progress");
            return Err(DeployError::SessionBusy);
        }

        request.validate()?;

        // The previous task already recorded its terminal state
        if let Some(previous) = active.take() {
            if let Err(e) = previous.handle.await {
                error!("Previous stream task failed: {}", e);
            }
        }
        if self.state.borrow().status().is_terminal() {
            apply(&self.state, self.notifier.as_ref(), SessionEvent::Reset)?;
        }

        let payload = request.to_payload();
        apply(&self.state, self.notifier.as_ref(), SessionEvent::Submit(request))?;

        let session_id = self.state.borrow().id();
        let cancel = CancellationToken::new();
        let task = StreamTask {
            service: self.service.clone(),
            classifier: self.classifier.clone(),
            notifier: self.notifier.clone(),
            options: self.options.clone(),
            state: self.state.clone(),
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(
            task.run(payload)
                .instrument(info_span!("session", id = %session_id)),
        );

        *active = Some(ActiveStream { cancel, handle });
        Ok(())
    }

    /// Wait until the current attempt is no longer in progress
    pub async fn wait(&self) -> DeploymentSession {
        let mut rx = self.state.subscribe();
        let result = rx
            .wait_for(|session| session.status() != SessionStatus::InProgress)
            .await
            .map(|session| (*session).clone());
        match result {
            Ok(session) => session,
            Err(_) => self.snapshot(),
        }
    }

    /// Abort the in-flight stream; the attempt ends in `Failed`
    pub async fn cancel(&self) {
        let active = self.active.lock().await.take();
        if let Some(active) = active {
            active.cancel.cancel();
            if let Err(e) = active.handle.await {
                error!("Stream task failed: {}", e);
            }
        }
    }

    /// Cancel any in-flight stream and return to a fresh idle session
    pub async fn reset(&self) {
        self.cancel().await;
        if let Err(e) = apply(&self.state, self.notifier.as_ref(), SessionEvent::Reset) {
            error!("Failed to reset session: {}", e);
        }
    }
}

impl Drop for SessionRunner {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().take() {
            active.cancel.cancel();
        }
    }
}

/// Apply an event to the shared session and deliver its notifications
fn apply(
    state: &watch::Sender<DeploymentSession>,
    notifier: &dyn Notifier,
    event: SessionEvent,
) -> Result<(), DeployError> {
    let mut result = Ok(Vec::new());
    state.send_if_modified(|session| {
        result = session.process(event);
        result.is_ok()
    });

    for notification in result? {
        notifier.notify(&notification);
    }
    Ok(())
}

/// The consumption loop of one attempt
struct StreamTask {
    service: Arc<dyn BuildService>,
    classifier: Arc<Classifier>,
    notifier: Arc<dyn Notifier>,
    options: StreamOptions,
    state: Arc<watch::Sender<DeploymentSession>>,
    cancel: CancellationToken,
}

impl StreamTask {
    async fn run(self, payload: DeployPayload) {
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(DeployError::Cancelled),
            result = self.consume_with_deadline(&payload) => result,
        };

        let event = match outcome {
            Ok(()) => SessionEvent::StreamEnded,
            Err(e) => {
                error!("Deployment stream failed: {}", e);
                SessionEvent::TransportFailed(e.to_string())
            }
        };

        if let Err(e) = apply(&self.state, self.notifier.as_ref(), event) {
            error!("Failed to record end of stream: {}", e);
        }
    }

    async fn consume_with_deadline(&self, payload: &DeployPayload) -> Result<(), DeployError> {
        match self.options.total_timeout {
            Some(limit) => tokio::time::timeout(limit, self.consume(payload))
                .await
                .map_err(|_| DeployError::Timeout(format!("Stream exceeded {}s", limit.as_secs())))?,
            None => self.consume(payload).await,
        }
    }

    async fn consume(&self, payload: &DeployPayload) -> Result<(), DeployError> {
        info!("Requesting build for {}", payload.repo_url);
        let mut body = self.service.start_build(payload).await?;
        let mut pipeline = LogPipeline::new(self.classifier.clone());
        let mut chunks = 0usize;

        while let Some(chunk) = self.next_chunk(&mut body).await? {
            chunks += 1;
            for event in pipeline.push(&chunk) {
                apply(&self.state, self.notifier.as_ref(), SessionEvent::Log(event))?;
            }
        }

        if let Some(leftover) = pipeline.finish() {
            warn!("Discarding unterminated frame at end of stream: {:?}", leftover);
        }
        debug!(chunks, "Stream closed");
        Ok(())
    }

    async fn next_chunk(&self, body: &mut ChunkStream) -> Result<Option<Bytes>, DeployError> {
        let next = match self.options.idle_timeout {
            Some(idle) => tokio::time::timeout(idle, body.next())
                .await
                .map_err(|_| DeployError::Timeout(format!("Stream idle for {}s", idle.as_secs())))?,
            None => body.next().await,
        };
        next.transpose()
    }
}
