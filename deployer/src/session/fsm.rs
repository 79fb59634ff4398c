//! Finite state machine for one deployment attempt

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::DeployError;
use crate::models::request::DeploymentRequest;
use crate::session::notify::Notification;
use crate::stream::classifier::ClassifiedEvent;

/// Message recorded when the stream closes without announcing a URL
pub const NO_LIVE_URL_MESSAGE: &str = "Deployment stream ended without a live URL";

/// Session status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No attempt active
    #[default]
    Idle,

    /// Request sent, stream being consumed
    InProgress,

    /// Stream closed after a live URL was announced
    Succeeded,

    /// Transport failure, or stream closed without a live URL
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Succeeded | SessionStatus::Failed)
    }
}

/// Session event
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Start an attempt with this request
    Submit(DeploymentRequest),

    /// A framed and classified log line arrived
    Log(ClassifiedEvent),

    /// The response stream closed normally
    StreamEnded,

    /// Network failure, bad status, timeout or cancellation
    TransportFailed(String),

    /// Discard everything and return to idle
    Reset,
}

/// State of one deployment attempt
///
/// `events` only grows while the session is in progress; everything else is
/// replaced wholesale by [`SessionEvent::Reset`].
#[derive(Debug, Clone)]
pub struct DeploymentSession {
    id: Uuid,
    request: Option<DeploymentRequest>,
    events: Vec<String>,
    status: SessionStatus,
    live_url: Option<String>,
    error_message: Option<String>,
    container_id: Option<String>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl DeploymentSession {
    /// Create a new idle session
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            request: None,
            events: Vec::new(),
            status: SessionStatus::Idle,
            live_url: None,
            error_message: None,
            container_id: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn request(&self) -> Option<&DeploymentRequest> {
        self.request.as_ref()
    }

    /// Log lines in arrival order
    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// First live URL announced by the stream
    pub fn live_url(&self) -> Option<&str> {
        self.live_url.as_deref()
    }

    /// Most recent failure reported by the stream or transport
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Process an event and transition state
    ///
    /// Returns the notifications the transition produced. A rejected event
    /// leaves the session untouched.
    pub fn process(&mut self, event: SessionEvent) -> Result<Vec<Notification>, DeployError> {
        let mut notifications = Vec::new();

        let new_status = match (self.status, event) {
            (SessionStatus::Idle, SessionEvent::Submit(request)) => {
                request.validate()?;
                info!(session = %self.id, repo = %request.repository_url, "Deployment started");
                notifications.push(Notification::Started {
                    repository_url: request.repository_url.clone(),
                });
                self.request = Some(request);
                self.started_at = Some(Utc::now());
                SessionStatus::InProgress
            }
            (SessionStatus::InProgress, SessionEvent::Submit(_)) => {
                return Err(DeployError::SessionBusy);
            }

            (SessionStatus::InProgress, SessionEvent::Log(event)) => {
                debug!(session = %self.id, "{}", event.line);
                if self.live_url.is_none() {
                    if let Some(url) = event.live_url {
                        info!(session = %self.id, url = %url, "Live URL announced");
                        notifications.push(Notification::Succeeded { url: url.clone() });
                        self.live_url = Some(url);
                    }
                }
                if self.container_id.is_none() {
                    self.container_id = event.container_id;
                }
                if let Some(message) = event.error {
                    warn!(session = %self.id, "Deployment reported: {}", message);
                    notifications.push(Notification::ReportedError {
                        message: message.clone(),
                    });
                    self.error_message = Some(message);
                }
                self.events.push(event.line);
                SessionStatus::InProgress
            }

            (SessionStatus::InProgress, SessionEvent::StreamEnded) => {
                self.finished_at = Some(Utc::now());
                if self.live_url.is_some() {
                    info!(session = %self.id, events = self.events.len(), "Deployment succeeded");
                    SessionStatus::Succeeded
                } else {
                    // error_message only ever holds reported failures
                    let message = self
                        .error_message
                        .clone()
                        .unwrap_or_else(|| NO_LIVE_URL_MESSAGE.to_string());
                    warn!(session = %self.id, "Deployment failed: {}", message);
                    notifications.push(Notification::Failed { message });
                    SessionStatus::Failed
                }
            }
            (SessionStatus::InProgress, SessionEvent::TransportFailed(message)) => {
                warn!(session = %self.id, "Deployment failed: {}", message);
                self.finished_at = Some(Utc::now());
                self.error_message = Some(message.clone());
                notifications.push(Notification::Failed { message });
                SessionStatus::Failed
            }

            (_, SessionEvent::Reset) => {
                debug!(session = %self.id, "Session reset");
                *self = Self::new();
                return Ok(notifications);
            }

            // Invalid transitions
            (status, event) => {
                return Err(DeployError::InvalidTransition(format!(
                    "{:?} -> {}",
                    status,
                    event_name(&event)
                )));
            }
        };

        self.status = new_status;
        Ok(notifications)
    }
}

impl Default for DeploymentSession {
    fn default() -> Self {
        Self::new()
    }
}

fn event_name(event: &SessionEvent) -> &'static str {
    match event {
        SessionEvent::Submit(_) => "Submit",
        SessionEvent::Log(_) => "Log",
        SessionEvent::StreamEnded => "StreamEnded",
        SessionEvent::TransportFailed(_) => "TransportFailed",
        SessionEvent::Reset => "Reset",
    }
}
