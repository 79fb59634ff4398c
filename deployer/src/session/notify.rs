//! Notifications raised by session transitions

use serde::Serialize;
use tokio::sync::mpsc;

/// A user-facing notification; delivered once, never retried
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// The request was accepted and sent
    Started { repository_url: String },

    /// A live URL was announced; the presenter offers to open it
    Succeeded { url: String },

    /// The stream reported a failure line; consumption continues
    ReportedError { message: String },

    /// The attempt ended in `Failed`
    Failed { message: String },
}

/// Receives notifications from the session runner
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Discards notifications
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notification: &Notification) {}
}

/// Forwards notifications to a channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: &Notification) {
        // Receiver gone means nobody is presenting any more
        let _ = self.tx.send(notification.clone());
    }
}
