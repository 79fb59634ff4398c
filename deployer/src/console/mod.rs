//! Terminal presentation of a deployment session
//!
//! Log lines are printed in arrival order as snapshots come in; notifications
//! are printed between them as toasts, and the final state is summarised as
//! a link and/or an error alert.

use std::io::Write;

use colored::Colorize;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::models::presets::AppType;
use crate::session::fsm::{DeploymentSession, SessionStatus};
use crate::session::notify::Notification;

/// Renders session state to a writer
pub struct Console<W: Write> {
    out: W,
    session: Option<Uuid>,
    printed: usize,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            session: None,
            printed: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Show the preset note before a deployment
    pub fn render_tip(&mut self, app_type: AppType) {
        let _ = writeln!(
            self.out,
            "{} {}",
            "Quick Tip:".bold(),
            app_type.preset().notes.dimmed()
        );
    }

    /// Print lines appended since the last call
    pub fn render_lines(&mut self, session: &DeploymentSession) {
        if self.session != Some(session.id()) {
            self.session = Some(session.id());
            self.printed = 0;
        }

        let events = session.events();
        for line in events.iter().skip(self.printed) {
            let _ = writeln!(self.out, "  {}", line);
        }
        self.printed = events.len();
        let _ = self.out.flush();
    }

    pub fn render_notification(&mut self, notification: &Notification) {
        let _ = match notification {
            Notification::Started { repository_url } => writeln!(
                self.out,
                "{} Deployment started for {}",
                "▶".cyan().bold(),
                repository_url
            ),
            Notification::Succeeded { url } => writeln!(
                self.out,
                "{} {}\n  Your application is now live at {}\n  Open: {}",
                "✔".green().bold(),
                "Deployment Successful".green().bold(),
                url,
                url.underline()
            ),
            // The line itself is already on screen; the alert comes with the summary
            Notification::ReportedError { .. } => Ok(()),
            Notification::Failed { message } => writeln!(
                self.out,
                "{} {}\n  {}",
                "✖".red().bold(),
                "Deployment Failed".red().bold(),
                message
            ),
        };
        let _ = self.out.flush();
    }

    /// Final link, error alert and status line
    pub fn render_summary(&mut self, session: &DeploymentSession) {
        if session.events().is_empty() {
            let _ = writeln!(self.out, "{}", "No deployment logs were received.".dimmed());
        }
        if let Some(url) = session.live_url() {
            let _ = writeln!(self.out, "{} {}", "Live at:".green().bold(), url.underline());
        }
        if let Some(message) = session.error_message() {
            let _ = writeln!(self.out, "{} {}", "Error:".red().bold(), message);
        }

        let elapsed = match (session.started_at(), session.finished_at()) {
            (Some(start), Some(end)) => {
                format!(" in {:.1}s", (end - start).num_milliseconds() as f64 / 1000.0)
            }
            _ => String::new(),
        };
        let status = match session.status() {
            SessionStatus::Succeeded => "succeeded".green().bold(),
            SessionStatus::Failed => "failed".red().bold(),
            SessionStatus::InProgress => "in progress".yellow().bold(),
            SessionStatus::Idle => "idle".normal(),
        };
        let _ = writeln!(
            self.out,
            "Deployment {}{} ({} log lines)",
            status,
            elapsed,
            session.events().len()
        );
        let _ = self.out.flush();
    }
}

/// Render a session until its notifier goes away
///
/// Returns once every notification sender has been dropped, which happens
/// after the runner and its stream task are gone.
pub async fn follow<W: Write>(
    mut console: Console<W>,
    mut state: watch::Receiver<DeploymentSession>,
    mut notifications: mpsc::UnboundedReceiver<Notification>,
) -> Console<W> {
    let mut state_open = true;

    loop {
        tokio::select! {
            changed = state.changed(), if state_open => {
                if changed.is_err() {
                    state_open = false;
                }
                console.render_lines(&state.borrow_and_update());
            }
            notification = notifications.recv() => {
                console.render_lines(&state.borrow_and_update());
                match notification {
                    Some(notification) => console.render_notification(&notification),
                    None => break,
                }
            }
        }
    }

    let session = state.borrow().clone();
    console.render_summary(&session);
    console
}
