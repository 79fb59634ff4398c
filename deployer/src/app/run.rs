//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use build_api::models::HealthReport;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::app::options::AppOptions;
use crate::console::{self, Console};
use crate::errors::DeployError;
use crate::http::client::HttpClient;
use crate::models::request::DeploymentRequest;
use crate::session::fsm::{DeploymentSession, SessionStatus};
use crate::session::notify::ChannelNotifier;
use crate::session::runner::SessionRunner;
use crate::stream::classifier::Classifier;
use crate::workers::keepalive;

/// Deploy one request and render it to the terminal
///
/// The shutdown signal cancels an in-flight deployment, or stops the
/// keepalive worker once the deployment has succeeded.
pub async fn run(
    options: AppOptions,
    request: DeploymentRequest,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<DeploymentSession, DeployError> {
    request.validate()?;

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal.await;
        trigger.cancel();
    });

    let http_client = Arc::new(HttpClient::with_endpoints(
        &options.backend_base_url,
        options.endpoints.clone(),
    )?);
    let classifier = Arc::new(Classifier::new(&options.classifier)?);
    let (notifier, notifications) = ChannelNotifier::new();

    let runner = SessionRunner::new(
        http_client.clone(),
        classifier,
        Arc::new(notifier),
        options.stream.clone(),
    );

    let mut console = Console::new(std::io::stdout());
    console.render_tip(request.app_type);
    let presenter = console::follow(console, runner.subscribe(), notifications);

    let deployment = async {
        let submitted = runner.submit(request).await;
        if submitted.is_ok() {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Cancelling deployment...");
                    runner.cancel().await;
                }
                _ = runner.wait() => {}
            }
        }
        let session = runner.wait().await;
        // Closes the notification channel so the presenter can finish
        drop(runner);
        submitted.map(|_| session)
    };

    let (session, _) = tokio::join!(deployment, presenter);
    let session = session?;

    if options.enable_keepalive
        && session.status() == SessionStatus::Succeeded
        && !shutdown.is_cancelled()
    {
        if let Some(container_id) = session.container_id() {
            println!("Keeping container {} alive, press Ctrl+C to stop", container_id);
            let signal = shutdown.clone();
            keepalive::run(
                &options.keepalive,
                http_client.as_ref(),
                container_id,
                tokio::time::sleep,
                Box::pin(async move { signal.cancelled().await }),
            )
            .await;
        }
    }

    Ok(session)
}

/// Ask the build service whether it can take deployments
pub async fn check_health(options: &AppOptions) -> Result<HealthReport, DeployError> {
    let http_client = HttpClient::with_endpoints(&options.backend_base_url, options.endpoints.clone())?;
    http_client.health().await.inspect_err(|e| {
        error!("Health check failed: {}", e);
    })
}
