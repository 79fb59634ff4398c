//! Application configuration options

use std::collections::HashMap;
use std::time::Duration;

use crate::errors::DeployError;
use crate::http::client::Endpoints;
use crate::models::presets::AppType;
use crate::models::request::DeploymentRequest;
use crate::session::runner::StreamOptions;
use crate::storage::settings::Settings;
use crate::stream::classifier::ClassifierSettings;
use crate::utils::parse_env_pairs;
use crate::workers::keepalive;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Build service base URL
    pub backend_base_url: String,

    /// Build service endpoint paths
    pub endpoints: Endpoints,

    /// Stream limits
    pub stream: StreamOptions,

    /// Log line classification
    pub classifier: ClassifierSettings,

    /// Keep the deployed container alive after success
    pub enable_keepalive: bool,

    /// Keepalive worker options
    pub keepalive: keepalive::Options,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for AppOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            backend_base_url: settings.backend.base_url.clone(),
            endpoints: Endpoints {
                build: settings.backend.build_path.clone(),
                health: settings.backend.health_path.clone(),
                ping: settings.backend.ping_path.clone(),
            },
            stream: StreamOptions {
                idle_timeout: non_zero_secs(settings.stream.idle_timeout_secs),
                total_timeout: non_zero_secs(settings.stream.total_timeout_secs),
            },
            classifier: settings.classifier.clone(),
            enable_keepalive: settings.keepalive.enabled,
            keepalive: keepalive::Options {
                interval: Duration::from_secs(settings.keepalive.interval_secs.max(1)),
            },
        }
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Build a request from command line arguments
///
/// The preset of `--type` (node by default) fills every command that is not
/// given explicitly. An explicit empty value clears the preset command.
pub fn request_from_args(cli_args: &HashMap<String, String>) -> Result<DeploymentRequest, DeployError> {
    let app_type = match cli_args.get("type") {
        Some(raw) => raw.parse::<AppType>().map_err(DeployError::ValidationError)?,
        None => AppType::default(),
    };

    let repository_url = cli_args.get("repo").cloned().unwrap_or_default();
    let mut request = DeploymentRequest::from_preset(repository_url.trim(), app_type);

    if let Some(install) = cli_args.get("install") {
        request.install_command = install.clone();
    }
    if let Some(build) = cli_args.get("build") {
        request.build_command = build.clone();
    }
    if let Some(start) = cli_args.get("start") {
        request.start_command = start.clone();
    }
    if let Some(port) = cli_args.get("port") {
        request.port = port
            .parse()
            .map_err(|_| DeployError::ValidationError(format!("Invalid port: {}", port)))?;
    }
    if let Some(root) = cli_args.get("root") {
        request.root_folder = root.clone();
    }
    if let Some(env) = cli_args.get("env") {
        request.environment = parse_env_pairs(env);
    }

    Ok(request)
}
