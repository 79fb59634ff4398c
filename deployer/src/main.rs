//! mini-ci - Entry Point
//!
//! Submits a deployment to the build service and follows its live log.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use minici::app::options::{request_from_args, AppOptions};
use minici::app::run::{check_health, run};
use minici::logs::{init_logging, LogLevel, LogOptions};
use minici::session::fsm::SessionStatus;
use minici::storage::settings::Settings;
use minici::utils::{parse_cli_args, version_info};

use build_api::models::HealthStatus;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let cli_args = parse_cli_args(env::args().skip(1));

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Unable to render version: {e}"),
        }
        return ExitCode::SUCCESS;
    }

    // Retrieve the settings file
    let settings_path = cli_args.get("settings").map(PathBuf::from);
    let mut settings = match Settings::load(settings_path.as_deref()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = cli_args.get("log-level") {
        match level.parse::<LogLevel>() {
            Ok(level) => settings.log_level = level,
            Err(e) => eprintln!("{e}, keeping {}", settings.log_level.to_filter_string()),
        }
    }

    // Initialize logging; the guard flushes the log file on exit
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: settings.log_json,
        log_dir: settings.log_dir.clone(),
    };
    let _log_guard = match init_logging(log_options.clone()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            // Keep stderr logging when only the log file is unusable
            let stderr_only = LogOptions {
                log_dir: None,
                ..log_options
            };
            init_logging(stderr_only).ok().flatten()
        }
    };

    let mut options = AppOptions::from(&settings);
    if cli_args.contains_key("no-keepalive") {
        options.enable_keepalive = false;
    }

    // Check the build service and exit
    if cli_args.contains_key("health") {
        return match check_health(&options).await {
            Ok(report) => {
                println!("{:?}: {}", report.status, report.detail);
                if report.status == HealthStatus::Healthy {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                }
            }
            Err(e) => {
                eprintln!("Build service unreachable: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let request = match request_from_args(&cli_args) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    info!("Running deployment with options: {:?}", options);
    match run(options, request, await_shutdown_signal()).await {
        Ok(session) if session.status() == SessionStatus::Succeeded => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("Failed to run the deployment: {e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                _ => {
                    warn!("Unable to install signal handlers, falling back to Ctrl+C");
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("Ctrl+C received, shutting down...");
    }
}
