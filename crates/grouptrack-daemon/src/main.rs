//! GroupTrack Daemon - Background membership tracking service
//!
//! This binary runs as a user service and handles:
//! - Loading and validating the YAML configuration
//! - Restoring the persisted membership indexes
//! - Watching the snapshot directory and driving the membership engine
//! - Delivering notifications through the webhook (or the log)
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon wires the adapters together and hands control to the
//! [`Orchestrator`] event loop. The loop is controlled by a
//! `CancellationToken` that is triggered on receipt of SIGTERM or SIGINT.

use std::{ffi::OsString, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use grouptrack_core::{
    config::{Config, LoggingConfig, NotificationsConfig},
    engine::MembershipEngine,
    ports::INotifier,
};
use grouptrack_notify::{LogNotifier, MessageOptions, NotificationDispatcher, WebhookNotifier};
use grouptrack_store::JsonIndexStore;
use grouptrack_sync::Orchestrator;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the configuration file location
const CONFIG_ENV: &str = "GROUPTRACK_CONFIG";

// ============================================================================
// DaemonService
// ============================================================================

/// Main daemon service wiring the engine, store, notifier and watcher
struct DaemonService {
    config: Config,
    shutdown: CancellationToken,
}

impl DaemonService {
    fn new(config: Config, shutdown: CancellationToken) -> Self {
        Self { config, shutdown }
    }

    /// Runs until the shutdown token is cancelled
    ///
    /// 1. Restores the membership indexes from the state directory
    /// 2. Starts the notification dispatcher
    /// 3. Reconciles the snapshot directory and watches it for changes
    async fn run(self) -> Result<()> {
        let config = &self.config;

        let store = Arc::new(JsonIndexStore::new(&config.storage.state_dir));
        info!(state_dir = %config.storage.state_dir.display(), "Using index store");

        let engine = MembershipEngine::restore(store, config.grace_period()).await;

        let notifier = build_notifier(&config.notifications)?;
        let options = MessageOptions {
            alert_role: config.notifications.alert_role.clone(),
        };
        let dispatcher = NotificationDispatcher::spawn(notifier, options);

        let orchestrator = Orchestrator::new(
            engine,
            dispatcher,
            &config.snapshots.directory,
            config.debounce_delay(),
        );

        info!(
            directory = %config.snapshots.directory.display(),
            grace_minutes = config.tracking.group_change_time,
            "Membership tracking started"
        );

        orchestrator
            .run(self.shutdown.clone())
            .await
            .context("Membership event loop failed")?;

        info!("Membership event loop terminated");
        Ok(())
    }
}

/// Picks the webhook adapter when a URL is configured, the log adapter otherwise
fn build_notifier(config: &NotificationsConfig) -> Result<Arc<dyn INotifier>> {
    match &config.webhook_url {
        Some(url) => {
            info!(
                requests_per_minute = config.requests_per_minute,
                "Delivering notifications to webhook"
            );
            let notifier = WebhookNotifier::new(
                url.clone(),
                config.requests_per_minute,
                std::time::Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Arc::new(notifier))
        }
        None => {
            info!("No webhook configured, notifications will only be logged");
            Ok(Arc::new(LogNotifier::new()))
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Resolves the configuration path from the override or the platform default
fn config_path(override_path: Option<OsString>) -> PathBuf {
    override_path
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path)
}

/// Loads and validates the configuration
///
/// A missing file yields the defaults; an unparsable file or any
/// validation error is fatal.
fn load_config(path: &std::path::Path) -> Result<Config> {
    let config = if path.exists() {
        Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?
    } else {
        Config::default()
    };

    let errors = config.validate();
    if !errors.is_empty() {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::bail!(
            "Invalid configuration ({}): {}",
            path.display(),
            details.join("; ")
        );
    }
    Ok(config)
}

/// Installs the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `logging.level`.
fn init_tracing(logging: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let path = config_path(std::env::var_os(CONFIG_ENV));
    let config = load_config(&path)?;

    init_tracing(&config.logging);
    info!(config_path = %path.display(), "GroupTrack daemon starting (grouptrackd)");

    let shutdown_token = CancellationToken::new();

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let result = DaemonService::new(config, shutdown_token).run().await;

    match &result {
        Ok(()) => info!("GroupTrack daemon shut down gracefully"),
        Err(e) => error!(error = %format!("{e:#}"), "GroupTrack daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
