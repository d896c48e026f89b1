use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use clients::{ApiClient, MailpitClient};
use config::Config;
use ingest::Processor;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod clients;
pub mod config;
pub mod domain;
pub mod email;
pub mod error;
pub mod ingest;
pub mod overrides;
pub mod parsing;
pub mod resolve;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::new().expect("config");

    let account_overrides = match &config.account_overrides_path {
        Some(path) => overrides::load_overrides(Path::new(path)).expect("override file"),
        None => HashMap::new(),
    };

    let registry = parsing::build_registry().expect("parser registry");
    tracing::info!("registered {} templates", registry.len());

    let source = MailpitClient::new(&config).expect("mailbox client");
    let api = ApiClient::new(&config).expect("api client");

    let processor = Processor::new(
        source,
        api.clone(),
        api,
        registry,
        account_overrides,
        config.default_account_id,
        config.auto_create_accounts,
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(config.poll_interval_secs));
    tracing::info!("polling every {}s", config.poll_interval_secs);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match processor.run_once().await {
                    Ok(report) => {
                        if report.fetched > 0 {
                            tracing::info!(
                                "run done: {} fetched, {} stored, {} duplicates, {} unmatched, {} dropped, {} deferred",
                                report.fetched,
                                report.stored,
                                report.duplicates,
                                report.unmatched,
                                report.dropped,
                                report.deferred,
                            );
                        }
                    }
                    Err(err) => tracing::error!("run failed: {err:#}"),
                }
            }
            _ = shutdown_signal() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("error installing ctrl+c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("error installing signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
