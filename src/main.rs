//! tender-notifier — one-shot entrypoint.
//! Loads config, scrapes each configured listing, emails new keyword matches
//! and persists the match store. Schedule it externally (cron, systemd timer).

use std::process::ExitCode;

use tender_notifier::config::load_config_default;
use tender_notifier::{extract, notify, run_once, StoreError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default; `LOG_FORMAT=json` for JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tender_notifier=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    // Only storage failures change the exit code; a run that cannot start
    // is logged and ends like any other degraded run.
    let config = match load_config_default() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config: {e}");
            return ExitCode::SUCCESS;
        }
    };
    let extractor = match extract::from_config(&config) {
        Ok(x) => x,
        Err(e) => {
            tracing::error!("config: {e:#}");
            return ExitCode::SUCCESS;
        }
    };
    let notifier = notify::from_env();

    match run_once(&config, extractor.as_ref(), notifier.as_ref()).await {
        Ok(report) => {
            tracing::debug!(?report, "run report");
            ExitCode::SUCCESS
        }
        Err(e @ StoreError::Corrupt { .. }) => {
            tracing::error!(
                "{e}; fix or remove the file, or set reset_on_corrupt = true"
            );
            ExitCode::from(e.exit_code())
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
