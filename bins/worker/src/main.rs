//! Velora requery worker.
//!
//! Periodically scans ledger entries pending longer than the configured
//! threshold, re-queries the transfer provider, and feeds the outcomes to
//! the settlement reconciler. Safe to run alongside any number of webhook
//! consumers: every transition is guarded at write time.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use velora_core::notify::{NotificationEvent, Notifier};
use velora_db::{connect, CounterpartyResolver, LedgerEngine};
use velora_providers::{build_transfer_provider, build_verification_provider, RestConfig};
use velora_shared::AppConfig;

/// Entries examined per sweep.
const SWEEP_LIMIT: u64 = 100;

/// Notifier that writes events to the log stream.
///
/// Delivery is fire-and-forget by contract, so logging is a legitimate
/// sink for a worker process.
struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: NotificationEvent) {
        info!(?event, "notification");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "velora=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Build providers from the closed provider-kind enums
    let transfer_kind = config
        .providers
        .transfer
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let verification_kind = config
        .providers
        .verification
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let rest = RestConfig {
        base_url: config.providers.base_url.clone().unwrap_or_default(),
        secret: config.providers.secret.clone().unwrap_or_default(),
    };

    let transfer_provider = build_transfer_provider(transfer_kind, rest.clone());
    let verification_provider = build_verification_provider(verification_kind, rest);

    let resolver = CounterpartyResolver::new(db.clone(), verification_provider);
    let engine = LedgerEngine::new(
        db,
        transfer_provider,
        resolver,
        Arc::new(LogNotifier),
        config.reconciler.clone(),
    );

    info!(
        poll_interval_secs = config.reconciler.poll_interval_secs,
        requery_after_secs = config.reconciler.requery_after_secs,
        "Requery worker started"
    );

    let mut ticker =
        tokio::time::interval(std::time::Duration::from_secs(config.reconciler.poll_interval_secs));
    loop {
        ticker.tick().await;

        match engine.requery_pending(SWEEP_LIMIT).await {
            Ok(0) => {}
            Ok(count) => info!(count, "requery sweep complete"),
            Err(e) => {
                // The sweep retries on the next tick; surfacing the error
                // is what keeps stuck entries visible to operators.
                if let velora_db::EngineError::Settlement(se) = &e {
                    if !se.is_retryable() {
                        warn!(error = %se, "non-retryable settlement error during sweep");
                        continue;
                    }
                }
                error!(error = %e, "requery sweep failed");
            }
        }
    }
}
