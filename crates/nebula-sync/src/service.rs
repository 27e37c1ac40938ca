//! Wires validated settings into a [`Synchronizer`] and drives it: one run
//! up front, then the cron loop when a schedule is configured.

use std::sync::Arc;

use tracing::{debug, info};

use nebula_api::SessionClient;
use nebula_config::Settings;
use nebula_core::{SyncState, Synchronizer, WebhookNotifier};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::{schedule, server};

pub async fn run(args: RunArgs) -> Result<(), CliError> {
    info!(version = env!("CARGO_PKG_VERSION"), "starting nebula-sync");

    let settings = nebula_config::load(args.config.as_deref())?;
    debug!(?settings, "loaded settings");

    let state = Arc::new(SyncState::new());
    let synchronizer = build_synchronizer(&settings, Arc::clone(&state))?;

    // Nothing to probe when the process exits after a single run.
    if settings.schedule.is_some() && settings.api.enabled {
        server::spawn(settings.api.port, Arc::clone(&state)).await?;
    }

    synchronizer.run().await?;

    let Some(cron) = settings.schedule else {
        return Ok(());
    };

    tokio::select! {
        () = schedule::run_scheduled(&synchronizer, &cron) => {}
        _ = tokio::signal::ctrl_c() => info!("received shutdown signal"),
    }
    Ok(())
}

/// One shared HTTP client for every appliance; the state tracker is
/// notified before the webhook.
fn build_synchronizer(settings: &Settings, state: Arc<SyncState>) -> Result<Synchronizer, CliError> {
    let http = settings.client.transport().build_client()?;

    let primary = SessionClient::with_client(http.clone(), settings.primary.clone());
    let replicas = settings
        .replicas
        .iter()
        .cloned()
        .map(|appliance| SessionClient::with_client(http.clone(), appliance))
        .collect();

    let notifier = WebhookNotifier::new(settings.webhook.clone())?;

    Ok(Synchronizer::new(
        primary,
        replicas,
        settings.plan.clone(),
        settings.client.retry_policy(),
    )
    .with_callback(state)
    .with_callback(Arc::new(notifier)))
}
