//! Matinee - dinner-show reservation back office
//!
//! Headless shell: opens the database (running migrations), then loops
//! over the maintenance passes the interactive screens rely on -
//! notification dispatch and the overdue-invoice sweep. The UI binds to
//! the view-model layer in this crate and is shipped separately.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use matinee_app::{AppConfig, AppState, LogMailer, Notifier};

fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Matinee");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = match AppState::new(config.clone()) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    let notifier = Notifier::new(
        app_state.db.clone(),
        Box::new(LogMailer),
        config.outbox_max_attempts,
        config.outbox_backoff_secs,
    );

    let interval = Duration::from_secs(config.maintenance_interval_secs.max(1));
    tracing::info!(interval_secs = interval.as_secs(), "Maintenance loop running");

    loop {
        let now = chrono::Utc::now();

        let stats = notifier.dispatch_due(now);
        if stats.sent + stats.retried + stats.gave_up > 0 {
            tracing::info!(
                sent = stats.sent,
                retried = stats.retried,
                gave_up = stats.gave_up,
                "Outbox pass"
            );
        }

        {
            let mut db = app_state.db.lock().unwrap();
            match matinee_core::billing::sweep_overdue(&mut db, now) {
                Ok(0) => {}
                Ok(moved) => tracing::info!(moved, "Invoices marked overdue"),
                Err(e) => tracing::warn!("Overdue sweep failed: {}", e),
            }
        }

        std::thread::sleep(interval);
    }
}
