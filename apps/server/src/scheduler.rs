//! Background scheduler that periodically drains the job queue.
//!
//! Serverless-style deployments trigger `/sync-worker` externally; the
//! long-running server drains on a fixed interval instead. The interval is
//! server-configured, not user-configurable, to bound board API pressure.

use std::sync::Arc;

use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::main_lib::AppState;

/// Delay before the first tick, letting the server finish starting.
const INITIAL_DELAY_SECS: u64 = 30;

/// Starts the background sync drain loop.
pub fn start_sync_scheduler(state: Arc<AppState>) {
    tokio::spawn(async move {
        info!(
            "Sync scheduler started ({}s interval)",
            state.config.scheduler_interval_secs
        );

        tokio::time::sleep(Duration::from_secs(INITIAL_DELAY_SECS)).await;

        let mut tick = interval(Duration::from_secs(state.config.scheduler_interval_secs));
        loop {
            tick.tick().await;
            run_scheduled_drain(&state).await;
        }
    });
}

async fn run_scheduled_drain(state: &Arc<AppState>) {
    let report = state
        .worker
        .process_jobs(None, state.config.worker_max_jobs)
        .await;

    if report.processed == 0 {
        debug!("Scheduled drain: queue empty");
        return;
    }

    info!(
        "Scheduled drain processed {} job(s) (worker {})",
        report.processed, report.worker_id
    );
    for outcome in &report.results {
        if outcome.result == atelier_sync::worker::JobResultKind::Failed {
            warn!(
                "Job {} failed: {}",
                outcome.job_id,
                outcome.details.as_deref().unwrap_or("no details")
            );
        }
    }
}
