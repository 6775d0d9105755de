//! Background forgetting.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use kindred_core::config::MemoryConfig;
use kindred_core::{DecayManager, MemoryStore};

/// Run a decay pass every `decay_interval_secs` until the handle is aborted.
///
/// Must be called from within a tokio runtime.
#[must_use = "dropping the handle detaches the task; abort it to stop decay"]
pub fn spawn_decay_task(store: Arc<dyn MemoryStore>, config: &MemoryConfig) -> JoinHandle<()> {
    spawn_decay_every(
        store,
        DecayManager::from_config(config),
        Duration::from_secs(config.decay_interval_secs.max(1)),
    )
}

/// Run `manager` over `store` every `period`. The first pass happens one
/// full period after spawning.
#[must_use = "dropping the handle detaches the task; abort it to stop decay"]
pub fn spawn_decay_every(
    store: Arc<dyn MemoryStore>,
    manager: DecayManager,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let store = store.clone();
            match tokio::task::spawn_blocking(move || manager.run_pass(store.as_ref())).await {
                Ok(Ok(report)) => debug!(
                    examined = report.examined,
                    decayed = report.decayed,
                    "Scheduled decay pass finished"
                ),
                Ok(Err(e)) => warn!(error = %e, "Scheduled decay pass failed"),
                Err(e) => warn!(error = %e, "Decay task panicked"),
            }
        }
    })
}
