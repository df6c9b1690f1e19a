//! Background purge of expired grants.
//!
//! Readers already treat expired grants as absent; the reaper only reclaims
//! storage, so correctness never depends on it having run.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::stores::PersistedGrantStore;

/// Spawns the expired-grant sweep loop.
///
/// Runs until the returned handle is aborted. A failed sweep is logged and
/// retried on the next tick; it never takes the process down.
pub fn spawn_grant_reaper(store: PersistedGrantStore, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match store.remove_expired().await {
                Ok(0) => {}
                Ok(purged) => debug!(purged, "expired grants purged"),
                Err(err) => warn!(error = %err, "expired-grant sweep failed"),
            }
        }
    })
}
