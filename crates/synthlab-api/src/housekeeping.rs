//! Periodic background work.

use std::future::Future;
use std::time::Duration;

use synthlab_store::pg_revocation_store::PgRevocationStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Runs `task` every `every` until `shutdown` flips to `true` or its sender
/// is dropped. The first run happens immediately.
pub fn spawn_interval_until<F, Fut>(
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut task: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => task().await,
            }
        }
    })
}

/// Deletes expired revocation records on a fixed interval.
pub fn spawn_revocation_purge(
    store: PgRevocationStore,
    every: Duration,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    spawn_interval_until(every, shutdown, move || {
        let store = store.clone();
        async move {
            match store.purge_expired().await {
                Ok(0) => debug!("no expired revocations"),
                Ok(purged) => info!(purged, "purged expired revocations"),
                Err(err) => warn!(error = %err, "revocation purge failed"),
            }
        }
    })
}
