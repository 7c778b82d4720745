use crate::dns::cache::ResolverCache;
use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

/// Periodically drops expired cache entries. Stops on its own once the
/// cache is gone.
pub(crate) fn spawn_cache_purge(cache: Weak<ResolverCache>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let Some(cache) = cache.upgrade() else {
                break;
            };
            let removed = cache.purge_expired();
            debug!(removed, remaining = cache.len(), "Cache housekeeping pass");
        }
    })
}
