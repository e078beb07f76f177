use std::future::Future;
use tokio::time::{self, Duration};

use crate::{state::PresenceStore, utils::clock::{Millis, SharedClock}};

pub const SWEEP_PERIOD: Duration = Duration::from_secs(30);
pub const STALE_AFTER_MS: Millis = 45_000;

/// 啟動清道夫：每 30 秒清掉逾時成員與空房間
pub async fn task(store: PresenceStore, clock: SharedClock) {
    every(SWEEP_PERIOD, "presence-sweep", move || {
        let (store, clock) = (store.clone(), clock.clone());
        async move { store.sweep(clock.now_ms(), STALE_AFTER_MS).await }
    })
    .await
}

/// Runs `job` on every tick. Each run is its own task, so a panic is logged
/// and the schedule keeps going.
pub async fn every<F, Fut>(period: Duration, name: &'static str, mut job: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut tick = time::interval(period);
    loop {
        tick.tick().await;
        if let Err(e) = tokio::spawn(job()).await {
            tracing::error!(task = name, error = %e, "periodic job failed");
        }
    }
}
