//! Background sweep and keep-alive task.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::config::RealtimeConfig;
use crate::dispatcher::Dispatcher;

/// Spawn the maintenance loop. It runs until the returned handle is aborted.
pub fn spawn_maintenance(dispatcher: Dispatcher, config: &RealtimeConfig) -> JoinHandle<()> {
    let sweep_every = config.sweep_interval();
    let stale_after = config.stale_after();
    let heartbeat_every = config.heartbeat_interval();

    tokio::spawn(async move {
        tracing::debug!(
            sweep_interval_secs = sweep_every.as_secs(),
            stale_after_secs = stale_after.as_secs(),
            heartbeat = heartbeat_every.is_some(),
            "Realtime maintenance started"
        );

        let mut sweep = delayed_interval(sweep_every);
        let mut heartbeat = heartbeat_every.map(delayed_interval);

        loop {
            tokio::select! {
                _ = sweep.tick() => {
                    let evicted = dispatcher.registry().sweep_stale(stale_after);
                    if evicted > 0 {
                        tracing::debug!(
                            evicted,
                            remaining = dispatcher.registry().len(),
                            "Stale connection sweep"
                        );
                    }
                }
                _ = next_tick(&mut heartbeat) => {
                    dispatcher.heartbeat().await;
                }
            }
        }
    })
}

/// Interval whose first tick is one period from now.
fn delayed_interval(period: Duration) -> Interval {
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticks
}

async fn next_tick(ticks: &mut Option<Interval>) {
    match ticks {
        Some(ticks) => {
            ticks.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::KEEP_ALIVE_FRAME;
    use crate::registry::ConnectionRegistry;
    use crate::sink::ChannelSink;
    use std::sync::Arc;

    fn config(heartbeat_interval_secs: u64) -> RealtimeConfig {
        RealtimeConfig {
            sweep_interval_secs: 60,
            stale_after_secs: 300,
            heartbeat_interval_secs,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_evicts_silent_connection() {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = Dispatcher::new(registry.clone(), &config(0));
        let (sink, _rx) = ChannelSink::new(8);
        let stale_at = chrono::Utc::now() - chrono::Duration::minutes(10);
        let id = registry.register_at("b1", "u1", sink, stale_at);

        let handle = spawn_maintenance(dispatcher, &config(0));
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(registry.get(&id).is_none());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_writes_keep_alive() {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = Dispatcher::new(registry.clone(), &config(30));
        let (sink, mut rx) = ChannelSink::new(8);
        registry.register("b1", "u1", sink);

        let handle = spawn_maintenance(dispatcher, &config(30));
        let frame = rx.recv().await.unwrap();
        assert_eq!(&frame[..], KEEP_ALIVE_FRAME);
        handle.abort();
    }
}
