//! Periodic heartbeat so idle connections are not dropped by proxies

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

use crate::hub::Hub;

/// Handle to the background keep-alive task
pub struct KeepAlive {
    handle: JoinHandle<()>,
    shutdown: CancellationToken,
}

impl KeepAlive {
    /// Start the task with the hub's configured interval
    pub fn start(hub: Arc<Hub>) -> Self {
        let interval = hub.config().keep_alive_interval;
        Self::spawn(hub, interval)
    }

    /// Start the task with an explicit interval. The first heartbeat goes
    /// out one full interval after start.
    pub fn spawn(hub: Arc<Hub>, interval: Duration) -> Self {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let handle = tokio::spawn(async move {
            info!(interval = ?interval, "Keep-alive started");

            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let id = hub.keep_alive().await;
                        trace!(event_id = %id, listeners = hub.listener_count(), "Keep-alive sent");
                    }
                }
            }

            info!("Keep-alive stopped");
        });

        Self { handle, shutdown }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the task, waiting up to `grace` for the current tick to finish.
    ///
    /// Returns `true` if the task stopped on its own, `false` if it had to be
    /// aborted or had panicked.
    pub async fn shutdown(mut self, grace: Duration) -> bool {
        self.shutdown.cancel();
        match tokio::time::timeout(grace, &mut self.handle).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(error = %e, "Keep-alive task panicked");
                false
            }
            Err(_) => {
                warn!(grace = ?grace, "Keep-alive did not stop in time, aborting");
                self.handle.abort();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HubConfig;
    use crate::event::{EventId, RecipientId};
    use crate::listener::ChannelListener;

    fn hub() -> Arc<Hub> {
        Arc::new(Hub::new(HubConfig::default()).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeats_reach_listeners_each_interval() {
        let hub = hub();
        let (listener, mut rx) = ChannelListener::new();
        hub.subscribe(RecipientId::from("u1"), listener, None).await;

        let keep_alive = KeepAlive::spawn(Arc::clone(&hub), Duration::from_secs(2));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(first.is_keep_alive());
        assert!(second.is_keep_alive());
        assert!(first.payload.is_none());
        assert!(first.id < second.id);

        assert!(keep_alive.shutdown(Duration::from_secs(1)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeats_are_never_replayed() {
        let hub = hub();
        let keep_alive = KeepAlive::start(Arc::clone(&hub));

        tokio::time::sleep(Duration::from_secs(7)).await;
        assert!(keep_alive.shutdown(Duration::from_secs(1)).await);

        assert!(hub.last_event_id().await >= EventId::new(3));
        assert!(hub.since(EventId::ZERO, &"u1".into()).await.is_empty());
        assert_eq!(hub.buffered_events().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_task() {
        let hub = hub();
        let keep_alive = KeepAlive::spawn(Arc::clone(&hub), Duration::from_secs(2));
        assert!(keep_alive.is_running());

        assert!(keep_alive.shutdown(Duration::from_secs(1)).await);

        let before = hub.last_event_id().await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(hub.last_event_id().await, before);
    }
}
