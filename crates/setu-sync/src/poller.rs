//! Fixed-interval polling tasks.
//!
//! Each open view owns its pollers; they are independent, not
//! globally coordinated. A tick performs a full fetch and replaces
//! the relevant store slice. A failed tick is logged and the next
//! tick proceeds; transient failures are retried only by virtue of
//! the schedule. Cancelling the token drops any tick in flight, so a
//! closed view can never publish state afterwards.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use setu_net::NetError;

/// Spawn a polling task. The first tick fires immediately.
pub fn spawn_poller<F, Fut>(
    name: &'static str,
    period: Duration,
    cancel: CancellationToken,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), NetError>> + Send,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            // Racing the tick against the token drops the in-flight
            // future on cancellation before it can apply anything.
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = tick() => {
                    if let Err(e) = result {
                        warn!(poller = name, error = %e, "Poll tick failed");
                    }
                }
            }
        }

        debug!(poller = name, "Poller stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn first_tick_fires_immediately() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let cancel = CancellationToken::new();

        spawn_poller("test", Duration::from_secs(2), cancel.clone(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_repeat_on_the_period() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let cancel = CancellationToken::new();

        spawn_poller("test", Duration::from_secs(2), cancel.clone(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        tokio::time::sleep(Duration::from_millis(6100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4);
        cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn a_failed_tick_does_not_stop_the_schedule() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let cancel = CancellationToken::new();

        spawn_poller("test", Duration::from_secs(2), cancel.clone(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(NetError::Status(503))
            }
        });

        tokio::time::sleep(Duration::from_millis(4100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_future_ticks() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let cancel = CancellationToken::new();

        let handle = spawn_poller("test", Duration::from_secs(2), cancel.clone(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        tokio::time::sleep(Duration::from_millis(1)).await;
        cancel.cancel();
        let seen = count.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), seen);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_drops_a_tick_in_flight() {
        let applied = Arc::new(AtomicUsize::new(0));
        let state = applied.clone();
        let cancel = CancellationToken::new();

        spawn_poller("test", Duration::from_secs(2), cancel.clone(), move || {
            let state = state.clone();
            async move {
                // Simulates a slow fetch resolving after view teardown.
                tokio::time::sleep(Duration::from_secs(10)).await;
                state.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        // Let the first tick start, then tear the view down.
        tokio::time::sleep(Duration::from_millis(1)).await;
        cancel.cancel();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(applied.load(Ordering::SeqCst), 0);
    }
}
