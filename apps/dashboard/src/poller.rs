//! Cancellable polling loops.
//!
//! Each dashboard owns its pollers as explicit handles instead of
//! ambient timers: cancellation is a token the loop (and every tick
//! body) can observe, and dropping a handle stops its loop.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct PollHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Spawns a loop that runs `tick` once immediately and then every
    /// `period` until the handle is shut down or dropped.
    ///
    /// Ticks never overlap: the loop awaits each tick body before
    /// waiting for the next interval, and missed ticks are skipped
    /// rather than queued, so a slow network cannot build a backlog.
    ///
    /// The tick body receives the loop's cancellation token so a fetch
    /// that completes after cancellation can discard its result instead
    /// of mutating state the owner already tore down.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let loop_token = token.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = ticker.tick() => tick(loop_token.clone()).await,
                }
            }
            debug!("Poller '{name}' stopped");
        });
        Self {
            token,
            task: Some(task),
        }
    }

    /// Cancels the loop and waits for the task to wind down. A tick in
    /// flight is allowed to finish; its result is discarded by the
    /// token guard.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        // The owning view is gone; make sure the loop cannot outlive it.
        self.token.cancel();
    }
}
