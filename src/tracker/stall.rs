use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// One-shot timer that reports a run as stalled once its delay elapses.
///
/// Cancelling (or dropping) the timer before it fires discards it. The fire
/// callback receives the timer's token so it can re-check cancellation after
/// acquiring whatever lock orders it against settlement.
#[derive(Debug)]
pub(crate) struct StallTimer {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl StallTimer {
    pub(crate) fn arm<F>(delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce(&CancellationToken) + Send + 'static,
    {
        let deadline = Instant::now() + delay;
        let token = CancellationToken::new();
        let timer_token = token.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = timer_token.cancelled() => {}
                _ = sleep_until(deadline) => on_fire(&timer_token),
            }
        });

        Self { token, handle }
    }

    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for StallTimer {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
