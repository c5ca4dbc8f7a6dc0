use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::motive::{MotiveMaker, PreparedMotive};

/// Bounded FIFO of prepared motives. Each pop hands a motive to exactly one caller.
pub struct PrefetchQueue {
    rx: Mutex<Receiver<PreparedMotive>>,
}

/// Create the producer handle and the shared consumer queue.
#[must_use]
pub fn channel(capacity: usize) -> (Sender<PreparedMotive>, PrefetchQueue) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (tx, PrefetchQueue { rx: Mutex::new(rx) })
}

impl PrefetchQueue {
    /// Wait for the next motive.
    ///
    /// # Errors
    /// [`Error::PrefetchClosed`] once the producer is gone and the queue drained.
    pub async fn pop(&self) -> Result<PreparedMotive, Error> {
        self.rx.lock().await.recv().await.ok_or(Error::PrefetchClosed)
    }

    /// Like [`PrefetchQueue::pop`], giving up after `wait` when one is set.
    ///
    /// # Errors
    /// [`Error::PrefetchTimeout`] when the wait elapses first.
    pub async fn pop_within(&self, wait: Option<Duration>) -> Result<PreparedMotive, Error> {
        match wait {
            Some(wait) => timeout(wait, self.pop())
                .await
                .map_err(|_| Error::PrefetchTimeout(wait))?,
            None => self.pop().await,
        }
    }
}

/// Exponential delay between failed producer iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Backoff {
    #[must_use]
    pub fn next(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(60),
        }
    }
}

/// Keeps the prefetch queue topped up.
///
/// Rules:
/// - One motive is searched at a time; the send parks while the queue is full.
/// - A failed search is logged and retried on a fresh theme after a backoff
///   that doubles up to `backoff.max` and resets after a success.
/// - The loop ends on cancellation or when every consumer is gone.
pub async fn run(
    maker: Arc<MotiveMaker>,
    to_web: Sender<PreparedMotive>,
    cancel: CancellationToken,
    backoff: Backoff,
) -> Result<()> {
    let mut delay = backoff.initial;
    loop {
        let made = select! {
            _ = cancel.cancelled() => break,
            made = maker.make() => made,
        };
        match made {
            Ok(motive) => {
                delay = backoff.initial;
                select! {
                    _ = cancel.cancelled() => break,
                    sent = to_web.send(motive) => {
                        if sent.is_err() {
                            warn!("prefetch queue closed");
                            break;
                        }
                        debug!("prefetched motive queued");
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, retry_in = ?delay, "motive search failed; backing off");
                select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(delay) => {}
                }
                delay = backoff.next(delay);
            }
        }
    }
    info!("prefetch producer stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let backoff = Backoff {
            initial: Duration::from_millis(100),
            max: Duration::from_millis(350),
        };
        let second = backoff.next(backoff.initial);
        assert_eq!(second, Duration::from_millis(200));
        assert_eq!(backoff.next(second), Duration::from_millis(350));
        assert_eq!(backoff.next(Duration::from_millis(350)), Duration::from_millis(350));
    }
}
