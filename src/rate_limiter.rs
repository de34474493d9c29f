/*!
 * Rate limiting for outbound vendor calls.
 *
 * A `RateLimiter` admits scheduled tasks strictly in FIFO order, starts at
 * most `qps` of them per second, and never starts the next task before the
 * current one settles. One limiter is shared by every caller of a vendor.
 */

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::future::BoxFuture;
use futures_util::FutureExt;
use log::{debug, error};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::errors::SchedulerError;

type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Single-flight, FIFO task scheduler capped at `qps` starts per second
pub struct RateLimiter {
    /// Minimum spacing between two task starts
    interval: Duration,

    /// Queue feeding the worker
    queue: mpsc::UnboundedSender<Job>,

    /// Receiver handed to the worker on first use
    pending_worker: Mutex<Option<mpsc::UnboundedReceiver<Job>>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("interval", &self.interval)
            .finish()
    }
}

impl RateLimiter {
    /// Create a limiter admitting `qps` task starts per second (minimum 1)
    pub fn new(qps: u32) -> Self {
        let qps = qps.max(1);
        let (queue, receiver) = mpsc::unbounded_channel();
        Self {
            interval: Duration::from_millis(1000 / u64::from(qps)),
            queue,
            pending_worker: Mutex::new(Some(receiver)),
        }
    }

    /// Minimum time between two task starts
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Queue `task` and resolve with its output once it has run.
    ///
    /// The task is enqueued when `schedule` is called, not when the returned
    /// future is first polled. Must be called from within a tokio runtime.
    pub fn schedule<F, Fut, T>(&self, task: F) -> impl Future<Output = Result<T, SchedulerError>> + Send + 'static
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.ensure_worker();

        let (result_tx, result_rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            async move {
                let output = task().await;
                let _ = result_tx.send(output);
            }
            .boxed()
        });

        let enqueued = self.queue.send(job).is_ok();
        async move {
            if !enqueued {
                return Err(SchedulerError::TaskDropped);
            }
            result_rx.await.map_err(|_| SchedulerError::TaskDropped)
        }
    }

    fn ensure_worker(&self) {
        if let Some(receiver) = self.pending_worker.lock().take() {
            tokio::spawn(run_queue(receiver, self.interval));
        }
    }
}

async fn run_queue(mut receiver: mpsc::UnboundedReceiver<Job>, interval: Duration) {
    let mut last_start: Option<Instant> = None;

    while let Some(job) = receiver.recv().await {
        if let Some(last) = last_start {
            tokio::time::sleep_until(last + interval).await;
        }
        last_start = Some(Instant::now());

        // A panicking task only loses its own result
        if AssertUnwindSafe(job()).catch_unwind().await.is_err() {
            error!("Rate-limited task panicked");
        }
    }

    debug!("Rate limiter queue closed");
}
