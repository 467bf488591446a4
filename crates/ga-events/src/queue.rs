//! Job queues and the dispatcher that feeds them.

use crate::config::Config;
use crate::transport::HttpTransport;
use crate::types::AnalyticsCall;
use crate::Error;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// Background job that delivers one hit.
#[derive(Debug, Clone)]
pub struct SendHitJob {
    call: AnalyticsCall,
}

impl SendHitJob {
    pub fn new(call: AnalyticsCall) -> Self {
        Self { call }
    }

    pub fn call(&self) -> &AnalyticsCall {
        &self.call
    }

    /// Perform the HTTP request.
    pub async fn handle(&self, transport: &HttpTransport) -> Result<(), Error> {
        transport.send(&self.call).await
    }
}

/// A queue system jobs are handed to. Pushing never waits on delivery.
pub trait JobQueue: Send + Sync {
    fn push(&self, queue: &str, job: SendHitJob) -> Result<(), Error>;
}

/// Hands built calls to a [`JobQueue`], unless broadcasting is disabled.
#[derive(Clone)]
pub struct Dispatcher {
    queue: Arc<dyn JobQueue>,
    enabled: bool,
    queue_name: String,
}

impl Dispatcher {
    pub fn new(config: &Config, queue: Arc<dyn JobQueue>) -> Self {
        Self {
            queue,
            enabled: config.is_enabled(),
            queue_name: config.queue_name().to_owned(),
        }
    }

    /// Queue the call. Returns `false` without queueing when disabled.
    pub fn dispatch(&self, call: AnalyticsCall) -> Result<bool, Error> {
        if !self.enabled {
            return Ok(false);
        }

        self.queue.push(&self.queue_name, SendHitJob::new(call))?;
        debug!(queue = %self.queue_name, "hit queued");
        Ok(true)
    }
}

/// Queue that only records pushed jobs.
///
/// Useful when the host drains jobs into its own worker system, and for
/// asserting what would have been sent.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    jobs: Mutex<Vec<(String, SendHitJob)>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take all recorded jobs with the queue they were pushed on.
    pub fn drain(&self) -> Vec<(String, SendHitJob)> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *jobs)
    }
}

impl JobQueue for MemoryQueue {
    fn push(&self, queue: &str, job: SendHitJob) -> Result<(), Error> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((queue.to_owned(), job));
        Ok(())
    }
}

/// How often a failed job is retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; grows linearly after that.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

struct Envelope {
    queue: String,
    job: SendHitJob,
}

/// In-process queue backed by a tokio task.
///
/// Every pushed job runs concurrently on the runtime. Creating one outside a
/// tokio runtime fails with [`Error::Config`].
pub struct TokioQueue {
    sender: Mutex<Option<mpsc::UnboundedSender<Envelope>>>,
    worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl TokioQueue {
    pub fn new(transport: HttpTransport, policy: RetryPolicy) -> Result<Self, Error> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            Error::Config(format!("job queue needs a tokio runtime: {e}"))
        })?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = runtime.spawn(run_worker(receiver, Arc::new(transport), policy));

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            worker: tokio::sync::Mutex::new(Some(worker)),
        })
    }

    /// Stop accepting jobs and wait for queued and in-flight ones to finish.
    pub async fn shutdown(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_none() {
            return; // Already shutdown
        }
        drop(sender);

        info!("draining job queue");
        if let Some(handle) = self.worker.lock().await.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "job worker panicked");
            }
        }
    }
}

impl JobQueue for TokioQueue {
    fn push(&self, queue: &str, job: SendHitJob) -> Result<(), Error> {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = guard.as_ref().ok_or(Error::Shutdown)?;
        sender
            .send(Envelope {
                queue: queue.to_owned(),
                job,
            })
            .map_err(|_| Error::Shutdown)
    }
}

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<Envelope>,
    transport: Arc<HttpTransport>,
    policy: RetryPolicy,
) {
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            next = receiver.recv() => match next {
                Some(envelope) => {
                    in_flight.spawn(run_job(envelope, transport.clone(), policy));
                }
                None => break,
            },
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                log_join_error(joined);
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        log_join_error(joined);
    }
}

fn log_join_error(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "hit delivery job panicked");
    }
}

async fn run_job(envelope: Envelope, transport: Arc<HttpTransport>, policy: RetryPolicy) {
    let Envelope { queue, job } = envelope;
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        match job.handle(&transport).await {
            Ok(()) => return,
            Err(e) if attempt < attempts => {
                warn!(queue = %queue, attempt, error = %e, "hit delivery failed, retrying");
                tokio::time::sleep(policy.backoff * attempt).await;
            }
            Err(e) => {
                error!(
                    queue = %queue,
                    attempt,
                    action = %job.call().event_action,
                    error = %e,
                    "hit delivery failed permanently"
                );
            }
        }
    }
}
