use crate::types::{GenerationRequest, SubmitAck, ToolJobKind, ToolJobStatus};
use indexmap::IndexMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

const TRAINING_POLL_MS: u64 = 2000;
const STEM_SPLIT_POLL_MS: u64 = 1000;
const MODEL_DOWNLOAD_POLL_MS: u64 = 1500;

pub fn poll_interval(kind: ToolJobKind) -> Duration {
    let millis = match kind {
        ToolJobKind::Training => TRAINING_POLL_MS,
        ToolJobKind::StemSplit => STEM_SPLIT_POLL_MS,
        ToolJobKind::ModelDownload => MODEL_DOWNLOAD_POLL_MS,
    };
    Duration::from_millis(millis)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolJobState {
    Idle,
    Submitting,
    Running,
    Paused,
    Completed,
    Cancelled,
    Failed,
}

impl ToolJobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    pub fn is_polling(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

/// Client-side mirror of one long-running tool job. Mutated only by the
/// submission flow and by the poll loop folding worker statuses in.
#[derive(Debug, Clone)]
pub struct ToolJob {
    pub kind: ToolJobKind,
    pub state: ToolJobState,
    pub progress: Option<f32>,
    pub message: String,
    pub returncode: Option<i64>,
}

impl ToolJob {
    pub fn new(kind: ToolJobKind) -> Self {
        Self {
            kind,
            state: ToolJobState::Idle,
            progress: None,
            message: String::new(),
            returncode: None,
        }
    }

    /// Entering the submission flow resets whatever a previous run left
    /// behind.
    pub fn mark_submitting(&mut self) {
        self.state = ToolJobState::Submitting;
        self.progress = None;
        self.message = String::new();
        self.returncode = None;
    }

    pub fn mark_running(&mut self) {
        self.state = ToolJobState::Running;
    }

    pub fn mark_cancelled(&mut self) {
        self.state = ToolJobState::Cancelled;
    }

    /// Folds one polled status into the job. Returns true once the job is
    /// terminal; a status arriving after that is stale and ignored.
    pub fn apply_status(&mut self, status: &ToolJobStatus) -> bool {
        if self.state.is_terminal() {
            return true;
        }

        if let Some(fraction) = status.progress_fraction() {
            self.progress = Some(fraction);
        }
        if !status.last_message.is_empty() {
            self.message = status.last_message.clone();
        }
        self.returncode = status.returncode;

        if let Some(failure) = status.failure() {
            self.state = ToolJobState::Failed;
            self.message = failure;
            return true;
        }
        if !status.running {
            self.state = ToolJobState::Completed;
            return true;
        }

        self.state =
            if status.paused { ToolJobState::Paused } else { ToolJobState::Running };
        false
    }
}

/// The poller's view of the worker. `api::Client` is the production
/// implementation; tests substitute an in-memory fake.
pub trait ToolBackend: Send + Sync + 'static {
    fn tool_status(
        &self,
        kind: ToolJobKind,
    ) -> impl Future<Output = anyhow::Result<ToolJobStatus>> + Send;

    fn cancel_tool(&self, kind: ToolJobKind) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn pause_training(&self) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn resume_training(&self) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Owns the poll loop for one tool job, independent of any rendering
/// framework. The loop runs only while the job is in a polling state and is
/// torn down exactly once, whether it stops itself on a terminal status or
/// is stopped from outside.
#[derive(Debug)]
pub struct PollHandle {
    job: Arc<Mutex<ToolJob>>,
    stop_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn new(kind: ToolJobKind) -> Self {
        Self { job: Arc::new(Mutex::new(ToolJob::new(kind))), stop_tx: None, task: None }
    }

    pub fn kind(&self) -> ToolJobKind {
        lock(&self.job).kind
    }

    /// Snapshot of the job for rendering.
    pub fn job(&self) -> ToolJob {
        lock(&self.job).clone()
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn begin_submit(&self) {
        lock(&self.job).mark_submitting();
    }

    pub fn mark_failed(&self, message: impl Into<String>) {
        let mut job = lock(&self.job);
        job.state = ToolJobState::Failed;
        job.message = message.into();
    }

    /// Starts the poll loop once the worker has acknowledged the job.
    /// Restarting an already-active handle is a no-op.
    pub fn start<B: ToolBackend>(&mut self, backend: Arc<B>) {
        if self.is_active() {
            return;
        }
        self.stop_tx = None;
        self.task = None;

        let kind = {
            let mut job = lock(&self.job);
            job.mark_running();
            job.kind
        };

        let (stop_tx, stop_rx) = watch::channel(false);
        let job = Arc::clone(&self.job);
        let every = poll_interval(kind);
        self.task = Some(tokio::spawn(poll_loop(backend, job, kind, every, stop_rx)));
        self.stop_tx = Some(stop_tx);
    }

    /// Tears the poll loop down. Safe to call repeatedly; only the first
    /// call after a start does anything.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Cancels the job. A job the worker has not acknowledged yet is
    /// cancelled locally; otherwise the worker is told first and local state
    /// flips to Cancelled as soon as it accepts, without waiting for the
    /// next poll tick.
    pub async fn cancel<B: ToolBackend>(&mut self, backend: &B) -> anyhow::Result<()> {
        let (kind, state) = {
            let job = lock(&self.job);
            (job.kind, job.state)
        };

        if state.is_polling() {
            backend.cancel_tool(kind).await?;
        }
        lock(&self.job).mark_cancelled();
        self.stop();
        Ok(())
    }

    /// Training-only: asks the worker to pause and reflects it locally.
    pub async fn pause<B: ToolBackend>(&self, backend: &B) -> anyhow::Result<()> {
        backend.pause_training().await?;
        let mut job = lock(&self.job);
        if job.state == ToolJobState::Running {
            job.state = ToolJobState::Paused;
        }
        Ok(())
    }

    pub async fn resume<B: ToolBackend>(&self, backend: &B) -> anyhow::Result<()> {
        backend.resume_training().await?;
        let mut job = lock(&self.job);
        if job.state == ToolJobState::Paused {
            job.state = ToolJobState::Running;
        }
        Ok(())
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop<B: ToolBackend>(
    backend: Arc<B>,
    job: Arc<Mutex<ToolJob>>,
    kind: ToolJobKind,
    every: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    // One status request at a time; a slow response delays the next tick
    // instead of queueing a burst behind it.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stop_rx.changed() => break,
        }

        let status = match backend.tool_status(kind).await {
            Ok(status) => status,
            Err(err) => {
                // Transient poll failures are retried on the next tick.
                warn!("{} status poll failed: {err:#}", kind.label());
                continue;
            }
        };

        if *stop_rx.borrow() {
            // The job was stopped while this response was in flight.
            break;
        }

        if lock(&job).apply_status(&status) {
            debug!("{} job reached terminal state, poll loop exiting", kind.label());
            break;
        }
    }
}

fn lock(job: &Arc<Mutex<ToolJob>>) -> MutexGuard<'_, ToolJob> {
    job.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
pub struct SubmittedJob {
    pub request: GenerationRequest,
    pub ack: SubmitAck,
}

/// Outstanding generation jobs in submission order.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: IndexMap<String, SubmittedJob>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, ack: SubmitAck, request: GenerationRequest) {
        self.jobs.insert(ack.job_id.clone(), SubmittedJob { request, ack });
    }

    pub fn get(&self, job_id: &str) -> Option<&SubmittedJob> {
        self.jobs.get(job_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SubmittedJob)> {
        self.jobs.iter()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
