//! Bounded worker pool driving the job state machine.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::domains::function::{FunctionRepository, RepositoryError as FnRepoError};
use crate::domains::job::{JobRepository, JobStatus, RepositoryError as JobRepoError};

use super::runner::Runner;

#[derive(Debug, Clone, Copy)]
pub struct ExecRequest {
    pub job_id: Uuid,
    pub function_id: Uuid,
}

/// Bounded-concurrency executor: one unbuffered handoff channel, `N`
/// long-lived workers, a broadcast shutdown signal. `Enqueue` blocks when
/// every worker is busy — callers experience backpressure, not a queue.
pub struct Executor {
    job_repo: Arc<dyn JobRepository>,
    function_repo: Arc<dyn FunctionRepository>,
    runner: Arc<dyn Runner>,
    sender: mpsc::Sender<ExecRequest>,
    receiver: tokio::sync::Mutex<Option<mpsc::Receiver<ExecRequest>>>,
    shutdown: broadcast::Sender<()>,
    workers: usize,
}

impl Executor {
    pub fn new(
        job_repo: Arc<dyn JobRepository>,
        function_repo: Arc<dyn FunctionRepository>,
        runner: Arc<dyn Runner>,
        workers: usize,
    ) -> Self {
        // tokio::sync::mpsc has no true zero-capacity rendezvous channel;
        // capacity 1 is the closest approximation of the reference's
        // unbuffered handoff and still backpressures once a worker's slot
        // is occupied.
        let (sender, receiver) = mpsc::channel(1);
        let (shutdown, _) = broadcast::channel(workers.max(1));
        Self {
            job_repo,
            function_repo,
            runner,
            sender,
            receiver: tokio::sync::Mutex::new(Some(receiver)),
            shutdown,
            workers,
        }
    }

    /// Sweeps jobs stranded in `running` (e.g. by a crash between
    /// `mark_running` and the next persist) to `error`. Call once at
    /// startup, before [`Executor::start`].
    pub async fn recover_stranded_jobs(&self) -> Result<usize, JobRepoError> {
        let stranded = self.job_repo.list_running().await?;
        let count = stranded.len();
        for mut job in stranded {
            job.mark_error("job interrupted by restart");
            self.job_repo.update(&job).await?;
        }
        Ok(count)
    }

    pub fn start(self: &Arc<Self>) {
        let receiver = self
            .receiver
            .try_lock()
            .expect("start() called concurrently with itself")
            .take()
            .expect("start() called more than once");

        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        for worker_id in 0..self.workers {
            let this = Arc::clone(self);
            let receiver = Arc::clone(&receiver);
            let mut shutdown = this.shutdown.subscribe();
            tokio::spawn(async move {
                loop {
                    let next = {
                        let mut guard = receiver.lock().await;
                        tokio::select! {
                            req = guard.recv() => req,
                            _ = shutdown.recv() => None,
                        }
                    };
                    match next {
                        Some(req) => {
                            if let Err(err) = this.process_request(req).await {
                                tracing::error!(worker_id, %err, "error processing request");
                            }
                        }
                        None => break,
                    }
                }
            });
        }
    }

    pub fn stop(&self) {
        let _ = self.shutdown.send(());
    }

    pub async fn enqueue(&self, req: ExecRequest) {
        // Unbuffered handoff: blocks until a worker is receiving.
        let _ = self.sender.send(req).await;
    }

    async fn process_request(&self, req: ExecRequest) -> Result<(), ProcessError> {
        let mut job = self.job_repo.get_by_id(req.job_id).await?;

        job.mark_running();
        self.job_repo.update(&job).await?;

        let function = match self.function_repo.get_by_id(req.function_id).await {
            Ok(function) => function,
            Err(FnRepoError::NotFound) => {
                job.mark_error("function not found");
                self.job_repo.update(&job).await?;
                return Ok(());
            }
            Err(err) => return Err(ProcessError::Function(err)),
        };

        // The deadline is enforced inside `runner.run` itself (scoped around
        // just the container-wait step), so the `_ = remove_container(...)`
        // cleanup that follows it there always runs, timeout or not. Wrapping
        // this call in a second, outer timeout here would let this future
        // race ahead and drop `runner.run` mid-flight, skipping that cleanup
        // and leaking the container.
        match self.runner.run(&function).await {
            Err(err) => {
                job.mark_error(err.to_string());
            }
            Ok(transcript) => {
                job.mark_done(transcript);
            }
        }

        self.job_repo.update(&job).await?;
        debug_assert!(matches!(job.status, JobStatus::Done | JobStatus::Error));
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
enum ProcessError {
    #[error("job repository error: {0}")]
    Job(#[from] JobRepoError),
    #[error("function repository error: {0}")]
    Function(FnRepoError),
}
