//! Bounded worker pool for form jobs

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::engine::{run_job, EngineSettings};
use super::form::Form;
use super::results::JobResult;
use crate::error::ScannerError;
use crate::http::Transport;

/// One form to scan
#[derive(Debug, Clone)]
pub struct ScanJob {
    pub index: usize,
    pub form: Form,
    pub base_url: String,
}

/// Receiving side of the results queue
pub struct ResultStream {
    rx: mpsc::Receiver<JobResult>,
}

impl ResultStream {
    /// Next result, or `None` once the pool is closed and drained
    pub async fn next(&mut self) -> Option<JobResult> {
        self.rx.recv().await
    }

    /// Drain every remaining result
    pub async fn collect(mut self) -> Vec<JobResult> {
        let mut results = Vec::new();
        while let Some(result) = self.rx.recv().await {
            results.push(result);
        }
        results
    }
}

/// Fixed set of workers pulling jobs from a shared queue.
///
/// Both queues hold at most `2 * workers` entries, so `submit` waits while
/// the pool is saturated. Results must be drained concurrently with
/// submission.
pub struct WorkerPool {
    jobs: Option<mpsc::Sender<ScanJob>>,
    results_tx: Option<mpsc::Sender<JobResult>>,
    results_rx: Option<mpsc::Receiver<JobResult>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` tasks sharing `transport`
    pub fn start<T>(transport: Arc<T>, workers: usize, settings: Arc<EngineSettings>) -> Self
    where
        T: Transport + ?Sized + 'static,
    {
        let workers = workers.max(1);
        let capacity = workers * 2;
        let (job_tx, job_rx) = mpsc::channel::<ScanJob>(capacity);
        let (results_tx, results_rx) = mpsc::channel::<JobResult>(capacity);
        let job_rx = Arc::new(Mutex::new(job_rx));

        let handles = (0..workers)
            .map(|id| {
                let job_rx = job_rx.clone();
                let results_tx = results_tx.clone();
                let transport = transport.clone();
                let settings = settings.clone();

                tokio::spawn(
                    worker_loop(job_rx, results_tx, transport, settings)
                        .instrument(tracing::info_span!("worker", id)),
                )
            })
            .collect();

        tracing::debug!(workers, capacity, "Worker pool started");

        Self {
            jobs: Some(job_tx),
            results_tx: Some(results_tx),
            results_rx: Some(results_rx),
            workers: handles,
        }
    }

    /// Queue a job, waiting while the job queue is full
    pub async fn submit(&self, job: ScanJob) -> Result<(), ScannerError> {
        let jobs = self.jobs.as_ref().ok_or(ScannerError::PoolClosed)?;
        jobs.send(job).await.map_err(|_| ScannerError::PoolClosed)
    }

    /// Take the results queue. Only the first call returns it.
    pub fn drain(&mut self) -> Option<ResultStream> {
        self.results_rx.take().map(|rx| ResultStream { rx })
    }

    /// Stop accepting jobs and wait for the workers to finish.
    ///
    /// The results queue closes once the last worker exits.
    pub async fn close(mut self) {
        self.jobs.take();

        for handle in self.workers.drain(..) {
            if let Err(e) = handle.await {
                tracing::error!("Worker task ended abnormally: {}", e);
            }
        }

        self.results_tx.take();
        tracing::debug!("Worker pool closed");
    }
}

async fn worker_loop<T>(
    jobs: Arc<Mutex<mpsc::Receiver<ScanJob>>>,
    results: mpsc::Sender<JobResult>,
    transport: Arc<T>,
    settings: Arc<EngineSettings>,
) where
    T: Transport + ?Sized + 'static,
{
    loop {
        let job = { jobs.lock().await.recv().await };
        let Some(job) = job else {
            break;
        };

        let index = job.index;
        let form = job.form.clone();
        tracing::debug!(index, action = %form.action, "Processing form");

        // Run the job in its own task so a panic becomes an error result
        let task = {
            let transport = transport.clone();
            let settings = settings.clone();
            tokio::spawn(async move { run_job(transport.as_ref(), &settings, job).await }.in_current_span())
        };

        let result = match task.await {
            Ok(result) => result,
            Err(e) => {
                let err = ScannerError::WorkerFailed(e.to_string());
                tracing::error!(index, "{}", err);
                JobResult::failed(index, form, err.to_string())
            }
        };

        if results.send(result).await.is_err() {
            tracing::warn!("Results queue closed, stopping worker");
            break;
        }

        if !settings.rate_limit.is_zero() {
            tokio::time::sleep(settings.rate_limit).await;
        }
    }
}
