//! Scan engine orchestration

use std::sync::Arc;
use std::time::Duration;

use super::detector::Detector;
use super::form::Form;
use super::payloads::VulnClass;
use super::pool::{ScanJob, WorkerPool};
use super::results::JobResult;
use super::sweep::Sweeper;
use crate::app::Config;
use crate::http::Transport;

/// Everything a job needs besides the transport
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub detector: Detector,

    /// Pause after each job phase
    pub rate_limit: Duration,

    /// Pause between probes inside a sweep
    pub probe_delay: Duration,

    pub excerpt_len: usize,
    pub workers: usize,

    /// Form counts at or below this skip the pool
    pub sequential_threshold: usize,

    pub run_xss: bool,
    pub run_sqli: bool,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            detector: Detector::new(&config.detection),
            rate_limit: config.scanner.rate_limit(),
            probe_delay: config.scanner.probe_delay(),
            excerpt_len: config.detection.excerpt_len,
            workers: config.scanner.workers,
            sequential_threshold: config.scanner.sequential_threshold,
            run_xss: config.checks.xss,
            run_sqli: config.checks.sqli,
        }
    }

    /// Default settings with every delay removed
    #[cfg(test)]
    pub fn immediate() -> Self {
        let mut settings = Self::from_config(&Config::default());
        settings.rate_limit = Duration::ZERO;
        settings.probe_delay = Duration::ZERO;
        settings
    }

    pub fn sweeper<'a, T: Transport + ?Sized>(&'a self, transport: &'a T) -> Sweeper<'a, T> {
        Sweeper::new(transport, &self.detector, self.probe_delay, self.excerpt_len)
    }

    fn runs_sequentially(&self, form_count: usize) -> bool {
        self.workers <= 1 || form_count <= self.sequential_threshold
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Process one form: XSS sweep, pause, SQLi sweep.
///
/// Shared by the pooled and sequential paths.
pub async fn run_job<T: Transport + ?Sized>(transport: &T, settings: &EngineSettings, job: ScanJob) -> JobResult {
    let sweeper = settings.sweeper(transport);

    let xss_results = if settings.run_xss {
        sweeper.sweep_form(&job.form, &job.base_url, VulnClass::Xss).await
    } else {
        Vec::new()
    };

    pause(settings.rate_limit).await;

    let sqli_results = if settings.run_sqli {
        sweeper.sweep_form(&job.form, &job.base_url, VulnClass::Sqli).await
    } else {
        Vec::new()
    };

    let result = JobResult::new(job.index, job.form, xss_results, sqli_results);
    tracing::info!(
        index = result.index,
        xss = result.xss_vulnerable,
        sqli = result.sqli_vulnerable,
        "Form scanned"
    );
    result
}

/// Scan every form, returning results in discovery order
pub async fn scan_forms<T>(transport: Arc<T>, forms: &[Form], base_url: &str, settings: EngineSettings) -> Vec<JobResult>
where
    T: Transport + ?Sized + 'static,
{
    let jobs: Vec<ScanJob> = forms
        .iter()
        .enumerate()
        .map(|(index, form)| ScanJob {
            index,
            form: form.clone(),
            base_url: base_url.to_string(),
        })
        .collect();

    if jobs.is_empty() {
        return Vec::new();
    }

    let mut results = if settings.runs_sequentially(jobs.len()) {
        tracing::info!(forms = jobs.len(), "Scanning sequentially");
        scan_sequential(transport.as_ref(), jobs, &settings).await
    } else {
        tracing::info!(forms = jobs.len(), workers = settings.workers, "Scanning with worker pool");
        scan_pooled(transport, jobs, settings).await
    };

    results.sort_by_key(|r| r.index);
    results
}

async fn scan_sequential<T: Transport + ?Sized>(
    transport: &T,
    jobs: Vec<ScanJob>,
    settings: &EngineSettings,
) -> Vec<JobResult> {
    let mut results = Vec::with_capacity(jobs.len());
    for job in jobs {
        results.push(run_job(transport, settings, job).await);
        pause(settings.rate_limit).await;
    }
    results
}

async fn scan_pooled<T>(transport: Arc<T>, jobs: Vec<ScanJob>, settings: EngineSettings) -> Vec<JobResult>
where
    T: Transport + ?Sized + 'static,
{
    let expected = jobs.len();
    let workers = settings.workers;
    let mut pool = WorkerPool::start(transport, workers, Arc::new(settings));
    let Some(mut stream) = pool.drain() else {
        pool.close().await;
        return Vec::new();
    };

    // Submit from a separate task so the bounded queues never deadlock
    let submitter = tokio::spawn(async move {
        for job in jobs {
            if let Err(e) = pool.submit(job).await {
                tracing::error!("Failed to submit job: {}", e);
                break;
            }
        }
        pool.close().await;
    });

    let mut results = Vec::with_capacity(expected);
    while let Some(result) = stream.next().await {
        results.push(result);
    }

    if let Err(e) = submitter.await {
        tracing::error!("Job submitter failed: {}", e);
    }

    if results.len() != expected {
        tracing::warn!(expected, received = results.len(), "Missing job results");
    }
    results
}
