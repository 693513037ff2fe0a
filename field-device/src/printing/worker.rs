//! Print Worker
//!
//! The only task that talks to the printer. Takes jobs from the queue one at
//! a time and drives each to a terminal state before looking at the next, so
//! the device never sees interleaved jobs.
//!
//! Per attempt: status check → artifact (created once per job) → submit.
//! Retryable failures are retried after `retry_delay` until `max_retries`
//! attempts have been made; fatal failures end the job at once.

use super::formatter::DotMatrixFormatter;
use super::job::{JobStatus, PrintJob};
use super::queue::JobReceiver;
use crate::core::tasks::panic_message;
use briefing_printer::{PrintError, PrintOptions, PrintTransport};
use chrono::Local;
use futures::FutureExt;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// Result of a single attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Accepted by the spooler, with its job id
    Success(String),
    /// May succeed on a later attempt
    RetryableFailure(String),
    /// Retrying cannot help
    FatalFailure(String),
}

impl AttemptOutcome {
    fn from_error(err: &PrintError) -> Self {
        if err.is_retryable() {
            AttemptOutcome::RetryableFailure(err.to_string())
        } else {
            AttemptOutcome::FatalFailure(err.to_string())
        }
    }
}

/// Terminal record of a job, emitted after every job
#[derive(Debug, Clone)]
pub struct JobReport {
    pub job: PrintJob,
    /// Spooler id when the job succeeded
    pub printer_job_id: Option<String>,
    /// Last failure reason when the job failed
    pub error: Option<String>,
}

/// Worker settings
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub temp_dir: PathBuf,
    pub options: PrintOptions,
}

pub struct PrintWorker {
    transport: Arc<dyn PrintTransport>,
    formatter: DotMatrixFormatter,
    settings: WorkerSettings,
    reports: Option<mpsc::UnboundedSender<JobReport>>,
}

impl PrintWorker {
    pub fn new(transport: Arc<dyn PrintTransport>, settings: WorkerSettings) -> Self {
        Self {
            transport,
            formatter: DotMatrixFormatter::new(settings.options.characters_per_inch),
            settings,
            reports: None,
        }
    }

    /// Send a [`JobReport`] for every finished job
    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<JobReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Run the worker until shutdown or until every producer is gone
    pub async fn run(self, mut jobs: JobReceiver, shutdown: CancellationToken) {
        info!(
            printer = %self.transport.describe(),
            max_retries = self.settings.max_retries,
            "Print worker started"
        );

        loop {
            let job = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Print worker received shutdown signal");
                    break;
                }
                job = jobs.recv() => job,
            };
            let Some(job) = job else {
                info!("Print queue closed, print worker stopping");
                break;
            };

            let job_name = job.job_name.clone();
            let guard = jobs.begin();
            let result = AssertUnwindSafe(self.execute(job, &shutdown))
                .catch_unwind()
                .await;
            drop(guard);

            match result {
                Ok(report) => {
                    if let Some(reports) = &self.reports {
                        let _ = reports.send(report);
                    }
                }
                Err(panic_info) => {
                    error!(
                        job_name = %job_name,
                        panic = %panic_message(panic_info.as_ref()),
                        "Print job panicked, continuing with next job"
                    );
                }
            }
        }

        let dropped = jobs.close();
        if dropped > 0 {
            warn!(dropped, "Print worker stopped with jobs still queued");
        }
        info!("Print worker stopped");
    }

    /// Drive one job to a terminal state
    #[instrument(skip_all, fields(job_name = %job.job_name, source = %job.source))]
    pub async fn execute(&self, mut job: PrintJob, shutdown: &CancellationToken) -> JobReport {
        job.status = JobStatus::Printing;
        let mut artifact: Option<NamedTempFile> = None;

        let result = loop {
            job.attempt_count += 1;
            let attempt = job.attempt_count;

            match self.attempt(&job, &mut artifact).await {
                AttemptOutcome::Success(printer_job_id) => break Ok(printer_job_id),
                AttemptOutcome::FatalFailure(reason) => {
                    error!(attempt, reason = %reason, "Print attempt failed fatally");
                    break Err(reason);
                }
                AttemptOutcome::RetryableFailure(reason) => {
                    if attempt >= self.settings.max_retries {
                        error!(attempt, reason = %reason, "Print attempt failed, giving up");
                        break Err(reason);
                    }
                    warn!(
                        attempt,
                        max_retries = self.settings.max_retries,
                        reason = %reason,
                        "Print attempt failed, retrying"
                    );
                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            break Err(format!("shutdown during retry backoff ({})", reason));
                        }
                        _ = tokio::time::sleep(self.settings.retry_delay) => {}
                    }
                }
            }
        };

        if let Some(file) = artifact
            && let Err(e) = file.close()
        {
            warn!(error = %e, "Failed to remove print artifact");
        }

        match result {
            Ok(printer_job_id) => {
                job.status = JobStatus::Succeeded;
                info!(
                    printer_job_id = %printer_job_id,
                    attempts = job.attempt_count,
                    "Print job succeeded"
                );
                JobReport {
                    job,
                    printer_job_id: Some(printer_job_id),
                    error: None,
                }
            }
            Err(reason) => {
                job.status = JobStatus::Failed;
                error!(attempts = job.attempt_count, reason = %reason, "Print job failed");
                JobReport {
                    job,
                    printer_job_id: None,
                    error: Some(reason),
                }
            }
        }
    }

    /// One attempt: status check, artifact, submit
    async fn attempt(&self, job: &PrintJob, artifact: &mut Option<NamedTempFile>) -> AttemptOutcome {
        match self.transport.status().await {
            Ok(status) if status.is_stopped() => {
                let err = PrintError::Stopped(status.state_reasons.join("; "));
                return AttemptOutcome::from_error(&err);
            }
            Ok(_) => {}
            Err(e) => return AttemptOutcome::from_error(&e),
        }

        if artifact.is_none() {
            match self.write_artifact(job) {
                Ok(file) => *artifact = Some(file),
                Err(e) => {
                    return AttemptOutcome::FatalFailure(format!("cannot write print artifact: {}", e));
                }
            }
        }
        let Some(file) = artifact.as_ref() else {
            return AttemptOutcome::FatalFailure("print artifact missing".into());
        };

        match self
            .transport
            .submit(&job.job_name, file.path(), &self.settings.options)
            .await
        {
            Ok(printer_job_id) => AttemptOutcome::Success(printer_job_id),
            Err(e) => AttemptOutcome::from_error(&e),
        }
    }

    /// Persist the formatted job under the temp directory
    fn write_artifact(&self, job: &PrintJob) -> std::io::Result<NamedTempFile> {
        std::fs::create_dir_all(&self.settings.temp_dir)?;
        let prefix = format!("{}_", sanitize(&job.job_name));
        let mut file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".prn")
            .tempfile_in(&self.settings.temp_dir)?;
        file.write_all(&self.formatter.format(&job.job_name, &job.content, Local::now()))?;
        file.flush()?;
        Ok(file)
    }
}

/// Keep file names to `[A-Za-z0-9_-]`
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
