//! Import orchestrator: trigger background import jobs and report their status
//!
//! `trigger` registers a job and hands the run to a detached tokio task.
//! That task is the only writer of terminal states. Status queries refresh a
//! running job's progress from the source checkpoint, never its status.

use super::registry::{ImportJob, JobCounts, JobRegistry, JobStatus};
use crate::error::{ImportError, Result};
use crate::runner::BatchRunner;
use crate::source::SourceType;
use crate::store::{Checkpoint, ProgressStore};
use std::sync::Arc;
use uuid::Uuid;

const STARTING_MESSAGE: &str = "Starting import...";

/// Entry point for starting imports and polling them
#[derive(Clone)]
pub struct ImportOrchestrator {
    registry: JobRegistry,
    runner: Arc<BatchRunner>,
    progress: Arc<dyn ProgressStore>,
}

impl ImportOrchestrator {
    pub fn new(runner: Arc<BatchRunner>) -> Self {
        Self::with_registry(JobRegistry::new(), runner)
    }

    pub fn with_registry(registry: JobRegistry, runner: Arc<BatchRunner>) -> Self {
        let progress = runner.progress_store();
        Self {
            registry,
            runner,
            progress,
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Register a job for `source` and start it in the background
    ///
    /// Returns the `PENDING` job right away. Concurrent triggers for the same
    /// source are accepted; their runs share that source's checkpoint.
    /// Must be called from within a tokio runtime.
    pub fn trigger(&self, source: SourceType) -> ImportJob {
        let job = self.registry.create(source);
        log::info!("Queued {} import as job {}", source, job.id);

        let registry = self.registry.clone();
        let runner = Arc::clone(&self.runner);
        let id = job.id;
        tokio::spawn(async move {
            execute(registry, runner, id, source).await;
        });

        job
    }

    /// Current state of a job
    ///
    /// While the job runs, its counters and message are refreshed from the
    /// checkpoint. A checkpoint written before the job started belongs to an
    /// earlier run and is ignored. A checkpoint read error leaves the snapshot
    /// as it was.
    pub fn get_status(&self, id: Uuid) -> Result<ImportJob> {
        let job = self.registry.get(id).ok_or(ImportError::JobNotFound(id))?;
        if job.status != JobStatus::Running {
            return Ok(job);
        }

        let checkpoint = match self.progress.read(job.source_type) {
            Ok(Some(checkpoint)) => checkpoint,
            Ok(None) => return Ok(job),
            Err(e) => {
                log::warn!(
                    "Could not read {} checkpoint for job {}: {}",
                    job.source_type,
                    id,
                    e
                );
                return Ok(job);
            }
        };
        if job.started_at.is_some_and(|started| checkpoint.updated_at < started) {
            return Ok(job);
        }

        self.registry
            .refresh_running(id, |job| apply_checkpoint(job, &checkpoint))
            .ok_or(ImportError::JobNotFound(id))
    }

    /// All jobs, running ones reconciled
    pub fn list_jobs(&self) -> Vec<ImportJob> {
        self.registry
            .list()
            .into_iter()
            .map(|job| self.get_status(job.id).unwrap_or(job))
            .collect()
    }
}

/// Project a checkpoint onto a running job's progress fields
fn apply_checkpoint(job: &mut ImportJob, checkpoint: &Checkpoint) {
    let page = checkpoint.last_processed_page;
    job.processed_items = Some(page);

    match checkpoint.known_total() {
        Some(total) => {
            job.total_items = Some(total);
            job.progress_percent = Some(percent(page, total));
            job.message = format!("Processing page {} of {}", page, total);
        }
        None => {
            job.message = format!("Processing page {}...", page);
        }
    }
}

fn percent(done: u32, total: u32) -> u8 {
    (u64::from(done) * 100 / u64::from(total)).min(100) as u8
}

/// Background body of one job: run the import, record the outcome
async fn execute(registry: JobRegistry, runner: Arc<BatchRunner>, id: Uuid, source: SourceType) {
    registry.update_status(id, JobStatus::Running, STARTING_MESSAGE, None);

    match runner.run(source).await {
        Ok(summary) => {
            // Report the run as fully done even if the last counters lag
            let total = summary.final_total();
            let message = format!(
                "Import completed: {} cards from {} pages",
                summary.records_stored, summary.pages_processed
            );
            log::info!("Job {} ({}) completed", id, source);
            registry.update_status(
                id,
                JobStatus::Completed,
                message,
                Some(JobCounts {
                    total_items: Some(total),
                    processed_items: Some(total),
                    progress_percent: Some(100),
                }),
            );
        }
        Err(e) => {
            log::error!("Job {} ({}) failed: {}", id, source, e);
            registry.update_status(id, JobStatus::Failed, format!("Import failed: {}", e), None);
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
