//! In-memory table of import jobs
//!
//! Lives as long as the process. Nothing here is persisted: after a restart
//! the jobs are gone, only the per-source checkpoints remain.

use crate::source::SourceType;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Lifecycle of an import job
///
/// `PENDING -> RUNNING -> COMPLETED | FAILED`; terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    fn can_become(&self, next: JobStatus) -> bool {
        match self {
            JobStatus::Pending => next == JobStatus::Running,
            JobStatus::Running => next != JobStatus::Pending,
            JobStatus::Completed | JobStatus::Failed => false,
        }
    }
}

/// Snapshot of one import attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJob {
    #[serde(rename = "jobId")]
    pub id: Uuid,
    pub source_type: SourceType,
    pub status: JobStatus,
    pub message: String,
    pub total_items: Option<u32>,
    pub processed_items: Option<u32>,
    pub progress_percent: Option<u8>,
    pub created_at: DateTime<Utc>,
    /// Set when the job enters `RUNNING`
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Progress counters written together with a status change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobCounts {
    pub total_items: Option<u32>,
    pub processed_items: Option<u32>,
    pub progress_percent: Option<u8>,
}

/// Thread-safe job table keyed by job id
///
/// Cloning shares the same table.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, ImportJob>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new `PENDING` job and return its snapshot
    pub fn create(&self, source_type: SourceType) -> ImportJob {
        let now = Utc::now();
        let job = ImportJob {
            id: Uuid::new_v4(),
            source_type,
            status: JobStatus::Pending,
            message: format!("{} import queued", source_type),
            total_items: None,
            processed_items: None,
            progress_percent: None,
            created_at: now,
            started_at: None,
            updated_at: now,
        };

        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job.id, job.clone());
        job
    }

    pub fn get(&self, id: Uuid) -> Option<ImportJob> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// All jobs, oldest first
    pub fn list(&self) -> Vec<ImportJob> {
        let mut jobs: Vec<ImportJob> = self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        jobs.sort_by_key(|job| job.created_at);
        jobs
    }

    /// Set status and message (and counters, when given) in one step
    ///
    /// Returns false if the job is unknown or the transition is not allowed.
    pub fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
        message: impl Into<String>,
        counts: Option<JobCounts>,
    ) -> bool {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let Some(job) = jobs.get_mut(&id) else {
            log::warn!("Status update for unknown job {}", id);
            return false;
        };

        if !job.status.can_become(status) {
            log::warn!(
                "Ignoring {:?} -> {:?} transition for job {}",
                job.status,
                status,
                id
            );
            return false;
        }

        let now = Utc::now();
        if status == JobStatus::Running {
            job.started_at = Some(now);
        }
        job.status = status;
        job.message = message.into();
        if let Some(counts) = counts {
            job.total_items = counts.total_items;
            job.processed_items = counts.processed_items;
            job.progress_percent = counts.progress_percent;
        }
        job.updated_at = now;
        true
    }

    /// Apply a progress-only change if the job is still `RUNNING`
    ///
    /// The status check and the change happen under one lock, so a job that
    /// finished meanwhile keeps its final fields. Returns the resulting
    /// snapshot, or `None` for an unknown id.
    pub fn refresh_running<F>(&self, id: Uuid, refresh: F) -> Option<ImportJob>
    where
        F: FnOnce(&mut ImportJob),
    {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let job = jobs.get_mut(&id)?;

        if job.status == JobStatus::Running {
            let status = job.status;
            refresh(&mut *job);
            job.status = status;
            job.updated_at = Utc::now();
        }
        Some(job.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn create_registers_pending_job() {
        let registry = JobRegistry::new();
        let job = registry.create(SourceType::Pokemon);

        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.source_type, SourceType::Pokemon);
        assert_eq!(job.processed_items, None);
        assert_eq!(registry.get(job.id), Some(job));
    }

    #[test]
    fn get_unknown_id_returns_none() {
        let registry = JobRegistry::new();
        assert!(registry.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn ids_are_unique() {
        let registry = JobRegistry::new();
        let ids: HashSet<Uuid> = (0..100)
            .map(|_| registry.create(SourceType::Magic).id)
            .collect();
        assert_eq!(ids.len(), 100);
        assert_eq!(registry.list().len(), 100);
    }

    #[test]
    fn update_status_applies_counts_atomically() {
        let registry = JobRegistry::new();
        let job = registry.create(SourceType::Magic);

        assert!(registry.update_status(job.id, JobStatus::Running, "Starting import...", None));
        assert!(registry.update_status(
            job.id,
            JobStatus::Completed,
            "done",
            Some(JobCounts {
                total_items: Some(5),
                processed_items: Some(5),
                progress_percent: Some(100),
            }),
        ));

        let job = registry.get(job.id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.message, "done");
        assert_eq!(job.total_items, Some(5));
        assert_eq!(job.processed_items, Some(5));
        assert_eq!(job.progress_percent, Some(100));
    }

    #[test]
    fn terminal_status_is_final() {
        let registry = JobRegistry::new();
        let job = registry.create(SourceType::Yugioh);
        registry.update_status(job.id, JobStatus::Running, "running", None);
        registry.update_status(job.id, JobStatus::Failed, "Import failed: boom", None);

        assert!(!registry.update_status(job.id, JobStatus::Running, "again", None));
        assert!(!registry.update_status(job.id, JobStatus::Completed, "again", None));

        let job = registry.get(job.id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.message, "Import failed: boom");
    }

    #[test]
    fn pending_job_must_run_before_finishing() {
        let registry = JobRegistry::new();
        let job = registry.create(SourceType::Magic);

        assert!(!registry.update_status(job.id, JobStatus::Completed, "done", None));
        assert!(!registry.update_status(job.id, JobStatus::Failed, "Import failed: x", None));

        let unchanged = registry.get(job.id).unwrap();
        assert_eq!(unchanged.status, JobStatus::Pending);
        assert_eq!(unchanged.message, job.message);
        assert!(unchanged.started_at.is_none());

        assert!(registry.update_status(job.id, JobStatus::Running, "running", None));
        let running = registry.get(job.id).unwrap();
        assert!(running.started_at.is_some());
        assert!(running.started_at.unwrap() >= running.created_at);
    }

    #[test]
    fn running_job_cannot_go_back_to_pending() {
        let registry = JobRegistry::new();
        let job = registry.create(SourceType::Yugioh);
        registry.update_status(job.id, JobStatus::Running, "running", None);

        assert!(!registry.update_status(job.id, JobStatus::Pending, "queued", None));
        assert_eq!(registry.get(job.id).unwrap().status, JobStatus::Running);
    }

    #[test]
    fn update_unknown_job_is_rejected() {
        let registry = JobRegistry::new();
        assert!(!registry.update_status(Uuid::new_v4(), JobStatus::Running, "x", None));
    }

    #[test]
    fn refresh_running_skips_non_running_jobs() {
        let registry = JobRegistry::new();
        let job = registry.create(SourceType::Pokemon);

        let pending = registry
            .refresh_running(job.id, |j| j.message = "changed".to_string())
            .unwrap();
        assert_eq!(pending.message, job.message);

        registry.update_status(job.id, JobStatus::Running, "running", None);
        let running = registry
            .refresh_running(job.id, |j| j.processed_items = Some(3))
            .unwrap();
        assert_eq!(running.processed_items, Some(3));

        registry.update_status(job.id, JobStatus::Completed, "done", None);
        let completed = registry
            .refresh_running(job.id, |j| j.processed_items = Some(1))
            .unwrap();
        assert_eq!(completed.processed_items, Some(3));
    }

    #[test]
    fn refresh_running_cannot_change_status() {
        let registry = JobRegistry::new();
        let job = registry.create(SourceType::Pokemon);
        registry.update_status(job.id, JobStatus::Running, "running", None);

        let refreshed = registry
            .refresh_running(job.id, |j| j.status = JobStatus::Completed)
            .unwrap();
        assert_eq!(refreshed.status, JobStatus::Running);
    }

    #[test]
    fn list_returns_jobs_oldest_first() {
        let registry = JobRegistry::new();
        let first = registry.create(SourceType::Pokemon);
        let second = registry.create(SourceType::Magic);

        let ids: Vec<Uuid> = registry.list().iter().map(|j| j.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&first.id) && ids.contains(&second.id));
        assert!(registry.list()[0].created_at <= registry.list()[1].created_at);
    }

    #[test]
    fn concurrent_creates_and_updates_are_safe() {
        let registry = JobRegistry::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let job = registry.create(SourceType::Magic);
                        registry.update_status(job.id, JobStatus::Running, "running", None);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.list().len(), 400);
        assert!(registry.list().iter().all(|j| j.status == JobStatus::Running));
    }

    #[test]
    fn job_serializes_with_public_field_names() {
        let registry = JobRegistry::new();
        let job = registry.create(SourceType::Pokemon);

        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["jobId"], job.id.to_string());
        assert_eq!(json["sourceType"], "POKEMON");
        assert_eq!(json["status"], "PENDING");
        assert!(json["processedItems"].is_null());
        assert!(json.get("progressPercent").is_some());
        assert!(json["startedAt"].is_null());
    }
}
