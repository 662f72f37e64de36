//! Import job tracking and orchestration

mod orchestrator;
mod registry;

pub use orchestrator::ImportOrchestrator;
pub use registry::{ImportJob, JobCounts, JobRegistry, JobStatus};
