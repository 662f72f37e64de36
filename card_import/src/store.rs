//! Persistence seams used by the batch runner
//!
//! `EntityStore` receives fetched cards, `ProgressStore` holds the durable
//! per-source checkpoint that lets an interrupted import resume.

use crate::client::CardRecord;
use crate::error::Result;
use crate::source::SourceType;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// How far ingestion for one source got
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub source_type: SourceType,
    /// Last page whose records are durably stored (0 = none yet)
    pub last_processed_page: u32,
    pub total_pages_known: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(source_type: SourceType, last_processed_page: u32, total_pages_known: Option<u32>) -> Self {
        Self {
            source_type,
            last_processed_page,
            total_pages_known,
            updated_at: Utc::now(),
        }
    }

    /// Known total, ignoring a reported total of zero
    pub fn known_total(&self) -> Option<u32> {
        self.total_pages_known.filter(|total| *total > 0)
    }

    /// True when the cursor reached the known total
    pub fn is_exhausted(&self) -> bool {
        matches!(self.known_total(), Some(total) if self.last_processed_page >= total)
    }
}

/// Stores fetched cards; each call is atomic
pub trait EntityStore: Send + Sync {
    /// Returns the number of records written
    fn save_all(&self, source: SourceType, records: &[CardRecord]) -> Result<usize>;
}

/// Durable, read-your-writes checkpoint storage keyed by source
pub trait ProgressStore: Send + Sync {
    fn read(&self, source: SourceType) -> Result<Option<Checkpoint>>;
    fn write(&self, checkpoint: &Checkpoint) -> Result<()>;
}
