//! Batch runner: one paginated fetch-and-store pass over a source
//!
//! The checkpoint for a page is written only after that page's cards are
//! stored, and before the next page is fetched. A crash therefore leaves the
//! checkpoint on the last fully stored page, and the next run resumes there.

use crate::client::SourceClient;
use crate::error::Result;
use crate::source::SourceType;
use crate::store::{Checkpoint, EntityStore, ProgressStore};
use std::sync::Arc;

/// Page bounds for a run (1-based, inclusive)
///
/// A missing start means "continue where the checkpoint left off",
/// a missing end means "until the source says it's done".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRange {
    pub start: Option<u32>,
    pub end: Option<u32>,
}

impl PageRange {
    /// Natural continuation point, no end bound
    pub fn continuation() -> Self {
        Self::default()
    }

    pub fn from_page(start: u32) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn between(start: u32, end: u32) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    fn allows(&self, page: u32) -> bool {
        self.end.map_or(true, |end| page <= end)
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub first_page: u32,
    /// Last page stored by this run, if any
    pub last_page: Option<u32>,
    pub pages_processed: u32,
    pub records_stored: usize,
    pub total_pages: Option<u32>,
}

impl RunSummary {
    /// Page count to report as the finished total
    pub fn final_total(&self) -> u32 {
        self.total_pages.or(self.last_page).unwrap_or(0)
    }
}

/// Executes import runs against a source client and the two stores
pub struct BatchRunner {
    client: Arc<dyn SourceClient>,
    entities: Arc<dyn EntityStore>,
    progress: Arc<dyn ProgressStore>,
}

impl BatchRunner {
    pub fn new(
        client: Arc<dyn SourceClient>,
        entities: Arc<dyn EntityStore>,
        progress: Arc<dyn ProgressStore>,
    ) -> Self {
        Self {
            client,
            entities,
            progress,
        }
    }

    /// The checkpoint store this runner advances
    pub fn progress_store(&self) -> Arc<dyn ProgressStore> {
        Arc::clone(&self.progress)
    }

    /// Run from the natural continuation point to the end of the source
    pub async fn run(&self, source: SourceType) -> Result<RunSummary> {
        self.run_range(source, PageRange::continuation()).await
    }

    /// Run over an explicit page range
    ///
    /// The run ends on the source's last page or the range end. A page with
    /// no usable cards is still checkpointed. Any fetch or store error aborts
    /// the run; the checkpoint keeps whatever it last recorded.
    pub async fn run_range(&self, source: SourceType, range: PageRange) -> Result<RunSummary> {
        let previous = self.progress.read(source)?;
        let mut total_pages = previous.as_ref().and_then(|c| c.total_pages_known);

        let (first_page, resumed) = match range.start {
            Some(start) => (start.max(1), false),
            None => match &previous {
                Some(checkpoint) if !checkpoint.is_exhausted() => {
                    (checkpoint.last_processed_page + 1, true)
                }
                _ => (1, false),
            },
        };

        if resumed {
            log::info!("Resuming {} import at page {}", source, first_page);
        } else {
            log::info!("Starting {} import at page {}", source, first_page);
            // A stale cursor from an earlier run must not run ahead of this one
            if previous.is_some() {
                self.progress
                    .write(&Checkpoint::new(source, first_page - 1, total_pages))?;
            }
        }

        let mut summary = RunSummary {
            first_page,
            last_page: None,
            pages_processed: 0,
            records_stored: 0,
            total_pages,
        };

        let mut page = first_page;
        while range.allows(page) {
            let fetched = self.client.fetch_page(source, page).await?;
            if fetched.total_pages.is_some() {
                total_pages = fetched.total_pages;
            }
            // The source says it's done, so the cursor must count as exhausted
            if fetched.is_last_page {
                let known = total_pages.filter(|total| *total > 0);
                total_pages = Some(known.map_or(page, |total| total.min(page)));
            }

            let stored = if fetched.records.is_empty() {
                log::debug!("{} page {} has no usable cards", source, page);
                0
            } else {
                self.entities.save_all(source, &fetched.records)?
            };
            self.progress
                .write(&Checkpoint::new(source, page, total_pages))?;

            summary.last_page = Some(page);
            summary.pages_processed += 1;
            summary.records_stored += stored;
            log::debug!(
                "{} page {}/{} stored ({} cards)",
                source,
                page,
                total_pages.map_or_else(|| "?".to_string(), |t| t.to_string()),
                stored
            );

            if fetched.is_last_page {
                break;
            }
            page += 1;
        }

        summary.total_pages = total_pages;
        log::info!(
            "Finished {} import: {} cards from {} pages",
            source,
            summary.records_stored,
            summary.pages_processed
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
