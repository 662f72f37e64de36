//! Test doubles shared by the unit tests

use crate::client::{CardRecord, SourceClient, SourcePage};
use crate::error::{ImportError, Result};
use crate::source::SourceType;
use crate::store::EntityStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Create a test card with a minimal payload
pub fn make_test_card(external_id: &str, name: &str) -> CardRecord {
    CardRecord {
        external_id: external_id.to_string(),
        name: name.to_string(),
        set_name: Some("Test Set".to_string()),
        payload: serde_json::json!({ "id": external_id, "name": name }),
    }
}

/// Source client serving `total_pages` pages of `per_page` cards each
///
/// Optionally fails on one page, or waits for a permit per page so a test
/// can step a run forward.
pub struct ScriptedSource {
    total_pages: u32,
    per_page: usize,
    report_total: bool,
    fail_on_page: Option<u32>,
    empty_page: Option<u32>,
    gate: Option<Arc<Semaphore>>,
    fetched: Mutex<Vec<u32>>,
}

impl ScriptedSource {
    pub fn new(total_pages: u32, per_page: usize) -> Self {
        Self {
            total_pages,
            per_page,
            report_total: true,
            fail_on_page: None,
            empty_page: None,
            gate: None,
            fetched: Mutex::new(Vec::new()),
        }
    }

    /// Don't tell the runner how many pages exist
    pub fn without_total(mut self) -> Self {
        self.report_total = false;
        self
    }

    pub fn failing_on(mut self, page: u32) -> Self {
        self.fail_on_page = Some(page);
        self
    }

    /// Serve `page` without any cards, as if all of them were unusable
    pub fn with_empty_page(mut self, page: u32) -> Self {
        self.empty_page = Some(page);
        self
    }

    /// Each fetch consumes one permit from the returned semaphore
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    /// Pages requested so far, in order
    pub fn fetched_pages(&self) -> Vec<u32> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceClient for ScriptedSource {
    async fn fetch_page(&self, source: SourceType, page: u32) -> Result<SourcePage> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.fetched.lock().unwrap().push(page);

        if self.fail_on_page == Some(page) {
            return Err(ImportError::HttpStatus {
                source_type: source,
                page,
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            });
        }

        let per_page = if self.empty_page == Some(page) {
            0
        } else {
            self.per_page
        };
        let records = (0..per_page)
            .map(|i| make_test_card(&format!("{}-{}", page, i), &format!("Card {} of page {}", i, page)))
            .collect();

        Ok(SourcePage {
            records,
            is_last_page: page >= self.total_pages,
            total_pages: self.report_total.then_some(self.total_pages),
        })
    }
}

/// Entity store wrapper whose n-th `save_all` call (1-based) fails
pub struct FailingStore<S> {
    inner: S,
    fail_on_call: usize,
    calls: AtomicUsize,
}

impl<S: EntityStore> FailingStore<S> {
    pub fn new(inner: S, fail_on_call: usize) -> Self {
        Self {
            inner,
            fail_on_call,
            calls: AtomicUsize::new(0),
        }
    }
}

impl<S: EntityStore> EntityStore for FailingStore<S> {
    fn save_all(&self, source: SourceType, records: &[CardRecord]) -> Result<usize> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on_call {
            return Err(ImportError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_FULL),
                Some("database or disk is full".to_string()),
            )));
        }
        self.inner.save_all(source, records)
    }
}
