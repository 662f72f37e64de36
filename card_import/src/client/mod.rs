//! External source clients: fetch one page of cards from an upstream catalog

mod http;

pub use http::HttpSourceClient;

use crate::error::Result;
use crate::source::SourceType;
use async_trait::async_trait;
use serde::Serialize;

/// A single card as delivered by an upstream catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardRecord {
    /// Upstream identifier, unique within one source
    pub external_id: String,
    pub name: String,
    pub set_name: Option<String>,
    /// Raw upstream object, stored as-is
    pub payload: serde_json::Value,
}

/// One page of upstream results
#[derive(Debug, Clone, Default)]
pub struct SourcePage {
    pub records: Vec<CardRecord>,
    pub is_last_page: bool,
    /// Upstream page count, when the source reports one
    pub total_pages: Option<u32>,
}

/// Fetches pages from an external card catalog
///
/// Pages are 1-based. Any error aborts the import run that requested the page.
#[async_trait]
pub trait SourceClient: Send + Sync {
    async fn fetch_page(&self, source: SourceType, page: u32) -> Result<SourcePage>;
}
