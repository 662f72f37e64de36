//! HTTP client for the public card catalog APIs
//!
//! Uses async reqwest. Only the fields the importer stores are extracted;
//! the full upstream object is kept as the record payload.

use super::{CardRecord, SourceClient, SourcePage};
use crate::config::{SourceConfig, SCRYFALL_PAGE_SIZE};
use crate::error::{ImportError, Result};
use crate::source::SourceType;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// pokemontcg.io `/v2/cards` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PokemonResponse {
    data: Vec<Value>,
    total_count: Option<u32>,
}

/// Scryfall `/cards/search` list object
#[derive(Debug, Deserialize)]
struct ScryfallResponse {
    data: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    total_cards: Option<u32>,
}

/// YGOPRODeck `cardinfo.php` response (paginated form)
#[derive(Debug, Deserialize)]
struct YgoResponse {
    data: Vec<Value>,
    meta: Option<YgoMeta>,
}

#[derive(Debug, Deserialize)]
struct YgoMeta {
    total_pages: Option<u32>,
    rows_remaining: Option<u32>,
}

/// Source client backed by the public HTTP APIs
pub struct HttpSourceClient {
    client: reqwest::Client,
    config: SourceConfig,
}

impl HttpSourceClient {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn page_size(&self) -> u32 {
        self.config.page_size.max(1)
    }

    /// GET a URL and decode the body as JSON
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        source: SourceType,
        page: u32,
        url: &str,
        api_key: Option<&str>,
    ) -> Result<T> {
        log::debug!("Fetching {} page {}: {}", source, page, url);

        let mut request = self
            .client
            .get(url)
            .header("User-Agent", &self.config.user_agent);
        if let Some(key) = api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ImportError::HttpStatus {
                source_type: source,
                page,
                status: response.status(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_pokemon(&self, page: u32) -> Result<SourcePage> {
        let page_size = self.page_size();
        let url = format!(
            "{}/v2/cards?page={}&pageSize={}",
            self.config.pokemon_base_url, page, page_size
        );
        let response: PokemonResponse = self
            .get_json(
                SourceType::Pokemon,
                page,
                &url,
                self.config.pokemon_api_key.as_deref(),
            )
            .await?;

        let total_pages = response.total_count.map(|count| count.div_ceil(page_size));
        let is_last_page = response.data.is_empty()
            || match total_pages {
                Some(total) => page >= total,
                None => (response.data.len() as u32) < page_size,
            };

        Ok(SourcePage {
            records: extract_records(response.data, "/set/name"),
            is_last_page,
            total_pages,
        })
    }

    async fn fetch_scryfall(&self, page: u32) -> Result<SourcePage> {
        let url = format!(
            "{}/cards/search?q={}&page={}",
            self.config.scryfall_base_url,
            urlencoding::encode(&self.config.scryfall_query),
            page
        );
        let response: ScryfallResponse = self.get_json(SourceType::Magic, page, &url, None).await?;

        Ok(SourcePage {
            is_last_page: !response.has_more || response.data.is_empty(),
            total_pages: response
                .total_cards
                .map(|count| count.div_ceil(SCRYFALL_PAGE_SIZE)),
            records: extract_records(response.data, "/set_name"),
        })
    }

    async fn fetch_ygoprodeck(&self, page: u32) -> Result<SourcePage> {
        let page_size = self.page_size();
        let offset = page.saturating_sub(1) * page_size;
        let url = format!(
            "{}/api/v7/cardinfo.php?num={}&offset={}",
            self.config.ygoprodeck_base_url, page_size, offset
        );
        let response: YgoResponse = self.get_json(SourceType::Yugioh, page, &url, None).await?;

        // Without `meta` the API returned the whole catalog in one go
        let (is_last_page, total_pages) = match &response.meta {
            Some(meta) => (meta.rows_remaining.unwrap_or(0) == 0, meta.total_pages),
            None => (true, Some(page)),
        };

        Ok(SourcePage {
            is_last_page: is_last_page || response.data.is_empty(),
            total_pages,
            records: extract_records(response.data, "/card_sets/0/set_name"),
        })
    }
}

#[async_trait]
impl SourceClient for HttpSourceClient {
    async fn fetch_page(&self, source: SourceType, page: u32) -> Result<SourcePage> {
        match source {
            SourceType::Pokemon => self.fetch_pokemon(page).await,
            SourceType::Magic => self.fetch_scryfall(page).await,
            SourceType::Yugioh => self.fetch_ygoprodeck(page).await,
        }
    }
}

/// Build records from raw upstream card objects
///
/// Cards without an `id` or `name` are skipped; they can't be upserted.
fn extract_records(cards: Vec<Value>, set_name_pointer: &str) -> Vec<CardRecord> {
    cards
        .into_iter()
        .filter_map(|card| {
            let external_id = match card.get("id")? {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            let name = card.get("name")?.as_str()?.to_string();
            let set_name = card
                .pointer(set_name_pointer)
                .and_then(Value::as_str)
                .map(str::to_string);
            Some(CardRecord {
                external_id,
                name,
                set_name,
                payload: card,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
