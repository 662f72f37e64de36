//! Upstream endpoint configuration

/// Public pokemontcg.io API root
pub const POKEMON_BASE_URL: &str = "https://api.pokemontcg.io";
/// Public Scryfall API root
pub const SCRYFALL_BASE_URL: &str = "https://api.scryfall.com";
/// Public YGOPRODeck API root
pub const YGOPRODECK_BASE_URL: &str = "https://db.ygoprodeck.com";

/// Scryfall serves search results in fixed pages of this size
pub const SCRYFALL_PAGE_SIZE: u32 = 175;

/// Settings for the HTTP source client
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub pokemon_base_url: String,
    pub scryfall_base_url: String,
    pub ygoprodeck_base_url: String,
    /// Cards per page for sources that let the caller choose
    pub page_size: u32,
    /// Optional pokemontcg.io key (raises rate limits)
    pub pokemon_api_key: Option<String>,
    /// Scryfall search expression used to enumerate cards
    pub scryfall_query: String,
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            pokemon_base_url: POKEMON_BASE_URL.to_string(),
            scryfall_base_url: SCRYFALL_BASE_URL.to_string(),
            ygoprodeck_base_url: YGOPRODECK_BASE_URL.to_string(),
            page_size: 250,
            pokemon_api_key: None,
            scryfall_query: "game:paper".to_string(),
            user_agent: "card_import/1.0".to_string(),
        }
    }
}

impl SourceConfig {
    /// Point every source at the same base URL (mock servers in tests)
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            pokemon_base_url: base_url.to_string(),
            scryfall_base_url: base_url.to_string(),
            ygoprodeck_base_url: base_url.to_string(),
            ..Self::default()
        }
    }
}
