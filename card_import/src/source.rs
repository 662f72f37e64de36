//! External card catalogs that can be imported

use crate::error::ImportError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An external card data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    /// pokemontcg.io
    Pokemon,
    /// Scryfall (Magic: The Gathering)
    Magic,
    /// YGOPRODeck (Yu-Gi-Oh!)
    Yugioh,
}

impl SourceType {
    pub const ALL: [SourceType; 3] = [SourceType::Pokemon, SourceType::Magic, SourceType::Yugioh];

    /// Wire and storage key, e.g. `POKEMON`
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Pokemon => "POKEMON",
            SourceType::Magic => "MAGIC",
            SourceType::Yugioh => "YUGIOH",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = ImportError;

    /// Case-insensitive; also accepts the catalog names people tend to type
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "POKEMON" | "POKEMONTCG" => Ok(SourceType::Pokemon),
            "MAGIC" | "MTG" | "SCRYFALL" => Ok(SourceType::Magic),
            "YUGIOH" | "YGO" | "YGOPRODECK" => Ok(SourceType::Yugioh),
            _ => Err(ImportError::UnknownSource(s.to_string())),
        }
    }
}
