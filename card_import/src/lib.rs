//! Card Import - resumable trading card catalog ingestion
//!
//! Imports cards from external catalogs (pokemontcg.io, Scryfall, YGOPRODeck)
//! into SQLite as background jobs. Each source keeps a durable page checkpoint
//! so an interrupted import resumes where it stopped.

pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod jobs;
pub mod runner;
pub mod source;
pub mod store;
pub mod web;

#[cfg(test)]
mod testing;

pub use client::{CardRecord, HttpSourceClient, SourceClient, SourcePage};
pub use config::SourceConfig;
pub use database::{init_schema, SqliteStore};
pub use error::{ImportError, Result};
pub use jobs::{ImportJob, ImportOrchestrator, JobRegistry, JobStatus};
pub use runner::{BatchRunner, PageRange, RunSummary};
pub use source::SourceType;
pub use store::{Checkpoint, EntityStore, ProgressStore};
