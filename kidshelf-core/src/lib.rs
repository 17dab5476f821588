//! # kidshelf-core
//!
//! Core library for kidshelf - a curation pipeline for children's media.
//!
//! This library provides:
//! - Domain types for the staged pipeline and the show catalog
//! - Metadata provider client (paged discovery + detail enrichment)
//! - AI safety assessment client with retry/backoff
//! - Stage file store and catalog persistence
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Candidates flow through four resumable stages, each persisted as a JSON
//! file in the staging directory:
//! - **Stage 1 (Discover):** paged provider search, deduplicated against the catalog
//! - **Stage 2 (Enrich):** full metadata per candidate; items without a cross-provider id drop out
//! - **Stage 3 (Assess):** AI safety verdict per item, flushed after every result
//! - **Stage 4 (Review):** human or automated approval with an audit trail
//!
//! Approved records merge into the catalog by id, then by unique normalized
//! title; ambiguous matches are skipped rather than guessed.
//!
//! ## Example
//!
//! ```rust,no_run
//! use kidshelf_core::{Catalog, Config, StagingStore};
//!
//! let config = Config::load().expect("failed to load config");
//! let store = StagingStore::new(config.staging_dir());
//! let catalog = Catalog::load(config.catalog_path()).expect("failed to load catalog");
//! println!("{} shows, staged files: {:?}", catalog.len(), store.existing_files());
//! ```

// Re-export commonly used items at the crate root
pub use catalog::{normalize_title, Catalog};
pub use config::Config;
pub use error::{Error, Result};
pub use store::StagingStore;
pub use types::*;

// Public modules
pub mod catalog;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod pipeline;
pub mod provider;
pub mod safety;
pub mod store;
pub mod types;
