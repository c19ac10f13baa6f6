//! Incremental Module Sync
//!
//! This module provides module-tree discovery and classification, token
//! substitution, cross-run incremental state, and batched upload of the
//! surviving files into a remote document store.

pub mod batch;
pub mod engine;
pub mod filter;
pub mod finder;
pub mod state;
pub mod tokens;

pub use batch::{BatchUploader, UploadFailure, UploadOutcome, DEFAULT_BATCH_SIZE};
pub use engine::{SyncConfig, SyncEngine, SyncResult, SyncStats};
pub use filter::ModuleFilter;
pub use finder::{logical_uri, DiscoveredFile, ModuleCategory, ModuleFinder};
pub use state::StateStore;
pub use tokens::TokenReplacer;
