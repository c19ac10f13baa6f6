//! Sync engine for module upload orchestration.
//!
//! The sole public entry point: discovery, filtering, and batched upload in
//! one pass, returning the files actually uploaded plus run statistics.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::error::SyncError;
use crate::store::DocumentStore;
use crate::sync::batch::{BatchUploader, UploadFailure, DEFAULT_BATCH_SIZE};
use crate::sync::filter::ModuleFilter;
use crate::sync::finder::{DiscoveredFile, ModuleFinder};
use crate::sync::state::StateStore;
use crate::sync::tokens::TokenReplacer;

/// Sync configuration.
///
/// An immutable value handed to the engine at construction; there are no
/// post-hoc setters, so run behavior never depends on call order.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Files per upload batch; values below 1 collapse to a single batch
    pub batch_size: i32,
    /// Inclusion filter applied to every discovered file
    pub filter: ModuleFilter,
    /// Token substitution applied to text modules
    pub replacer: TokenReplacer,
    /// Minimum-timestamp-to-load override in epoch millis; 0 means unset
    pub minimum_timestamp: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            filter: ModuleFilter::new(),
            replacer: TokenReplacer::new(),
            minimum_timestamp: 0,
        }
    }
}

/// Sync run statistics
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SyncStats {
    /// Files found by discovery
    pub files_discovered: usize,
    /// Files rejected by the filter
    pub files_filtered: usize,
    /// Files skipped as already loaded
    pub files_skipped: usize,
    /// Files uploaded this run
    pub files_uploaded: usize,
    /// Files whose upload failed
    pub files_failed: usize,
    /// Bytes written to the store
    pub bytes_uploaded: u64,
    /// Total duration
    pub duration_ms: u64,
}

/// Result of a sync run
#[derive(Debug)]
pub struct SyncResult {
    /// Exactly the files uploaded on this run
    pub uploaded: Vec<DiscoveredFile>,
    /// Per-file failures (file -> cause), collected without aborting the run
    pub failures: Vec<UploadFailure>,
    /// Statistics
    pub stats: SyncStats,
}

/// Orchestrates a full sync run against one document store
pub struct SyncEngine {
    store: Arc<dyn DocumentStore>,
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn DocumentStore>, config: SyncConfig) -> Self {
        Self { store, config }
    }

    /// Run discovery, filtering, and upload for the tree at `root`.
    ///
    /// Discovery and state-persistence errors abort the run; per-file upload
    /// failures are collected in the result while the run continues. The
    /// state store is flushed before returning so the next run sees this
    /// run's records.
    pub async fn run(
        &self,
        root: &Path,
        state: &mut StateStore,
    ) -> Result<SyncResult, SyncError> {
        let started = Instant::now();
        state.set_minimum_timestamp(self.config.minimum_timestamp);

        let discovered = ModuleFinder::discover(root)?;
        let files_discovered = discovered.len();

        let candidates: Vec<DiscoveredFile> = discovered
            .into_iter()
            .filter(|file| self.config.filter.accepts(file))
            .collect();
        let files_filtered = files_discovered - candidates.len();
        let candidate_count = candidates.len();

        let uploader = BatchUploader::new(Arc::clone(&self.store));
        let outcome = uploader
            .upload(candidates, self.config.batch_size, &self.config.replacer, state)
            .await;

        state.flush()?;

        let stats = SyncStats {
            files_discovered,
            files_filtered,
            files_skipped: candidate_count - outcome.uploaded.len() - outcome.failures.len(),
            files_uploaded: outcome.uploaded.len(),
            files_failed: outcome.failures.len(),
            bytes_uploaded: outcome.bytes_uploaded,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        Ok(SyncResult {
            uploaded: outcome.uploaded,
            failures: outcome.failures,
            stats,
        })
    }
}
