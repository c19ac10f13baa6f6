//! Batched upload of discovered files.
//!
//! Batches bound the number of simultaneous in-flight writes against the
//! remote store: batches run sequentially, members within a batch upload
//! concurrently. A failed member never aborts its batch or the run.

use anyhow::Context;
use std::sync::Arc;

use crate::store::DocumentStore;
use crate::sync::finder::DiscoveredFile;
use crate::sync::state::StateStore;
use crate::sync::tokens::TokenReplacer;

/// Default number of files uploaded per batch
pub const DEFAULT_BATCH_SIZE: i32 = 100;

/// One file that failed to upload, reported after the run completes
#[derive(Debug, Clone)]
pub struct UploadFailure {
    pub uri: String,
    pub relative_path: String,
    pub reason: String,
}

/// Result of an upload pass
#[derive(Debug, Default)]
pub struct UploadOutcome {
    /// Exactly the files whose store write succeeded
    pub uploaded: Vec<DiscoveredFile>,
    /// Per-file failures; their incremental records are left untouched so a
    /// future run retries them
    pub failures: Vec<UploadFailure>,
    /// Bytes written to the store (after token substitution)
    pub bytes_uploaded: u64,
}

/// Uploads discovered files to a document store in bounded batches
pub struct BatchUploader {
    store: Arc<dyn DocumentStore>,
}

impl BatchUploader {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Partition files into batches of `batch_size` members.
    ///
    /// Any size below 1 is tolerated as "one batch containing everything";
    /// non-empty input never produces zero batches.
    pub fn plan_batches(files: Vec<DiscoveredFile>, batch_size: i32) -> Vec<Vec<DiscoveredFile>> {
        if files.is_empty() {
            return Vec::new();
        }
        if batch_size < 1 {
            return vec![files];
        }
        files
            .chunks(batch_size as usize)
            .map(|chunk| chunk.to_vec())
            .collect()
    }

    /// Upload every file the state store considers stale.
    ///
    /// Per member: read bytes, apply token substitution, write to the store
    /// at the file's logical URI, and record the load on success.
    pub async fn upload(
        &self,
        files: Vec<DiscoveredFile>,
        batch_size: i32,
        replacer: &TokenReplacer,
        state: &StateStore,
    ) -> UploadOutcome {
        let pending: Vec<DiscoveredFile> = files
            .into_iter()
            .filter(|file| state.should_load(&file.state_key(), file.modified_millis()))
            .collect();

        let mut outcome = UploadOutcome::default();

        for batch in Self::plan_batches(pending, batch_size) {
            let uploads = batch.into_iter().map(|file| async move {
                let result = self.upload_one(&file, replacer).await;
                (file, result)
            });

            for (file, result) in futures::future::join_all(uploads).await {
                match result {
                    Ok(bytes) => {
                        state.record_loaded(file.state_key(), file.modified_millis());
                        outcome.bytes_uploaded += bytes;
                        outcome.uploaded.push(file);
                    }
                    Err(e) => outcome.failures.push(UploadFailure {
                        uri: file.uri.clone(),
                        relative_path: file.relative_path.clone(),
                        reason: format!("{:#}", e),
                    }),
                }
            }
        }

        outcome
    }

    async fn upload_one(
        &self,
        file: &DiscoveredFile,
        replacer: &TokenReplacer,
    ) -> anyhow::Result<u64> {
        let content = tokio::fs::read(&file.path)
            .await
            .with_context(|| format!("Failed to read {}", file.path.display()))?;
        let content = replacer.transform(&file.path, content);
        let bytes = content.len() as u64;

        self.store
            .write(&file.uri, content, file.content_type())
            .await
            .with_context(|| format!("Failed to write {}", file.uri))?;

        Ok(bytes)
    }
}
