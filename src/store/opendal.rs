use anyhow::{Context, Result};
use async_trait::async_trait;
use opendal::{services, Operator};
use std::path::Path;

use crate::store::document::{ContentType, DocumentStore};

/// Document store backed by an opendal [`Operator`].
///
/// Any service opendal supports can sit behind this; `local` wires up the
/// filesystem service, which is what CI and local deployments use.
pub struct OpendalStore {
    op: Operator,
}

impl OpendalStore {
    pub fn new(op: Operator) -> Self {
        Self { op }
    }

    /// Store rooted at a local directory
    pub fn local(root: &Path) -> Result<Self> {
        let builder = services::Fs::default().root(&root.to_string_lossy());
        let op = Operator::new(builder)
            .with_context(|| format!("Failed to configure local store at {}", root.display()))?
            .finish();
        Ok(Self { op })
    }

    // Logical URIs carry a leading slash; opendal keys are root-relative.
    fn key(uri: &str) -> &str {
        uri.trim_start_matches('/')
    }
}

#[async_trait]
impl DocumentStore for OpendalStore {
    async fn write(&self, uri: &str, content: Vec<u8>, _content_type: ContentType) -> Result<()> {
        self.op
            .write(Self::key(uri), content)
            .await
            .with_context(|| format!("Failed to write document {}", uri))?;
        Ok(())
    }

    async fn exists(&self, uri: &str) -> Result<bool> {
        self.op
            .exists(Self::key(uri))
            .await
            .with_context(|| format!("Failed to stat document {}", uri))
    }

    async fn read(&self, uri: &str) -> Result<Vec<u8>> {
        let buffer = self
            .op
            .read(Self::key(uri))
            .await
            .with_context(|| format!("Failed to read document {}", uri))?;
        Ok(buffer.to_vec())
    }
}
