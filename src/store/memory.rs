use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::store::document::{ContentType, DocumentStore};

/// A stored document with its content-type hint
#[derive(Debug, Clone)]
struct Document {
    content: Vec<u8>,
    content_type: ContentType,
}

/// In-memory document store.
///
/// Backs tests and verification tooling; supports a tiny query surface
/// (`count()` and `doc-available('<uri>')`) so callers can assert on store
/// state without reaching into internals.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored
    pub fn document_count(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    /// Content-type hint recorded for a document, if present
    pub fn content_type_of(&self, uri: &str) -> Option<ContentType> {
        self.documents
            .lock()
            .unwrap()
            .get(uri)
            .map(|doc| doc.content_type)
    }

    /// Drop all documents
    pub fn clear(&self) {
        self.documents.lock().unwrap().clear();
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn write(&self, uri: &str, content: Vec<u8>, content_type: ContentType) -> Result<()> {
        self.documents.lock().unwrap().insert(
            uri.to_string(),
            Document {
                content,
                content_type,
            },
        );
        Ok(())
    }

    async fn exists(&self, uri: &str) -> Result<bool> {
        Ok(self.documents.lock().unwrap().contains_key(uri))
    }

    async fn read(&self, uri: &str) -> Result<Vec<u8>> {
        self.documents
            .lock()
            .unwrap()
            .get(uri)
            .map(|doc| doc.content.clone())
            .ok_or_else(|| anyhow::anyhow!("Document not found: {}", uri))
    }

    async fn eval_query(&self, query: &str) -> Result<String> {
        let documents = self.documents.lock().unwrap();

        if query == "count()" {
            return Ok(documents.len().to_string());
        }

        if let Some(uri) = query
            .strip_prefix("doc-available('")
            .and_then(|rest| rest.strip_suffix("')"))
        {
            return Ok(documents.contains_key(uri).to_string());
        }

        anyhow::bail!("Unsupported query: {}", query)
    }
}
