use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Content-type hint attached to each document write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Xml,
    Json,
    Text,
    Binary,
}

impl ContentType {
    /// Classify a file by extension.
    ///
    /// Extension-based classification is a deliberate policy choice: content
    /// sniffing would make substitution behavior depend on file bytes, which
    /// is harder to reason about for callers laying out a module tree.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match ext.as_deref() {
            Some("xml") | Some("xsl") | Some("xslt") | Some("xhtml") | Some("html") => {
                ContentType::Xml
            }
            Some("json") => ContentType::Json,
            Some("xqy") | Some("sjs") | Some("js") | Some("mjs") | Some("txt") | Some("md")
            | Some("css") | Some("properties") => ContentType::Text,
            _ => ContentType::Binary,
        }
    }

    /// MIME string for transports that want one
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Xml => "application/xml",
            ContentType::Json => "application/json",
            ContentType::Text => "text/plain",
            ContentType::Binary => "application/octet-stream",
        }
    }

    /// Whether token substitution may touch this content
    pub fn is_text(&self) -> bool {
        !matches!(self, ContentType::Binary)
    }
}

/// Unified document store trait for all remote store providers
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write a document at the given logical URI
    async fn write(&self, uri: &str, content: Vec<u8>, content_type: ContentType) -> Result<()>;

    /// Check whether a document exists (callers/tests, not the upload path)
    async fn exists(&self, uri: &str) -> Result<bool>;

    /// Read a document's bytes (callers/tests, not the upload path)
    async fn read(&self, uri: &str) -> Result<Vec<u8>>;

    /// Evaluate a query string against the store, returning a scalar result.
    /// Only used by verification tooling; stores without a query engine keep
    /// the default and reject.
    async fn eval_query(&self, query: &str) -> Result<String> {
        anyhow::bail!("Query evaluation is not supported by this store: {}", query)
    }
}
