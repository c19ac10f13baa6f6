// End-to-end tests for the sync engine

use anyhow::Result;
use async_trait::async_trait;
use modsync::store::{ContentType, DocumentStore, MemoryStore};
use modsync::sync::{ModuleFilter, StateStore, SyncConfig, SyncEngine, TokenReplacer};
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::common;

/// Store wrapper that fails writes for one configured URI
struct FailingStore {
    inner: MemoryStore,
    fail_uri: Mutex<Option<String>>,
}

impl FailingStore {
    fn new(fail_uri: &str) -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_uri: Mutex::new(Some(fail_uri.to_string())),
        }
    }

    fn heal(&self) {
        *self.fail_uri.lock().unwrap() = None;
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn write(&self, uri: &str, content: Vec<u8>, content_type: ContentType) -> Result<()> {
        if self.fail_uri.lock().unwrap().as_deref() == Some(uri) {
            anyhow::bail!("Injected write failure for {}", uri);
        }
        self.inner.write(uri, content, content_type).await
    }

    async fn exists(&self, uri: &str) -> Result<bool> {
        self.inner.exists(uri).await
    }

    async fn read(&self, uri: &str) -> Result<Vec<u8>> {
        self.inner.read(uri).await
    }
}

#[tokio::test]
async fn test_first_run_uploads_everything_second_run_nothing() {
    let (_dir, root, state_path) = common::sample_workspace();
    let store = Arc::new(MemoryStore::new());
    let engine = SyncEngine::new(store.clone(), SyncConfig::default());
    let mut state = StateStore::open(&state_path).unwrap();

    let first = engine.run(&root, &mut state).await.unwrap();
    assert_eq!(first.uploaded.len(), common::SAMPLE_FILE_COUNT);
    assert!(first.failures.is_empty());
    assert_eq!(store.document_count(), common::SAMPLE_FILE_COUNT);
    assert_eq!(first.stats.files_discovered, common::SAMPLE_FILE_COUNT);
    assert_eq!(first.stats.files_uploaded, common::SAMPLE_FILE_COUNT);
    assert_eq!(first.stats.files_skipped, 0);

    let second = engine.run(&root, &mut state).await.unwrap();
    assert_eq!(second.uploaded.len(), 0);
    assert_eq!(second.stats.files_skipped, common::SAMPLE_FILE_COUNT);
    assert_eq!(store.document_count(), common::SAMPLE_FILE_COUNT);
}

#[tokio::test]
async fn test_touched_file_is_the_only_reload() {
    let (_dir, root, state_path) = common::sample_workspace();
    let store = Arc::new(MemoryStore::new());
    let engine = SyncEngine::new(store.clone(), SyncConfig::default());
    let mut state = StateStore::open(&state_path).unwrap();

    engine.run(&root, &mut state).await.unwrap();
    common::touch_newer(&root.join("services/resource.xqy"));

    let result = engine.run(&root, &mut state).await.unwrap();
    assert_eq!(result.uploaded.len(), 1);
    assert_eq!(result.uploaded[0].relative_path, "services/resource.xqy");
    assert_eq!(store.document_count(), common::SAMPLE_FILE_COUNT);
}

#[tokio::test]
async fn test_state_survives_process_restart() {
    let (_dir, root, state_path) = common::sample_workspace();
    let store = Arc::new(MemoryStore::new());
    let engine = SyncEngine::new(store.clone(), SyncConfig::default());

    {
        let mut state = StateStore::open(&state_path).unwrap();
        engine.run(&root, &mut state).await.unwrap();
    }

    // Fresh state store over the same file stands in for a new process
    let mut state = StateStore::open(&state_path).unwrap();
    let result = engine.run(&root, &mut state).await.unwrap();
    assert_eq!(result.uploaded.len(), 0);
}

#[tokio::test]
async fn test_include_pattern_counts() {
    let cases = [
        (".*transforms.*", 5),
        (".*services.*", 3),
        (".*options.*xml", 3),
        (".*", common::SAMPLE_FILE_COUNT),
        ("no-such-file", 0),
    ];

    for (pattern, expected) in cases {
        let (_dir, root, state_path) = common::sample_workspace();
        let store = Arc::new(MemoryStore::new());
        let config = SyncConfig {
            filter: ModuleFilter::new().with_include_pattern(pattern).unwrap(),
            ..Default::default()
        };
        let engine = SyncEngine::new(store.clone(), config);
        let mut state = StateStore::open(&state_path).unwrap();

        let result = engine.run(&root, &mut state).await.unwrap();
        assert_eq!(
            result.uploaded.len(),
            expected,
            "pattern {:?} should upload {} files",
            pattern,
            expected
        );
        assert_eq!(store.document_count(), expected);
    }
}

#[tokio::test]
async fn test_batch_size_does_not_change_uploaded_set() {
    let mut uploaded_sets = Vec::new();

    for batch_size in [1, 7, 100, 0, -1] {
        let (_dir, root, state_path) = common::sample_workspace();
        let store = Arc::new(MemoryStore::new());
        let config = SyncConfig {
            batch_size,
            ..Default::default()
        };
        let engine = SyncEngine::new(store.clone(), config);
        let mut state = StateStore::open(&state_path).unwrap();

        let result = engine.run(&root, &mut state).await.unwrap();
        let mut uris: Vec<String> = result.uploaded.iter().map(|f| f.uri.clone()).collect();
        uris.sort();
        uploaded_sets.push(uris);
    }

    for set in &uploaded_sets[1..] {
        assert_eq!(set, &uploaded_sets[0]);
    }
    assert_eq!(uploaded_sets[0].len(), common::SAMPLE_FILE_COUNT);
}

#[tokio::test]
async fn test_token_replacement_in_uploaded_documents() {
    let (_dir, root, state_path) = common::sample_workspace();
    let store = Arc::new(MemoryStore::new());
    let config = SyncConfig {
        replacer: TokenReplacer::new().with_token("%%REPLACEME%%", "hello-world"),
        ..Default::default()
    };
    let engine = SyncEngine::new(store.clone(), config);
    let mut state = StateStore::open(&state_path).unwrap();

    engine.run(&root, &mut state).await.unwrap();

    let options = store.read("/rest-api/options/sample-options.xml").await.unwrap();
    let options = String::from_utf8(options).unwrap();
    assert!(options.contains("fn:collection('hello-world')"));
    assert!(!options.contains("%%REPLACEME%%"));

    let service = store.read("/rest-api/services/resource.xqy").await.unwrap();
    let service = String::from_utf8(service).unwrap();
    assert!(service.contains("xdmp:log(\"hello-world called\")"));
}

#[tokio::test]
async fn test_future_minimum_timestamp_defers_all_loads() {
    let (_dir, root, state_path) = common::sample_workspace();
    let store = Arc::new(MemoryStore::new());

    let deferred = SyncConfig {
        minimum_timestamp: chrono::Utc::now().timestamp_millis() + 10_000,
        ..Default::default()
    };
    let engine = SyncEngine::new(store.clone(), deferred);
    let mut state = StateStore::open(&state_path).unwrap();

    let result = engine.run(&root, &mut state).await.unwrap();
    assert_eq!(result.uploaded.len(), 0);
    assert_eq!(store.document_count(), 0);

    // Clearing the override and resetting state loads everything; twice, to
    // prove reset after a run leaves no stale records behind
    let engine = SyncEngine::new(store.clone(), SyncConfig::default());
    for _ in 0..2 {
        state.reset().unwrap();
        let result = engine.run(&root, &mut state).await.unwrap();
        assert_eq!(result.uploaded.len(), common::SAMPLE_FILE_COUNT);
        assert_eq!(store.document_count(), common::SAMPLE_FILE_COUNT);
    }

    let result = engine.run(&root, &mut state).await.unwrap();
    assert_eq!(result.uploaded.len(), 0);
}

#[tokio::test]
async fn test_failed_upload_is_reported_and_retried() {
    let (_dir, root, state_path) = common::sample_workspace();
    let store = Arc::new(FailingStore::new("/rest-api/services/resource.xqy"));
    let engine = SyncEngine::new(store.clone(), SyncConfig::default());
    let mut state = StateStore::open(&state_path).unwrap();

    let first = engine.run(&root, &mut state).await.unwrap();
    assert_eq!(first.uploaded.len(), common::SAMPLE_FILE_COUNT - 1);
    assert_eq!(first.failures.len(), 1);
    assert_eq!(first.failures[0].uri, "/rest-api/services/resource.xqy");
    assert_eq!(first.failures[0].relative_path, "services/resource.xqy");
    assert!(first.failures[0].reason.contains("Injected write failure"));

    // The failed file's record was left untouched, so only it retries
    store.heal();
    let second = engine.run(&root, &mut state).await.unwrap();
    assert_eq!(second.uploaded.len(), 1);
    assert_eq!(second.uploaded[0].uri, "/rest-api/services/resource.xqy");
    assert!(second.failures.is_empty());
}

#[tokio::test]
async fn test_sync_run_with_spaces_in_paths() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("path with spaces");
    fs::create_dir_all(root.join("example dir")).unwrap();
    fs::write(root.join("example dir/example.xqy"), "<example/>").unwrap();

    let store = Arc::new(MemoryStore::new());
    let engine = SyncEngine::new(store.clone(), SyncConfig::default());
    let mut state = StateStore::open(&dir.path().join("sync-state.txt")).unwrap();

    let result = engine.run(&root, &mut state).await.unwrap();
    assert_eq!(result.uploaded.len(), 1);
    let content = store.read("/example dir/example.xqy").await.unwrap();
    assert_eq!(String::from_utf8(content).unwrap().trim(), "<example/>");
}

#[tokio::test]
async fn test_binary_asset_uploaded_untouched() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("modules");
    fs::create_dir_all(root.join("ext")).unwrap();
    let payload = vec![0x89u8, 0x50, 0x4e, 0x47, 0xff, 0x00, 0x25, 0x25];
    fs::write(root.join("ext/logo.png"), &payload).unwrap();

    let store = Arc::new(MemoryStore::new());
    let config = SyncConfig {
        replacer: TokenReplacer::new().with_token("%%", "boom"),
        ..Default::default()
    };
    let engine = SyncEngine::new(store.clone(), config);
    let mut state = StateStore::open(&dir.path().join("sync-state.txt")).unwrap();

    engine.run(&root, &mut state).await.unwrap();
    assert_eq!(store.read("/ext/logo.png").await.unwrap(), payload);
    assert_eq!(store.content_type_of("/ext/logo.png"), Some(ContentType::Binary));
}
