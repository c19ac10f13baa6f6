//! Module tree discovery and classification.
//!
//! Walks a root directory and assigns each file a category based on where
//! it sits in the tree, plus the logical URI it will occupy in the remote
//! document store.

use chrono::{DateTime, Utc};
use jwalk::WalkDir;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SyncError;
use crate::store::ContentType;

/// Special top-level directory names recognized during discovery
pub const EXT_DIR: &str = "ext";
pub const OPTIONS_DIR: &str = "options";
pub const TRANSFORMS_DIR: &str = "transforms";
pub const SERVICES_DIR: &str = "services";
pub const NAMESPACES_DIR: &str = "namespaces";

/// Category assigned to a discovered file based on its location in the tree.
///
/// Closed set by design: callers match on it exhaustively instead of probing
/// for directory names themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleCategory {
    /// REST extension asset under `ext/` (any depth)
    Asset,
    /// Library module anywhere else under the root
    Library,
    /// Query options file directly under `options/`
    Options,
    /// Transform directly under `transforms/`
    Transform,
    /// Resource service directly under `services/`
    Service,
    /// Namespace declaration directly under `namespaces/`
    Namespace,
}

impl ModuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleCategory::Asset => "asset",
            ModuleCategory::Library => "library",
            ModuleCategory::Options => "options",
            ModuleCategory::Transform => "transform",
            ModuleCategory::Service => "service",
            ModuleCategory::Namespace => "namespace",
        }
    }
}

/// A file found during discovery, with the destination URI already assigned.
///
/// Transient: rebuilt on every run, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredFile {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the discovery root, forward-slash separated
    pub relative_path: String,
    /// Category derived from the file's location
    pub category: ModuleCategory,
    /// Destination URI in the remote store
    pub uri: String,
    /// Size in bytes
    pub size: u64,
    /// Last-modified timestamp
    pub modified: DateTime<Utc>,
}

impl DiscoveredFile {
    /// Last-modified as epoch milliseconds, the unit the state store persists
    pub fn modified_millis(&self) -> i64 {
        self.modified.timestamp_millis()
    }

    /// Final path component
    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }

    /// Content-type hint for the store write
    pub fn content_type(&self) -> ContentType {
        ContentType::from_path(&self.path)
    }

    /// Key under which this file's incremental record is stored
    pub fn state_key(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Map a (category, relative path) pair to its destination URI.
///
/// Pure function: identical inputs always produce the identical URI, and two
/// distinct files in one tree never collide (the fixed prefixes are not legal
/// library subtree names).
pub fn logical_uri(category: ModuleCategory, relative_path: &str) -> String {
    let name = relative_path.rsplit('/').next().unwrap_or(relative_path);
    match category {
        ModuleCategory::Asset | ModuleCategory::Library => format!("/{}", relative_path),
        ModuleCategory::Options => format!("/rest-api/options/{}", name),
        ModuleCategory::Transform => format!("/rest-api/transforms/{}", name),
        ModuleCategory::Service => format!("/rest-api/services/{}", name),
        ModuleCategory::Namespace => format!("/namespaces/{}", name),
    }
}

/// Discovers and classifies every file under a module root
pub struct ModuleFinder;

impl ModuleFinder {
    /// Walk `root` and return every classifiable file, sorted by relative
    /// path.
    ///
    /// An empty tree yields an empty vec; a missing or non-directory root is
    /// an error. Files nested deeper than one level inside the options,
    /// transforms, services, and namespaces directories are not modules and
    /// are not discovered.
    pub fn discover(root: &Path) -> Result<Vec<DiscoveredFile>, SyncError> {
        let metadata = fs::metadata(root).map_err(|_| SyncError::RootNotFound {
            path: root.to_path_buf(),
        })?;
        if !metadata.is_dir() {
            return Err(SyncError::NotADirectory {
                path: root.to_path_buf(),
            });
        }
        // Probe readability up front so an unreadable root fails the run
        // before any upload is attempted
        fs::read_dir(root).map_err(|e| SyncError::Discovery {
            path: root.to_path_buf(),
            source: e,
        })?;

        let mut files = Vec::new();

        for entry in WalkDir::new(root).sort(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    eprintln!("Warning: Cannot read directory entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative_path = relative_to(root, &path);
            let Some(category) = classify(&relative_path) else {
                continue;
            };

            let metadata = fs::metadata(&path).map_err(|e| SyncError::Discovery {
                path: path.clone(),
                source: e,
            })?;
            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            let uri = logical_uri(category, &relative_path);
            files.push(DiscoveredFile {
                path,
                relative_path,
                category,
                uri,
                size: metadata.len(),
                modified,
            });
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }
}

/// Forward-slash relative path, regardless of platform separator
fn relative_to(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Classify a file by its relative path; None means the file is not a module
fn classify(relative_path: &str) -> Option<ModuleCategory> {
    let depth = relative_path.split('/').count();
    let first = relative_path.split('/').next().unwrap_or(relative_path);

    if depth == 1 {
        return Some(ModuleCategory::Library);
    }

    match first {
        EXT_DIR => Some(ModuleCategory::Asset),
        OPTIONS_DIR if depth == 2 => Some(ModuleCategory::Options),
        TRANSFORMS_DIR if depth == 2 => Some(ModuleCategory::Transform),
        SERVICES_DIR if depth == 2 => Some(ModuleCategory::Service),
        NAMESPACES_DIR if depth == 2 => Some(ModuleCategory::Namespace),
        OPTIONS_DIR | TRANSFORMS_DIR | SERVICES_DIR | NAMESPACES_DIR => None,
        _ => Some(ModuleCategory::Library),
    }
}
