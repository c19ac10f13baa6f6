//! Inclusion filtering for discovered files.
//!
//! A file survives filtering when the include pattern (if any) matches its
//! entire relative path AND its name is in neither the literal exclude set
//! nor the built-in excludes.

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use std::collections::HashSet;

use crate::error::SyncError;
use crate::sync::finder::DiscoveredFile;

/// Default patterns excluded from every sync run
pub const DEFAULT_EXCLUDES: &[&str] = &[
    // Version control
    ".git",
    ".svn",
    ".hg",
    // OS-specific
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
    // Editor leftovers
    "*.swp",
    "*.swo",
    "*~",
];

/// Stateless accept/reject predicate over discovered files
#[derive(Debug, Clone)]
pub struct ModuleFilter {
    /// Anchored include pattern; None accepts everything
    include: Option<Regex>,
    /// Literal filenames to exclude
    exclude_names: HashSet<String>,
    /// Compiled built-in excludes
    builtin: GlobSet,
}

impl Default for ModuleFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleFilter {
    /// Filter with only the built-in excludes configured
    pub fn new() -> Self {
        let mut builder = GlobSetBuilder::new();
        for pattern in DEFAULT_EXCLUDES {
            if let Ok(glob) = Glob::new(pattern) {
                builder.add(glob);
            }
        }

        Self {
            include: None,
            exclude_names: HashSet::new(),
            builtin: builder.build().unwrap_or_else(|_| GlobSet::empty()),
        }
    }

    /// Set the include pattern.
    ///
    /// The pattern must match the entire relative path, not a substring;
    /// compilation failure is a configuration-time error.
    pub fn with_include_pattern(mut self, pattern: &str) -> Result<Self, SyncError> {
        let anchored = format!("^(?:{})$", pattern);
        let regex = Regex::new(&anchored).map_err(|e| SyncError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        self.include = Some(regex);
        Ok(self)
    }

    /// Add literal filenames to exclude
    pub fn with_excluded_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Check whether a discovered file survives filtering
    pub fn accepts(&self, file: &DiscoveredFile) -> bool {
        let name = file.file_name();

        if self.exclude_names.contains(name) {
            return false;
        }

        // Built-in excludes match the filename or any path component,
        // so directory patterns like ".git" prune whole subtrees
        for component in file.relative_path.split('/') {
            if self.builtin.is_match(component) {
                return false;
            }
        }

        match &self.include {
            Some(regex) => regex.is_match(&file.relative_path),
            None => true,
        }
    }
}
