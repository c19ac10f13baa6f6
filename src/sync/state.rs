// Incremental state module
// Reads and writes the plain text timestamp database that makes repeated
// runs over an unchanged tree load zero files

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::SyncError;

/// Persisted map from file path to last-loaded timestamp (epoch millis).
///
/// An explicit, injected object with an open/flush lifecycle: nothing here is
/// process-global, so parallel runs over different trees never share state.
/// Updates are serialized through an interior mutex because uploads within a
/// batch record their completions concurrently.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    records: Mutex<HashMap<String, i64>>,
    minimum_timestamp: i64,
}

impl StateStore {
    /// Open a state store backed by the given file.
    ///
    /// A missing file is an empty store; malformed lines in an existing file
    /// are skipped with a warning, which at worst forces a reload. A file
    /// is never silently dropped from consideration.
    pub fn open(path: &Path) -> Result<Self, SyncError> {
        let records = if path.exists() {
            Self::read_records(path)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            records: Mutex::new(records),
            minimum_timestamp: 0,
        })
    }

    fn read_records(path: &Path) -> Result<HashMap<String, i64>, SyncError> {
        let file = File::open(path)
            .map_err(|e| SyncError::state_store(e, "opening", path.to_path_buf()))?;
        let reader = BufReader::new(file);
        let mut records = HashMap::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result
                .map_err(|e| SyncError::state_store(e, "reading", path.to_path_buf()))?;

            if line.trim().is_empty() {
                continue;
            }

            match Self::parse_line(&line) {
                Some((key, millis)) => {
                    records.insert(key, millis);
                }
                None => {
                    eprintln!(
                        "Warning: Skipping malformed line {} in state file {}: {}",
                        line_num + 1,
                        path.display(),
                        line
                    );
                }
            }
        }

        Ok(records)
    }

    /// Parse a single line from the state file
    /// Expected format: `<epoch-millis>  <path>` (two spaces between fields)
    /// Returns None if the line is malformed
    /// Note: Paths may contain single spaces, so only the first delimiter splits
    pub fn parse_line(line: &str) -> Option<(String, i64)> {
        let (millis_str, key) = line.split_once("  ")?;
        let millis = millis_str.trim().parse::<i64>().ok()?;
        let key = key.trim();

        if key.is_empty() {
            return None;
        }

        Some((key.to_string(), millis))
    }

    /// Write a single record to the output writer
    /// Format: `<epoch-millis>  <path>` (two spaces between fields)
    pub fn write_entry(writer: &mut impl Write, millis: i64, key: &str) -> io::Result<()> {
        writeln!(writer, "{}  {}", millis, key)
    }

    /// Decide whether a file needs (re)loading.
    ///
    /// A configured minimum timestamp above the file's modification time
    /// forces a skip regardless of stored state; otherwise a file loads when
    /// it has no record or is strictly newer than its record.
    pub fn should_load(&self, key: &str, modified_millis: i64) -> bool {
        if self.minimum_timestamp > 0 && modified_millis < self.minimum_timestamp {
            return false;
        }

        match self.records.lock().unwrap().get(key) {
            None => true,
            Some(&recorded) => modified_millis > recorded,
        }
    }

    /// Upsert the record for a successfully loaded file
    pub fn record_loaded(&self, key: impl Into<String>, modified_millis: i64) {
        self.records.lock().unwrap().insert(key.into(), modified_millis);
    }

    /// Set the minimum-timestamp-to-load override; 0 clears it
    pub fn set_minimum_timestamp(&mut self, millis: i64) {
        self.minimum_timestamp = millis;
    }

    pub fn minimum_timestamp(&self) -> i64 {
        self.minimum_timestamp
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }

    /// Drop all records and delete the backing file.
    ///
    /// Idempotent: resetting twice, or resetting a store that never flushed,
    /// succeeds and leaves the store empty.
    pub fn reset(&self) -> Result<(), SyncError> {
        self.records.lock().unwrap().clear();

        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::state_store(e, "deleting", self.path.clone())),
        }
    }

    /// Persist all records to the backing file, sorted by key for stable
    /// output
    pub fn flush(&self) -> Result<(), SyncError> {
        let records = self.records.lock().unwrap();
        let mut entries: Vec<(&String, &i64)> = records.iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));

        let file = File::create(&self.path)
            .map_err(|e| SyncError::state_store(e, "creating", self.path.clone()))?;
        let mut writer = BufWriter::new(file);

        for (key, millis) in entries {
            Self::write_entry(&mut writer, *millis, key)
                .map_err(|e| SyncError::state_store(e, "writing", self.path.clone()))?;
        }

        writer
            .flush()
            .map_err(|e| SyncError::state_store(e, "writing", self.path.clone()))
    }
}
