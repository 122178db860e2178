//! Transaction journal.
//!
//! Every broadcast mint is appended to `<dir>/transactions_YYYYMMDD.json`,
//! a JSON array per UTC day.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One journal line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub tx_hash: String,
    pub network: String,
    /// Outcome label, e.g. `success` or `timed_out`.
    pub status: String,
    pub gas_used: u64,
    pub gas_price_gwei: f64,
    pub value_eth: f64,
    pub timestamp: DateTime<Utc>,
}

/// Append-only daily journal files in one directory.
#[derive(Debug, Clone)]
pub struct Journal {
    dir: PathBuf,
}

impl Journal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File an entry with the given timestamp would land in.
    pub fn path_for(&self, timestamp: DateTime<Utc>) -> PathBuf {
        self.dir
            .join(format!("transactions_{}.json", timestamp.format("%Y%m%d")))
    }

    /// Append `entry` to its day's file and return that file's path.
    ///
    /// An unreadable or corrupt file is replaced rather than failing the run.
    pub fn append(&self, entry: &JournalEntry) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(entry.timestamp);

        let mut entries = match read_entries(&path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable journal file");
                Vec::new()
            }
        };
        entries.push(entry.clone());

        fs::write(&path, serde_json::to_vec_pretty(&entries)?)?;
        Ok(path)
    }
}

/// Read every entry from one journal file.
pub fn read_entries(path: &Path) -> io::Result<Vec<JournalEntry>> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
