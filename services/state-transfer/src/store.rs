//! On-disk snapshot store
//!
//! Snapshots land as single files keyed by the global trade counter,
//! written atomically (tmp file, fsync, rename) so a crash mid-write
//! never leaves a readable-but-partial snapshot behind. Compression is
//! optional and marked by the file extension.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use types::ledger::LedgerSnapshot;
use types::roster::Roster;

use crate::interchange::{decode_snapshot, encode_snapshot};
use crate::wire::InterchangeError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("interchange error: {0}")]
    Interchange(#[from] InterchangeError),

    #[error("compression error: {0}")]
    Compression(String),

    #[error("no snapshots in the store")]
    NoSnapshots,
}

/// Reads and writes interchange snapshots under one directory.
pub struct SnapshotStore {
    dir: PathBuf,
    compress: bool,
}

impl SnapshotStore {
    /// Creates a store rooted at `dir`. `compress` enables zstd for
    /// future writes; reads accept both forms regardless.
    pub fn new(dir: impl Into<PathBuf>, compress: bool) -> Self {
        Self {
            dir: dir.into(),
            compress,
        }
    }

    /// Writes one snapshot, returning its path.
    pub fn write(&self, snapshot: &LedgerSnapshot) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.dir)?;

        let data = encode_snapshot(snapshot)?;
        let (data, ext) = if self.compress {
            let compressed = zstd::encode_all(data.as_slice(), 3)
                .map_err(|e| StoreError::Compression(e.to_string()))?;
            (compressed, "ledger.zst")
        } else {
            (data, "ledger")
        };

        let filename = format!("state-{:012}.{}", snapshot.trades().total(), ext);
        let path = self.dir.join(&filename);
        let tmp_path = self.dir.join(format!("{filename}.tmp"));

        // Atomic write: write to tmp, fsync, rename.
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;

        Ok(path)
    }

    /// Loads one snapshot file, attaching the local roster.
    pub fn load(&self, path: &Path, roster: &Roster) -> Result<LedgerSnapshot, StoreError> {
        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        let is_compressed = path.extension().map(|e| e == "zst").unwrap_or(false);
        let bytes = if is_compressed {
            zstd::decode_all(data.as_slice()).map_err(|e| StoreError::Compression(e.to_string()))?
        } else {
            data
        };

        Ok(decode_snapshot(&bytes, roster)?)
    }

    /// Loads the snapshot with the highest trade counter.
    pub fn load_latest(&self, roster: &Roster) -> Result<LedgerSnapshot, StoreError> {
        let path = self.find_latest()?;
        self.load(&path, roster)
    }

    /// Path of the most advanced snapshot.
    pub fn find_latest(&self) -> Result<PathBuf, StoreError> {
        self.list()?
            .into_iter()
            .last()
            .map(|(_, path)| path)
            .ok_or(StoreError::NoSnapshots)
    }

    /// All stored snapshots as (trade counter, path), ascending.
    pub fn list(&self) -> Result<Vec<(u64, PathBuf)>, StoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with("state-")
                && (name.ends_with(".ledger") || name.ends_with(".ledger.zst"))
            {
                if let Some(key) = Self::parse_key(&name) {
                    results.push((key, entry.path()));
                }
            }
        }
        results.sort_by_key(|(key, _)| *key);
        Ok(results)
    }

    fn parse_key(filename: &str) -> Option<u64> {
        filename
            .trim_start_matches("state-")
            .trim_end_matches(".ledger.zst")
            .trim_end_matches(".ledger")
            .parse::<u64>()
            .ok()
    }
}
