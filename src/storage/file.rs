//! File-backed persistence as JSON lines.
//!
//! One record per line keeps the files diffable and append-friendly.
//! Saves write the full file to a sibling temp path and rename it into
//! place, so a crash mid-save never leaves a truncated store behind.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::monitoring::{MonitoringPoint, MonitoringStore};
use crate::notify::{NotificationLedger, NotificationRecord};
use crate::providers::{LedgerRepository, MonitoringRepository, StorageError};
use crate::track::PhaseFamily;

fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StorageError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

fn write_lines<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("jsonl.tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        for record in records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Monitoring persistence under a directory, one JSON-lines file per
/// phase family.
#[derive(Debug)]
pub struct FileMonitoringRepository {
    dir: PathBuf,
}

impl FileMonitoringRepository {
    /// Persists under `dir`, created on first save if missing.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, family: PhaseFamily) -> PathBuf {
        self.dir.join(format!("{}_monitoring.jsonl", family.tag()))
    }
}

impl MonitoringRepository for FileMonitoringRepository {
    fn load(&self, family: PhaseFamily) -> Result<MonitoringStore, StorageError> {
        let points: Vec<MonitoringPoint> = read_lines(&self.path(family))?;
        Ok(MonitoringStore::from_points(points))
    }

    fn save(&self, family: PhaseFamily, store: &MonitoringStore) -> Result<(), StorageError> {
        write_lines(&self.path(family), store.points())
    }
}

/// Ledger persistence as one JSON-lines file.
#[derive(Debug)]
pub struct FileLedgerRepository {
    path: PathBuf,
}

impl FileLedgerRepository {
    /// Persists at `path`, created on first save if missing.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LedgerRepository for FileLedgerRepository {
    fn load(&self) -> Result<NotificationLedger, StorageError> {
        let records: Vec<NotificationRecord> = read_lines(&self.path)?;
        Ok(NotificationLedger::from_records(records))
    }

    fn save(&self, ledger: &NotificationLedger) -> Result<(), StorageError> {
        write_lines(&self.path, ledger.records())
    }
}
