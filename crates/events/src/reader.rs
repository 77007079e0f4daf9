//! JSONL event reader - sequential reader for replay

use crate::error::EventError;
use crate::record::EventRecord;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Sequential event reader for replay
pub struct EventReader {
    files: Vec<PathBuf>,
}

impl EventReader {
    /// Create a new reader from a directory
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self, EventError> {
        let path = path.as_ref();
        let mut files = Vec::new();

        if path.exists() {
            for entry in std::fs::read_dir(path)? {
                let file_path = entry?.path();
                if file_path.extension().is_some_and(|ext| ext == "jsonl") {
                    files.push(file_path);
                }
            }
        }

        files.sort();
        Ok(Self { files })
    }

    fn read_file(path: &Path) -> Result<Vec<EventRecord>, EventError> {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| EventError::InvalidFile {
                file: path.display().to_string(),
                line: index + 1,
                reason: e.to_string(),
            })?;
            records.push(record);
        }
        Ok(records)
    }

    /// Read all records from all files in order
    pub fn read_all(&self) -> Result<Vec<EventRecord>, EventError> {
        let mut records = Vec::new();
        for file in &self.files {
            records.extend(Self::read_file(file)?);
        }
        Ok(records)
    }

    /// Get the last sequence number from all files
    pub fn last_sequence(&self) -> Result<Option<u64>, EventError> {
        match self.files.last() {
            Some(file) => Ok(Self::read_file(file)?.last().map(|r| r.sequence)),
            None => Ok(None),
        }
    }

    /// Records written by one operation
    pub fn by_correlation(&self, correlation_id: Uuid) -> Result<Vec<EventRecord>, EventError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.correlation_id == correlation_id)
            .collect())
    }

    /// The most recent `n` records, oldest first
    pub fn tail(&self, n: usize) -> Result<Vec<EventRecord>, EventError> {
        let mut records = self.read_all()?;
        let skip = records.len().saturating_sub(n);
        Ok(records.split_off(skip))
    }

    pub fn count(&self) -> Result<usize, EventError> {
        let mut count = 0;
        for file in &self.files {
            let reader = BufReader::new(File::open(file)?);
            for line in reader.lines() {
                if !line?.trim().is_empty() {
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}
