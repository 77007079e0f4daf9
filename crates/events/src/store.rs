//! JSONL event store - append-only writer

use crate::error::EventError;
use crate::reader::EventReader;
use crate::record::EventRecord;
use cdp_core::ProtocolEvent;
use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Append-only JSONL event store
pub struct EventStore {
    base_path: PathBuf,
    current_file: Option<BufWriter<File>>,
    current_date: Option<String>,
    next_sequence: u64,
}

impl EventStore {
    /// Open the store at `base_path`, continuing after the last recorded sequence
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self, EventError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        let last = EventReader::from_directory(&base_path)?.last_sequence()?;

        Ok(Self {
            base_path,
            current_file: None,
            current_date: None,
            next_sequence: last.map_or(1, |s| s + 1),
        })
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Append the events of one committed operation under a fresh correlation id
    pub fn append(&mut self, events: Vec<ProtocolEvent>) -> Result<Vec<EventRecord>, EventError> {
        self.append_at(events, Utc::now())
    }

    pub(crate) fn append_at(
        &mut self,
        events: Vec<ProtocolEvent>,
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<EventRecord>, EventError> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let date = timestamp.format("%Y-%m-%d").to_string();
        if self.current_date.as_ref() != Some(&date) {
            self.rotate_file(&date)?;
        }

        let correlation_id = Uuid::new_v4();
        let mut records = Vec::with_capacity(events.len());
        for event in events {
            records.push(EventRecord {
                sequence: self.next_sequence + records.len() as u64,
                timestamp,
                correlation_id,
                event,
            });
        }

        if let Some(ref mut writer) = self.current_file {
            for record in &records {
                let json = serde_json::to_string(record)?;
                writeln!(writer, "{}", json)?;
            }
            writer.flush()?;
        }
        self.next_sequence += records.len() as u64;

        tracing::debug!(
            correlation_id = %correlation_id,
            count = records.len(),
            next_sequence = self.next_sequence,
            "Events appended"
        );
        Ok(records)
    }

    /// Rotate to a new file for the given date
    fn rotate_file(&mut self, date: &str) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }

        let file_path = self.base_path.join(format!("{}.jsonl", date));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        self.current_file = Some(BufWriter::new(file));
        self.current_date = Some(date.to_string());
        Ok(())
    }

    /// List all JSONL files in the store
    pub fn list_files(&self) -> Result<Vec<PathBuf>, EventError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "jsonl") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Flush and close the current file
    pub fn close(&mut self) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }
        self.current_file = None;
        self.current_date = None;
        Ok(())
    }
}

impl Drop for EventStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
