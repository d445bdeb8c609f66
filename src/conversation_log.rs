use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: u32,
    pub timestamp: String,
    pub prompt: String,
    pub response: String,
    pub model: String,
    pub response_length: usize,
}

/// A window onto the stored history, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub total: usize,
    pub records: Vec<ConversationRecord>,
}

/// Bounded history of prompt/response pairs kept in a single JSON file.
///
/// Every operation goes back to disk; nothing is cached between calls. The
/// whole file is rewritten on each append, which only stays cheap because
/// retention is capped.
pub struct ConversationLog {
    path: PathBuf,
    max_records: usize,
    write_lock: Mutex<()>,
}

impl ConversationLog {
    pub fn open(path: impl Into<PathBuf>, max_records: usize) -> Self {
        let path = path.into();

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(dir) {
                warn!("Could not create storage directory {:?}: {}", dir, e);
            }
        }

        Self {
            path,
            max_records: max_records.max(1),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn try_load(&self) -> Result<Vec<ConversationRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let records = serde_json::from_str(&content)?;
        Ok(records)
    }

    /// Like [`try_load`](Self::try_load), but any failure is logged and
    /// reported as an empty history.
    pub fn load(&self) -> Vec<ConversationRecord> {
        self.try_load().unwrap_or_else(|e| {
            warn!("Error loading conversations from {:?}: {}", self.path, e);
            Vec::new()
        })
    }

    pub fn append(
        &self,
        prompt: &str,
        response: &str,
        model: &str,
    ) -> Result<ConversationRecord, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut records = self.load();
        let mut record = ConversationRecord {
            id: records.len() as u32 + 1,
            timestamp: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            prompt: prompt.to_string(),
            response: response.to_string(),
            model: model.to_string(),
            response_length: response.chars().count(),
        };
        records.push(record.clone());

        if records.len() > self.max_records {
            let excess = records.len() - self.max_records;
            records.drain(..excess);
            for (i, record) in records.iter_mut().enumerate() {
                record.id = i as u32 + 1;
            }
            debug!("Trimmed {} old conversation(s)", excess);
        }
        // The new record is always last.
        record.id = records.len() as u32;

        if let Err(e) = self.save(&records) {
            warn!("Failed to save conversation to {:?}: {}", self.path, e);
            return Err(e);
        }

        info!("Saved conversation #{}", record.id);
        Ok(record)
    }

    /// Sibling file the next version is written to before it replaces the log.
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Readers only ever see the old or the new document, never a partial one.
    fn save(&self, records: &[ConversationRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records)?;
        let staging = self.staging_path();
        fs::write(&staging, json)?;
        if let Err(e) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.load().len()
    }

    pub fn get(&self, id: u32) -> Option<ConversationRecord> {
        self.load().into_iter().find(|r| r.id == id)
    }

    pub fn page(&self, limit: usize, offset: usize) -> Page {
        let records = self.load();
        let total = records.len();
        let records = records.into_iter().skip(offset).take(limit).collect();
        Page { total, records }
    }

    /// The newest `n` records, newest first.
    pub fn recent(&self, n: usize) -> Vec<ConversationRecord> {
        let mut records = self.load();
        let start = records.len().saturating_sub(n);
        records.drain(..start);
        records.reverse();
        records
    }
}
