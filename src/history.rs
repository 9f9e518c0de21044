//! Chat history: a capped, append-only JSON log of answered questions.
//!
//! Records live in `chat_history.json` under the base directory. Only the
//! newest `max_records` are kept; older ones are evicted on append.

use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::lock::FileLock;
use crate::storage::{BackendLocal, StorageManager};

const HISTORY_FILE: &str = "chat_history.json";
const HISTORY_LOCK_FILE: &str = "chat_history.lock";

/// Default number of records kept on disk
pub const DEFAULT_MAX_RECORDS: usize = 50;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: String,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("history file is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write/read contract the query path depends on.
pub trait HistoryLog: Send + Sync {
    fn record(&self, question: &str, answer: &str) -> Result<(), HistoryError>;

    /// Up to `limit` most recent records, oldest first.
    fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, HistoryError>;
}

pub struct ChatHistory {
    store: BackendLocal,
    max_records: usize,
    write_lock: Mutex<()>,
}

impl ChatHistory {
    pub fn open(base_path: &Path, max_records: usize) -> Result<Self, HistoryError> {
        Ok(Self {
            store: BackendLocal::new(base_path)?,
            max_records,
            write_lock: Mutex::new(()),
        })
    }

    fn load(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        if !self.store.exists(HISTORY_FILE) {
            return Ok(vec![]);
        }

        let data = self.store.read(HISTORY_FILE)?;
        Ok(serde_json::from_slice(&data)?)
    }

    fn save(&self, records: &[HistoryRecord]) -> Result<(), HistoryError> {
        let data = serde_json::to_vec_pretty(records)?;
        self.store.write(HISTORY_FILE, &data)?;
        Ok(())
    }
}

impl HistoryLog for ChatHistory {
    fn record(&self, question: &str, answer: &str) -> Result<(), HistoryError> {
        // a poisoned guard protects nothing but the file, which is rewritten whole
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let _file_lock = FileLock::acquire_blocking(&self.store.path(HISTORY_LOCK_FILE))?;

        let mut records = self.load()?;
        records.push(HistoryRecord {
            timestamp: chrono::Local::now().to_rfc3339(),
            question: question.to_string(),
            answer: answer.to_string(),
        });

        if records.len() > self.max_records {
            let excess = records.len() - self.max_records;
            records.drain(..excess);
        }

        self.save(&records)
    }

    fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, HistoryError> {
        let mut records = self.load()?;
        if records.len() > limit {
            records.drain(..records.len() - limit);
        }
        Ok(records)
    }
}

/// Append to the log without letting a failure reach the caller.
pub fn record_best_effort(history: &dyn HistoryLog, question: &str, answer: &str) {
    if let Err(err) = history.record(question, answer) {
        log::error!("failed to save chat history: {err}");
    }
}
