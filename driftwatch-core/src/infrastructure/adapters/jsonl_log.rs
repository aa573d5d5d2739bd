// driftwatch-core/src/infrastructure/adapters/jsonl_log.rs

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::domain::error::DomainError;
use crate::domain::record::PredictionRecord;
use crate::error::DriftwatchError;
use crate::infrastructure::fs::{atomic_write, ensure_parent, lock_path, open_lock};
use crate::ports::prediction_log::{LogWindow, PredictionLog};

/// Prediction log stored as one JSON record per line.
///
/// Appends and prefix removal hold an exclusive advisory lock on
/// `<log>.lock`, so they are serialized across instances and processes
/// sharing the file. Every append is a single `write_all` of a complete line
/// in append mode, and readers ignore a trailing line without its `\n`, so
/// they never see half a record.
pub struct JsonlPredictionLog {
    path: PathBuf,
    lock: PathBuf,
}

impl JsonlPredictionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            lock: lock_path(&path),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `f` while holding the write lock. Blocks until it is free.
    fn exclusive<T>(
        &self,
        f: impl FnOnce() -> Result<T, DriftwatchError>,
    ) -> Result<T, DriftwatchError> {
        let mut lock = open_lock(&self.lock)?;
        let _guard = lock.write()?;
        f()
    }

    fn read_bytes(&self) -> Result<Vec<u8>, DriftwatchError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn scan(&self) -> Result<LogWindow, DriftwatchError> {
        let bytes = self.read_bytes()?;
        Ok(parse_complete_lines(&bytes))
    }
}

/// Decodes every `\n`-terminated line. Undecodable lines are reported, not fatal.
fn parse_complete_lines(bytes: &[u8]) -> LogWindow {
    let mut window = LogWindow::default();
    // Everything before the last newline; a trailing fragment is an append in progress.
    let complete = match bytes.iter().rposition(|b| *b == b'\n') {
        Some(last) => &bytes[..last],
        None => return window,
    };

    for (idx, raw) in complete.split(|b| *b == b'\n').enumerate() {
        window.lines += 1;
        if raw.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice::<PredictionRecord>(raw) {
            Ok(record) => window.records.push(record),
            Err(e) => {
                let err = DomainError::MalformedRecord {
                    line: idx + 1,
                    reason: e.to_string(),
                };
                warn!(error = %err, "Skipping malformed prediction log line");
                window.malformed.push(err);
            }
        }
    }
    window
}

impl PredictionLog for JsonlPredictionLog {
    fn append(&self, record: &PredictionRecord) -> Result<(), DriftwatchError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        self.exclusive(|| {
            ensure_parent(&self.path)?;
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            file.write_all(&line)?;
            Ok(())
        })
    }

    fn tail(&self, n: usize) -> Result<LogWindow, DriftwatchError> {
        let mut window = self.scan()?;
        let skip = window.records.len().saturating_sub(n);
        window.records.drain(..skip);
        Ok(window)
    }

    fn read_all(&self) -> Result<LogWindow, DriftwatchError> {
        self.scan()
    }

    fn len(&self) -> Result<usize, DriftwatchError> {
        let bytes = self.read_bytes()?;
        Ok(bytes.iter().filter(|b| **b == b'\n').count())
    }

    fn truncate_prefix(&self, lines: usize) -> Result<(), DriftwatchError> {
        if lines == 0 {
            return Ok(());
        }
        // Read and rewrite under one lock: an append cannot land between
        // them and be lost with the replaced file.
        self.exclusive(|| {
            let bytes = self.read_bytes()?;
            let cut = bytes
                .iter()
                .enumerate()
                .filter(|(_, b)| **b == b'\n')
                .nth(lines - 1)
                .map(|(pos, _)| pos + 1)
                .unwrap_or(bytes.len());

            atomic_write(&self.path, &bytes[cut..])?;
            debug!(path = ?self.path, lines, "Pruned merged prediction log prefix");
            Ok(())
        })
    }
}
