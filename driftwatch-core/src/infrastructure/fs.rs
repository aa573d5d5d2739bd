// driftwatch-core/src/infrastructure/fs.rs

use fd_lock::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::infrastructure::error::InfrastructureError;

/// Write content to a file atomically using a temporary file.
///
/// The temporary file lives in the target's directory so the final rename
/// never crosses filesystems. Readers see either the old content or the new
/// one, never a partial write.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(InfrastructureError::Io)?;

    temp_file
        .write_all(content.as_ref())
        .map_err(InfrastructureError::Io)?;
    temp_file.as_file().sync_all()?;

    // Atomic rename (persist)
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

/// Writes a file that must not exist yet. Snapshots are never overwritten.
pub fn create_new<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(content.as_ref())?;
    file.sync_all()?;
    Ok(())
}

/// Opens (or creates) an empty sidecar file used only for advisory locking.
///
/// The lock is held on the sidecar, not on the data file, because atomic
/// rewrites replace the data file's inode.
pub fn open_lock(path: &Path) -> Result<RwLock<File>, InfrastructureError> {
    ensure_parent(path)?;
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    Ok(RwLock::new(file))
}

/// `data.jsonl` → `data.jsonl.lock`
pub fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

pub fn ensure_parent(path: &Path) -> Result<(), InfrastructureError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// One JSON document per line, newline-terminated.
pub fn to_jsonl<T: Serialize>(rows: &[T]) -> Result<String, InfrastructureError> {
    let mut out = String::new();
    for row in rows {
        out.push_str(&serde_json::to_string(row)?);
        out.push('\n');
    }
    Ok(out)
}

/// Parses a JSONL file written by driftwatch itself. A missing file is an
/// empty store; a bad line is corruption.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, InfrastructureError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    let mut rows = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(line).map_err(|e| InfrastructureError::Corrupted {
            path: path.to_path_buf(),
            line: idx + 1,
            reason: e.to_string(),
        })?;
        rows.push(row);
    }
    Ok(rows)
}
