//! Snapshot persistence for backlog data.
//!
//! Each workspace directory gets its own data directory at
//! `~/.local/share/backlog/<hash>/`, where `<hash>` is derived from the
//! canonicalized workspace path. The backlog lives there as a single
//! pretty-printed JSON snapshot (`backlog.json`) that is rewritten
//! atomically after every mutating command and loaded once at startup.
//!
//! A missing snapshot degrades gracefully to an empty default backlog; a
//! corrupt one is a reported error, never a partial load. The data root can
//! be overridden with the `BLG_DATA_DIR` environment variable (used by the
//! integration tests for isolation).

use crate::models::Backlog;
use crate::{Error, Result};
use sha2::{Digest, Sha256};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name of the JSON snapshot within the storage directory.
const SNAPSHOT_FILE: &str = "backlog.json";

/// Snapshot storage for a single workspace.
pub struct Storage {
    /// Root directory for this workspace's data
    pub root: PathBuf,
}

impl Storage {
    /// Open storage for the given workspace, creating the data directory on
    /// demand. There is no separate init step.
    pub fn open(workspace: &Path) -> Result<Self> {
        let root = storage_dir(workspace)?;
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Open storage rooted at an explicit data directory (dependency
    /// injection for tests and scripting).
    pub fn open_with_data_dir(workspace: &Path, data_dir: &Path) -> Result<Self> {
        let root = data_dir.join(workspace_hash(workspace)?);
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Path of the JSON snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.root.join(SNAPSHOT_FILE)
    }

    /// Load the backlog from the snapshot, or return the default backlog
    /// when no snapshot has been written yet.
    pub fn load(&self) -> Result<Backlog> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok(Backlog::default());
        }
        let json = fs::read_to_string(&path)?;
        Backlog::from_json_str(&json)
    }

    /// Write the backlog snapshot atomically: the document goes to a
    /// temporary file in the same directory first and is renamed over the
    /// snapshot only once fully written.
    pub fn save(&self, backlog: &Backlog) -> Result<()> {
        let json = backlog.to_json_string_pretty()?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(json.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.persist(self.snapshot_path())
            .map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

/// Get the storage directory for a workspace.
///
/// Uses a hash of the workspace path to create a unique directory under
/// `~/.local/share/backlog/`, or under `BLG_DATA_DIR` when set.
pub fn storage_dir(workspace: &Path) -> Result<PathBuf> {
    let data_dir = match env::var_os("BLG_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::data_dir()
            .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))?
            .join("backlog"),
    };
    Ok(data_dir.join(workspace_hash(workspace)?))
}

/// Short hex digest identifying a workspace path.
fn workspace_hash(workspace: &Path) -> Result<String> {
    let canonical = workspace
        .canonicalize()
        .map_err(|e| Error::Other(format!("Could not canonicalize workspace path: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string_lossy().as_bytes());
    let hash_hex = format!("{:x}", hasher.finalize());
    Ok(hash_hex[..12].to_string())
}
