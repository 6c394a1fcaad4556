use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state directory missing or not writable: {0}")]
    StateDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the snapshot directory exists; create if missing.
pub fn ensure_state_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::StateDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
    Ok(())
}

/// Commits snapshot content to a fixed path via temp-file-then-rename.
///
/// The rename replaces the target in a single step, so the previous
/// snapshot stays readable up to the instant the new one takes its
/// place. There is no window in which the path is absent: a crash at
/// any point leaves either the old snapshot or the new one, never
/// neither and never a half-written file.
pub struct AtomicSnapshotWriter {
    path: PathBuf,
}

impl AtomicSnapshotWriter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn target(&self) -> &Path {
        &self.path
    }

    fn state_dir(&self) -> Result<PathBuf, PersistError> {
        if self.path.file_name().is_none() {
            return Err(PersistError::StateDir("snapshot path has no filename".into()));
        }
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(dir)
    }

    pub fn write(&self, content: &str) -> Result<(), PersistError> {
        let dir = self.state_dir()?;
        ensure_state_dir(&dir)?;

        // The temp file lives in the target directory so the final
        // rename never crosses a filesystem boundary.
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| PersistError::Io(e.error))?;

        // The rename itself must survive a crash too: fsync the
        // directory entry on platforms where that is meaningful.
        #[cfg(unix)]
        fs::File::open(&dir)?.sync_all()?;

        Ok(())
    }
}
