use std::fs;
use std::path::PathBuf;

use offerwatch_core::StateSnapshot;
use offerwatch_logging::{watch_info, watch_warn};

use crate::persist::{AtomicSnapshotWriter, PersistError};

/// Owns the persisted baseline. `load` never fails on absent state; that
/// is the normal first-run condition, not an error.
pub trait StateStore: Send + Sync {
    fn load(&self) -> Result<Option<StateSnapshot>, PersistError>;
    fn save(&self, snapshot: &StateSnapshot) -> Result<(), PersistError>;
}

/// Snapshot persisted as pretty JSON at a fixed path.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> Result<Option<StateSnapshot>, PersistError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(PersistError::Io(err)),
        };

        match serde_json::from_str::<StateSnapshot>(&content) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                // An unparsable snapshot is treated as no prior state;
                // the next successful run rewrites it whole.
                watch_warn!("ignoring unparsable snapshot at {:?}: {}", self.path, err);
                Ok(None)
            }
        }
    }

    fn save(&self, snapshot: &StateSnapshot) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(snapshot)
            .map_err(|err| PersistError::Io(std::io::Error::other(err)))?;

        let writer = AtomicSnapshotWriter::new(self.path.clone());
        writer.write(&content)?;
        watch_info!(
            "committed snapshot of {} offers to {:?}",
            snapshot.offer_ids.len(),
            self.path
        );
        Ok(())
    }
}
