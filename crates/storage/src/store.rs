// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk layout and atomic persistence for `SessionRecord`s (spec §6
//! "Persistent record layout").

use std::path::{Path, PathBuf};

use relay_core::SessionId;

use crate::error::RecordError;
use crate::record::SessionRecord;

/// Reads and writes `SessionRecord`s under a single `sessions` directory
/// (the `<data-root>/<kind>/sessions` prefix is resolved by the caller —
/// out of scope per spec.md §1).
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    /// Open a record store rooted at `dir`, creating it if it doesn't exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, RecordError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, identifier: &SessionId) -> PathBuf {
        self.dir.join(identifier.as_str())
    }

    fn tmp_path_for(&self, identifier: &SessionId) -> PathBuf {
        self.dir.join(format!(".{}.tmp", identifier.as_str()))
    }

    /// Load and validate the persisted record for `identifier`.
    pub fn load(&self, identifier: &SessionId) -> Result<SessionRecord, RecordError> {
        let path = self.path_for(identifier);
        let bytes = std::fs::read(&path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                RecordError::NotFound(identifier.clone())
            } else {
                RecordError::Io(err)
            }
        })?;
        let record = serde_json::from_slice(&bytes)?;
        Ok(record)
    }

    /// Persist `record`, replacing any prior value for the same identifier.
    ///
    /// Writes to a temp file in the same directory and renames into place
    /// so a reader never observes a partially-written record.
    pub fn save(&self, record: &SessionRecord) -> Result<(), RecordError> {
        let tmp_path = self.tmp_path_for(&record.identifier);
        let final_path = self.path_for(&record.identifier);
        let encoded = serde_json::to_vec_pretty(record)?;
        std::fs::write(&tmp_path, encoded)?;
        std::fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }

    /// Remove the persisted record for `identifier`. Tolerant of the record
    /// already being absent (spec §6 "removal ... is the terminal act of
    /// terminate").
    pub fn remove(&self, identifier: &SessionId) -> Result<(), RecordError> {
        match std::fs::remove_file(self.path_for(identifier)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(RecordError::Io(err)),
        }
    }

    /// Enumerate the identifiers of every persisted record, for
    /// `Manager`-on-startup reload (spec §4.3 "On startup it enumerates
    /// persisted records").
    pub fn list_identifiers(&self) -> Result<Vec<SessionId>, RecordError> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if name.starts_with('.') {
                continue;
            }
            ids.push(SessionId::new(name.into_owned()));
        }
        Ok(ids)
    }

    /// The directory this store reads and writes under.
    pub fn root(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
