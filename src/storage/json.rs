use crate::storage::traits::{SnapshotStore, StorageError, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Snapshot stored as a single JSON document on disk
///
/// Writes go to a sibling `.partial` file that is renamed over the target,
/// so an interrupted save leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonSnapshot {
    path: PathBuf,
}

impl JsonSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn partial_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("snapshot"));
        name.push(".partial");
        self.path.with_file_name(name)
    }

    /// Human-readable location for log messages
    pub fn location(&self) -> String {
        self.path.display().to_string()
    }

    /// Deletes the snapshot file; a missing file is not an error
    pub fn remove(&self) -> StorageResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Remove {
                path: self.location(),
                source,
            }),
        }
    }

    fn write_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Write {
            path: self.location(),
            source,
        }
    }
}

impl<T> SnapshotStore<T> for JsonSnapshot
where
    T: Serialize + DeserializeOwned,
{
    fn load(&self) -> StorageResult<Option<T>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.location(),
                    source,
                })
            }
        };

        serde_json::from_reader(BufReader::new(file))
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                path: self.location(),
                source,
            })
    }

    fn save(&self, value: &T) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }

        let partial = self.partial_path();
        let file = File::create(&partial).map_err(|e| self.write_error(e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, value)?;
        writer.flush().map_err(|e| self.write_error(e))?;
        drop(writer);

        fs::rename(&partial, &self.path).map_err(|e| self.write_error(e))
    }

    fn remove(&self) -> StorageResult<()> {
        JsonSnapshot::remove(self)
    }

    fn location(&self) -> String {
        JsonSnapshot::location(self)
    }
}
