use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use admanager_application::{SessionStorage, StorageWrite};
use admanager_core::{AppError, AppResult};
use tracing::{debug, warn};

type Entries = BTreeMap<String, String>;

/// Session storage persisted as a JSON object file.
///
/// Batches are written to a sibling temporary file that is then renamed over
/// the target, so readers see either the old or the new contents. On unix
/// the file is only readable by its owner.
pub struct FileSessionStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStorage {
    /// Creates storage backed by `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    fn read_contents(&self) -> AppResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(AppError::Internal(format!(
                "failed to read session file '{}': {error}",
                self.path.display()
            ))),
        }
    }

    fn parse_entries(&self, contents: Option<String>) -> AppResult<Entries> {
        let Some(contents) = contents.filter(|contents| !contents.trim().is_empty()) else {
            return Ok(Entries::new());
        };

        serde_json::from_str::<Entries>(contents.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to parse session file '{}': {error}",
                self.path.display()
            ))
        })
    }

    fn write_entries(&self, entries: &Entries) -> AppResult<()> {
        if let Some(parent) = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            fs::create_dir_all(parent).map_err(|error| {
                AppError::Internal(format!(
                    "failed to create session directory '{}': {error}",
                    parent.display()
                ))
            })?;
        }

        let contents = serde_json::to_string_pretty(entries).map_err(|error| {
            AppError::Internal(format!("failed to serialize session file: {error}"))
        })?;
        let temporary_path = self.temporary_path();
        write_owner_only(&temporary_path, contents.as_bytes()).map_err(|error| {
            AppError::Internal(format!(
                "failed to write session file '{}': {error}",
                temporary_path.display()
            ))
        })?;

        if let Err(error) = fs::rename(&temporary_path, &self.path) {
            let _ = fs::remove_file(&temporary_path);
            return Err(AppError::Internal(format!(
                "failed to replace session file '{}': {error}",
                self.path.display()
            )));
        }

        Ok(())
    }

    fn temporary_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "session.json".to_owned());
        self.path.with_file_name(format!(".{file_name}.tmp"))
    }
}

/// Writes a fresh file readable only by the current user.
fn write_owner_only(path: &Path, contents: &[u8]) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => return Err(error),
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

impl SessionStorage for FileSessionStorage {
    fn read_many(&self, keys: &[&str]) -> AppResult<Vec<Option<String>>> {
        let mut entries = self.parse_entries(self.read_contents()?)?;
        Ok(keys.iter().map(|key| entries.remove(*key)).collect())
    }

    fn apply(&self, batch: Vec<StorageWrite>) -> AppResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let (mut entries, unreadable) = match self.parse_entries(self.read_contents()?) {
            Ok(entries) => (entries, false),
            Err(error) => {
                warn!(
                    path = %self.path.display(),
                    error = %error,
                    "replacing unreadable session file"
                );
                (Entries::new(), true)
            }
        };
        let before = entries.clone();

        for write in batch {
            match write {
                StorageWrite::Put { key, value } => {
                    entries.insert(key, value);
                }
                StorageWrite::Remove { key } => {
                    entries.remove(&key);
                }
            }
        }

        if entries == before && !unreadable {
            return Ok(());
        }

        self.write_entries(&entries)?;
        debug!(path = %self.path.display(), keys = entries.len(), "session file updated");
        Ok(())
    }
}
