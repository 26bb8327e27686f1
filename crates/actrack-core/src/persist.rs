//! Durable storage for project item collections.
//!
//! Each project is one pretty-printed JSON array of [`ActionItem`]s. Saves
//! go through a sibling `.tmp` file and a rename, so a failed save leaves the
//! previous collection intact.

use crate::error::ErrorCode;
use crate::lock::{LockError, ProjectLock};
use crate::model::ActionItem;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_PROJECT_FILE: &str = "default_project";

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("{} is not a valid action item list: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to serialize action items: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl PersistError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::StoreUnreadable,
            Self::Corrupt { .. } => ErrorCode::StoreCorrupt,
            Self::Write { .. } => ErrorCode::StoreWriteFailed,
            Self::Serialize(_) => ErrorCode::InternalUnexpected,
            Self::Lock(err) => err.code(),
        }
    }
}

/// Load/save collaborator for one project's items.
pub trait ItemRepository {
    /// All items of `project_id`; empty when the project has never been saved.
    fn load(&self, project_id: &str) -> Result<Vec<ActionItem>, PersistError>;

    /// Replace the stored collection of `project_id` with `items`.
    fn save(&self, project_id: &str, items: &[ActionItem]) -> Result<(), PersistError>;
}

impl<T: ItemRepository + ?Sized> ItemRepository for &T {
    fn load(&self, project_id: &str) -> Result<Vec<ActionItem>, PersistError> {
        (**self).load(project_id)
    }

    fn save(&self, project_id: &str, items: &[ActionItem]) -> Result<(), PersistError> {
        (**self).save(project_id, items)
    }
}

/// Reduce a project id to a safe file stem.
///
/// Keeps ASCII alphanumerics, `_` and `-`; anything else is dropped. An id
/// with nothing left maps to `default_project`.
#[must_use]
pub fn project_file_stem(project_id: &str) -> String {
    let safe: String = project_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .collect();
    if safe.is_empty() {
        DEFAULT_PROJECT_FILE.to_string()
    } else {
        safe
    }
}

#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    root: PathBuf,
}

impl JsonFileRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn project_path(&self, project_id: &str) -> PathBuf {
        self.root
            .join(format!("{}.json", project_file_stem(project_id)))
    }

    #[must_use]
    pub fn lock_path(&self, project_id: &str) -> PathBuf {
        self.root
            .join(format!("{}.lock", project_file_stem(project_id)))
    }

    /// Take the single-writer lock for `project_id`.
    pub fn lock(&self, project_id: &str, timeout: Duration) -> Result<ProjectLock, PersistError> {
        Ok(ProjectLock::acquire(&self.lock_path(project_id), timeout)?)
    }
}

impl ItemRepository for JsonFileRepository {
    fn load(&self, project_id: &str) -> Result<Vec<ActionItem>, PersistError> {
        let path = self.project_path(project_id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(project = project_id, path = %path.display(), "no stored items yet");
                return Ok(Vec::new());
            }
            Err(source) => return Err(PersistError::Read { path, source }),
        };

        let items: Vec<ActionItem> = serde_json::from_str(&raw)
            .map_err(|source| PersistError::Corrupt {
                path: path.clone(),
                source,
            })?;
        info!(project = project_id, count = items.len(), "loaded action items");
        Ok(items)
    }

    fn save(&self, project_id: &str, items: &[ActionItem]) -> Result<(), PersistError> {
        let path = self.project_path(project_id);
        fs::create_dir_all(&self.root).map_err(|source| PersistError::Write {
            path: self.root.clone(),
            source,
        })?;

        let mut body = serde_json::to_vec_pretty(items).map_err(PersistError::Serialize)?;
        body.push(b'\n');

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, body).map_err(|source| PersistError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            PersistError::Write {
                path: path.clone(),
                source,
            }
        })?;

        info!(project = project_id, count = items.len(), path = %path.display(), "saved action items");
        Ok(())
    }
}
