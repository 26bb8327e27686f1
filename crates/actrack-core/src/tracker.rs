//! One reconciliation run: load, ask the oracle, merge, save.

use crate::error::ErrorCode;
use crate::oracle::payload::excerpt;
use crate::oracle::{Oracle, OracleError, parse_candidates, prompt};
use crate::persist::{ItemRepository, PersistError};
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::store::{ItemStore, StoreError};
use serde::Serialize;
use tracing::{info, warn};

/// Run-level failure. Nothing has been saved when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("stored items are inconsistent: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl TrackerError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Persist(err) => err.code(),
            Self::Store(err) => err.code(),
            Self::Oracle(err) => err.code(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Call the oracle even when the notes are blank.
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Blank notes; the oracle was not called and nothing was saved.
    SkippedEmptyInput,
    /// Candidates were reconciled and the collection saved.
    Applied { report: ReconcileReport, total: usize },
    /// The oracle reply held no usable payload; nothing was saved.
    Unparsed { reason: String, excerpt: String },
}

pub struct Tracker<R, O> {
    repo: R,
    oracle: O,
    reconciler: Reconciler,
}

impl<R: ItemRepository, O: Oracle> Tracker<R, O> {
    pub const fn new(repo: R, oracle: O) -> Self {
        Self {
            repo,
            oracle,
            reconciler: Reconciler::new(),
        }
    }

    /// Use `reconciler` (e.g. one with a fixed clock) for merges.
    #[must_use]
    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    fn load_store(&self, project_id: &str) -> Result<ItemStore, TrackerError> {
        let items = self.repo.load(project_id)?;
        Ok(ItemStore::from_items(project_id, items)?)
    }

    pub fn process(
        &self,
        project_id: &str,
        notes: &str,
        options: ProcessOptions,
    ) -> Result<RunOutcome, TrackerError> {
        if notes.trim().is_empty() && !options.force {
            info!(project = project_id, "input is empty; skipping oracle call");
            return Ok(RunOutcome::SkippedEmptyInput);
        }

        let mut store = self.load_store(project_id)?;
        let open: Vec<_> = store.list_open().collect();
        info!(
            project = project_id,
            open = open.len(),
            total = store.len(),
            "requesting action item extraction"
        );
        let messages = prompt::extraction_messages(project_id, &open, notes);
        let reply = self.oracle.complete(&messages)?;

        let candidates = match parse_candidates(&reply) {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(project = project_id, error = %err, "oracle reply not applied");
                return Ok(RunOutcome::Unparsed {
                    reason: err.to_string(),
                    excerpt: excerpt(&reply),
                });
            }
        };

        let report = self.reconciler.reconcile(&mut store, &candidates);
        self.repo.save(project_id, store.list_all())?;
        Ok(RunOutcome::Applied {
            report,
            total: store.len(),
        })
    }

    /// Human-readable status summary, or `None` for a project with no items.
    pub fn summarize(&self, project_id: &str) -> Result<Option<String>, TrackerError> {
        let store = self.load_store(project_id)?;
        if store.is_empty() {
            return Ok(None);
        }
        let messages = prompt::summary_messages(project_id, store.list_all());
        Ok(Some(self.oracle.complete(&messages)?))
    }
}
