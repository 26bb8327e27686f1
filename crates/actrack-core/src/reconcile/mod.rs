//! Merge a candidate list into a project's [`ItemStore`].
//!
//! Candidates are applied one at a time, in the order the oracle produced
//! them. Each is first classified ([`classify`]) into one of three
//! variants and only then applied, so the decision and its effect can be
//! tested separately. Items the candidate list does not mention are never
//! touched; absence is not evidence of completion.
//!
//! Reconciliation never fails as a whole. Problems local to a candidate are
//! collected as [`ReconcileWarning`]s in the returned [`ReconcileReport`].

pub mod candidate;

pub use candidate::{Candidate, CandidateIssue, Classification, FieldInput, classify};

use crate::model::{ItemId, ItemPatch, Status};
use crate::store::ItemStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Provenance tag stamped on items the reconciler creates.
pub const EXTRACTION_SOURCE: &str = "oracle extraction";

/// A non-fatal problem with the candidate at `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileWarning {
    pub index: usize,
    #[serde(serialize_with = "serialize_issue")]
    pub issue: CandidateIssue,
}

fn serialize_issue<S: serde::Serializer>(issue: &CandidateIssue, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(issue)
}

impl std::fmt::Display for ReconcileWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "candidate #{}: {}", self.index, self.issue)
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub created: Vec<ItemId>,
    pub updated: Vec<ItemId>,
    pub unchanged: Vec<ItemId>,
    pub warnings: Vec<ReconcileWarning>,
}

impl ReconcileReport {
    #[must_use]
    pub fn changed_store(&self) -> bool {
        !self.created.is_empty() || !self.updated.is_empty()
    }

    fn warn(&mut self, index: usize, issue: CandidateIssue) {
        warn!(index, %issue, "discarding part of oracle candidate");
        self.warnings.push(ReconcileWarning { index, issue });
    }

    fn note_updated(&mut self, id: ItemId) {
        self.unchanged.retain(|unchanged| *unchanged != id);
        if !self.updated.contains(&id) && !self.created.contains(&id) {
            self.updated.push(id);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    now: Option<DateTime<Utc>>,
}

impl Reconciler {
    #[must_use]
    pub const fn new() -> Self {
        Self { now: None }
    }

    /// Use a fixed clock instead of the wall clock.
    #[must_use]
    pub const fn at(now: DateTime<Utc>) -> Self {
        Self { now: Some(now) }
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    /// Apply every candidate to `store` and report what happened.
    pub fn reconcile(&self, store: &mut ItemStore, candidates: &[Value]) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for (index, value) in candidates.iter().enumerate() {
            let (candidate, issues) = match Candidate::from_value(value) {
                Ok(parsed) => parsed,
                Err(issue) => {
                    report.warn(index, issue);
                    continue;
                }
            };

            let classification = classify(candidate, store);
            debug!(index, ?classification, "classified candidate");
            // A discarded candidate gets one warning, not one per field.
            if !matches!(classification, Classification::Unresolvable(_)) {
                for issue in issues {
                    report.warn(index, issue);
                }
            }
            self.apply(store, index, classification, &mut report);
        }

        info!(
            project = store.project_id(),
            candidates = candidates.len(),
            created = report.created.len(),
            updated = report.updated.len(),
            warnings = report.warnings.len(),
            "reconciliation pass complete"
        );
        report
    }

    /// Apply one classified candidate.
    pub fn apply(
        &self,
        store: &mut ItemStore,
        index: usize,
        classification: Classification,
        report: &mut ReconcileReport,
    ) {
        match classification {
            Classification::MatchedById { id, patch } => {
                match store.update_at(&id, &patch, self.now()) {
                    Ok(outcome) if outcome.is_noop() => {
                        if !report.unchanged.contains(&id) && !report.updated.contains(&id) {
                            report.unchanged.push(id);
                        }
                    }
                    Ok(_) => report.note_updated(id),
                    Err(err) => report.warn(index, err.into()),
                }
            }
            Classification::NewByTask {
                task,
                owner,
                deadline,
                status,
            } => {
                let now = self.now();
                let id = match store.create_at(&task, owner, deadline, now) {
                    Ok(item) => item.id.clone(),
                    Err(err) => {
                        report.warn(index, err.into());
                        return;
                    }
                };
                if let Err(err) = store.set_source(&id, EXTRACTION_SOURCE) {
                    report.warn(index, err.into());
                }
                if let Some(status) = status.filter(|status| *status != Status::Open) {
                    if let Err(err) = store.update_at(&id, &ItemPatch::status(status), now) {
                        report.warn(index, err.into());
                    }
                }
                report.created.push(id);
            }
            Classification::Unresolvable(issue) => report.warn(index, issue),
        }
    }
}
