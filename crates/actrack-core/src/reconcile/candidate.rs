//! Parsing and classification of untrusted candidate records.

use crate::model::{ItemId, ItemPatch, Status};
use crate::store::{ItemStore, StoreError};
use serde_json::{Map, Value};
use std::str::FromStr;

/// A problem with one candidate. Never fatal to the pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CandidateIssue {
    #[error("candidate is not a JSON object")]
    NotAnObject,

    #[error("candidate has neither a known id nor a task")]
    MissingTaskAndId,

    #[error("reference '{0}' does not match any existing item")]
    UnresolvedReference(String),

    #[error("id '{id}' and reference '{reference}' point at different items")]
    ConflictingReference { id: String, reference: String },

    #[error("invalid status '{0}' ignored")]
    InvalidStatus(String),

    #[error("field '{0}' has a non-text value and was ignored")]
    NonTextField(&'static str),

    #[error("blank task ignored")]
    BlankTask,

    #[error("store rejected candidate: {0}")]
    Rejected(#[from] StoreError),
}

/// Presence state of an optional text field in the candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldInput {
    #[default]
    Absent,
    Null,
    Text(String),
}

impl FieldInput {
    fn into_patch(self) -> Option<Option<String>> {
        match self {
            Self::Absent => None,
            Self::Null => Some(None),
            Self::Text(text) => Some(Some(text)),
        }
    }

    fn into_value(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Absent | Self::Null => None,
        }
    }
}

/// One candidate record, normalized but not yet checked against the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub id: Option<String>,
    pub reference: Option<String>,
    pub task: Option<String>,
    pub owner: FieldInput,
    pub deadline: FieldInput,
    pub status: Option<Status>,
}

impl Candidate {
    /// Parse one element of the oracle's list.
    ///
    /// Field-level problems are returned alongside the candidate; only a
    /// non-object element fails outright.
    pub fn from_value(value: &Value) -> Result<(Self, Vec<CandidateIssue>), CandidateIssue> {
        let Value::Object(map) = value else {
            return Err(CandidateIssue::NotAnObject);
        };

        let mut issues = Vec::new();
        let mut text = |key: &'static str| read_text(map, key, &mut issues);

        let id = text("id").into_value();
        let reference = text("reference").into_value();
        let task_raw = text("task");
        let owner = text("owner");
        let deadline = text("deadline");
        let status_raw = text("status").into_value();

        if task_raw == FieldInput::Null {
            issues.push(CandidateIssue::BlankTask);
        }
        let task = task_raw.into_value();

        let status = status_raw.and_then(|raw| match Status::from_str(&raw) {
            Ok(status) => Some(status),
            Err(_) => {
                issues.push(CandidateIssue::InvalidStatus(raw));
                None
            }
        });

        Ok((
            Self {
                id,
                reference,
                task,
                owner,
                deadline,
                status,
            },
            issues,
        ))
    }
}

fn read_text(map: &Map<String, Value>, key: &'static str, issues: &mut Vec<CandidateIssue>) -> FieldInput {
    match map.get(key) {
        None => FieldInput::Absent,
        Some(Value::Null) => FieldInput::Null,
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                FieldInput::Null
            } else {
                FieldInput::Text(trimmed.to_string())
            }
        }
        Some(Value::Number(n)) => FieldInput::Text(n.to_string()),
        Some(Value::Bool(b)) => FieldInput::Text(b.to_string()),
        Some(Value::Array(_) | Value::Object(_)) => {
            issues.push(CandidateIssue::NonTextField(key));
            FieldInput::Absent
        }
    }
}

/// What a candidate means for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Update an existing item with the fields the candidate specified.
    MatchedById { id: ItemId, patch: ItemPatch },
    /// Create a new item.
    NewByTask {
        task: String,
        owner: Option<String>,
        deadline: Option<String>,
        status: Option<Status>,
    },
    /// Cannot be applied; discard and warn.
    Unresolvable(CandidateIssue),
}

/// Decide whether `candidate` updates an existing item, creates one, or is discarded.
///
/// An `id` equal to an existing item's id wins. Otherwise a `reference`
/// equal to an existing id stands in for the id. A reference that matches
/// nothing, or that disagrees with a matching `id`, makes the candidate
/// unresolvable rather than guessing. Remaining candidates with a task
/// become new items.
#[must_use]
pub fn classify(candidate: Candidate, store: &ItemStore) -> Classification {
    let known = |raw: &str| {
        let id = ItemId::from(raw);
        store.contains(&id).then_some(id)
    };

    let by_id = candidate.id.as_deref().and_then(known);
    let by_reference = match candidate.reference.as_deref() {
        None => None,
        Some(reference) => match known(reference) {
            Some(id) => Some(id),
            None => {
                return Classification::Unresolvable(CandidateIssue::UnresolvedReference(
                    reference.to_string(),
                ));
            }
        },
    };

    let target = match (by_id, by_reference) {
        (Some(id), Some(reference)) if id != reference => {
            return Classification::Unresolvable(CandidateIssue::ConflictingReference {
                id: id.to_string(),
                reference: reference.to_string(),
            });
        }
        (Some(id), _) | (None, Some(id)) => Some(id),
        (None, None) => None,
    };

    if let Some(id) = target {
        return Classification::MatchedById {
            id,
            patch: ItemPatch {
                task: candidate.task,
                owner: candidate.owner.into_patch(),
                deadline: candidate.deadline.into_patch(),
                status: candidate.status,
            },
        };
    }

    match candidate.task {
        Some(task) => Classification::NewByTask {
            task,
            owner: candidate.owner.into_value(),
            deadline: candidate.deadline.into_value(),
            status: candidate.status,
        },
        None => Classification::Unresolvable(CandidateIssue::MissingTaskAndId),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: &Value) -> Candidate {
        Candidate::from_value(value).unwrap().0
    }

    fn store_with(id_task: &[(&str, &str)]) -> ItemStore {
        let items = id_task
            .iter()
            .map(|(id, task)| {
                let now = chrono::Utc::now();
                crate::model::ActionItem {
                    id: ItemId::from(*id),
                    project_id: "p".into(),
                    task: (*task).into(),
                    owner: None,
                    deadline: None,
                    status: Status::Open,
                    created_at: now,
                    updated_at: now,
                    source: None,
                    update_history: Vec::new(),
                }
            })
            .collect();
        ItemStore::from_items("p", items).unwrap()
    }

    #[test]
    fn parses_text_null_and_absent_fields() {
        let (candidate, issues) = Candidate::from_value(&json!({
            "task": "  send slides ",
            "owner": null,
            "deadline": 2025,
        }))
        .unwrap();
        assert!(issues.is_empty());
        assert_eq!(candidate.task.as_deref(), Some("send slides"));
        assert_eq!(candidate.owner, FieldInput::Null);
        assert_eq!(candidate.deadline, FieldInput::Text("2025".into()));
        assert!(candidate.status.is_none());
        assert!(candidate.id.is_none());
    }

    #[test]
    fn blank_task_is_reported() {
        let (candidate, issues) =
            Candidate::from_value(&json!({"id": "a", "task": "   "})).unwrap();
        assert!(candidate.task.is_none());
        assert_eq!(issues, vec![CandidateIssue::BlankTask]);
    }

    #[test]
    fn invalid_status_is_dropped_with_issue() {
        let (candidate, issues) =
            Candidate::from_value(&json!({"task": "x", "status": "Done"})).unwrap();
        assert!(candidate.status.is_none());
        assert_eq!(issues, vec![CandidateIssue::InvalidStatus("Done".into())]);
    }

    #[test]
    fn structured_values_in_text_fields_are_ignored() {
        let (candidate, issues) =
            Candidate::from_value(&json!({"task": "x", "owner": ["a", "b"]})).unwrap();
        assert_eq!(candidate.owner, FieldInput::Absent);
        assert_eq!(issues, vec![CandidateIssue::NonTextField("owner")]);
    }

    #[test]
    fn non_object_is_rejected() {
        assert_eq!(
            Candidate::from_value(&json!("just text")).unwrap_err(),
            CandidateIssue::NotAnObject
        );
    }

    #[test]
    fn known_id_classifies_as_update_with_partial_patch() {
        let store = store_with(&[("xyz-123", "deploy service")]);
        let class = classify(parse(&json!({"id": "xyz-123", "status": "completed"})), &store);
        assert_eq!(
            class,
            Classification::MatchedById {
                id: ItemId::from("xyz-123"),
                patch: ItemPatch::status(Status::Completed),
            }
        );
    }

    #[test]
    fn unknown_id_with_task_is_new() {
        let store = store_with(&[("a", "alpha")]);
        let class = classify(parse(&json!({"id": "zzz", "task": "beta"})), &store);
        assert!(matches!(class, Classification::NewByTask { ref task, .. } if task == "beta"));
    }

    #[test]
    fn nothing_usable_is_unresolvable() {
        let store = store_with(&[]);
        assert_eq!(
            classify(parse(&json!({"owner": "Bob"})), &store),
            Classification::Unresolvable(CandidateIssue::MissingTaskAndId)
        );
        assert_eq!(
            classify(parse(&json!({"id": "ghost", "status": "completed"})), &store),
            Classification::Unresolvable(CandidateIssue::MissingTaskAndId)
        );
    }

    #[test]
    fn reference_resolves_to_existing_id() {
        let store = store_with(&[("xyz-123", "update docs")]);
        let class = classify(
            parse(&json!({"reference": "xyz-123", "status": "completed"})),
            &store,
        );
        assert!(matches!(class, Classification::MatchedById { ref id, .. } if id.as_str() == "xyz-123"));
    }

    #[test]
    fn dangling_reference_is_unresolvable_even_with_task() {
        let store = store_with(&[("a", "alpha")]);
        let class = classify(
            parse(&json!({"reference": "ID-42", "task": "something"})),
            &store,
        );
        assert_eq!(
            class,
            Classification::Unresolvable(CandidateIssue::UnresolvedReference("ID-42".into()))
        );
    }

    #[test]
    fn id_and_reference_disagreeing_is_unresolvable() {
        let store = store_with(&[("a", "alpha"), ("b", "beta")]);
        let class = classify(parse(&json!({"id": "a", "reference": "b"})), &store);
        assert!(matches!(
            class,
            Classification::Unresolvable(CandidateIssue::ConflictingReference { .. })
        ));
    }

    #[test]
    fn new_item_drops_null_owner() {
        let store = store_with(&[]);
        let class = classify(parse(&json!({"task": "t", "owner": null})), &store);
        assert_eq!(
            class,
            Classification::NewByTask {
                task: "t".into(),
                owner: None,
                deadline: None,
                status: None,
            }
        );
    }
}
