//! End-to-end reconciliation scenarios against a real file repository.

use actrack_core::model::{ActionItem, Field, ItemId, Status};
use actrack_core::persist::{ItemRepository, JsonFileRepository};
use actrack_core::reconcile::{CandidateIssue, EXTRACTION_SOURCE, Reconciler};
use actrack_core::store::ItemStore;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

fn t(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_746_000_000 + secs, 0).unwrap()
}

fn deploy_item() -> ActionItem {
    ActionItem {
        id: ItemId::from("xyz-123"),
        project_id: "ops".into(),
        task: "deploy service".into(),
        owner: None,
        deadline: None,
        status: Status::InProgress,
        created_at: t(0),
        updated_at: t(0),
        source: None,
        update_history: Vec::new(),
    }
}

#[test]
fn completing_an_in_progress_item() {
    let mut store = ItemStore::from_items("ops", vec![deploy_item()]).unwrap();

    let report = Reconciler::at(t(60)).reconcile(
        &mut store,
        &[json!({"id": "xyz-123", "status": "completed"})],
    );

    assert!(report.created.is_empty());
    assert_eq!(report.updated, vec![ItemId::from("xyz-123")]);
    assert_eq!(store.len(), 1);

    let item = store.get(&ItemId::from("xyz-123")).unwrap();
    assert_eq!(item.status, Status::Completed);
    assert!(item.updated_at > item.created_at);
    assert_eq!(item.update_history.len(), 1);
    let entry = &item.update_history[0];
    assert_eq!(entry.field, Field::Status);
    assert_eq!(entry.from.as_deref(), Some("in_progress"));
    assert_eq!(entry.to.as_deref(), Some("completed"));
}

#[test]
fn new_item_into_empty_store() {
    let mut store = ItemStore::new("launch");

    let report = Reconciler::at(t(5)).reconcile(
        &mut store,
        &[json!({"task": "send slides", "owner": "Alice", "deadline": "Friday"})],
    );

    assert_eq!(report.created.len(), 1);
    assert!(report.warnings.is_empty());
    let item = &store.list_all()[0];
    assert_eq!(item.task, "send slides");
    assert_eq!(item.owner.as_deref(), Some("Alice"));
    assert_eq!(item.deadline.as_deref(), Some("Friday"));
    assert_eq!(item.status, Status::Open);
    assert!(item.update_history.is_empty());
    assert_eq!(item.created_at, item.updated_at);
    assert_eq!(item.source.as_deref(), Some(EXTRACTION_SOURCE));
}

#[test]
fn task_only_candidate_twice_creates_two_items() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileRepository::new(dir.path());
    let candidates = [json!({"task": "book venue"})];

    for pass in 0..2 {
        let mut store = ItemStore::from_items("events", repo.load("events").unwrap()).unwrap();
        Reconciler::at(t(pass)).reconcile(&mut store, &candidates);
        repo.save("events", store.list_all()).unwrap();
    }

    let items = repo.load("events").unwrap();
    assert_eq!(items.len(), 2);
    assert_ne!(items[0].id, items[1].id);
    assert!(items.iter().all(|item| item.task == "book venue"));
}

#[test]
fn malformed_candidate_warns_and_changes_nothing() {
    let mut store = ItemStore::from_items("ops", vec![deploy_item()]).unwrap();
    let before = store.list_all().to_vec();

    let report = Reconciler::at(t(60)).reconcile(&mut store, &[json!({"owner": "Bob"})]);

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].issue, CandidateIssue::MissingTaskAndId);
    assert!(!report.changed_store());
    assert_eq!(store.list_all(), before.as_slice());
}

#[test]
fn blank_task_candidate_warns_once() {
    let mut store = ItemStore::from_items("ops", vec![deploy_item()]).unwrap();
    let before = store.list_all().to_vec();

    let report = Reconciler::at(t(60)).reconcile(&mut store, &[json!({"task": "   "})]);

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].issue, CandidateIssue::MissingTaskAndId);
    assert!(!report.changed_store());
    assert_eq!(store.list_all(), before.as_slice());
}

#[test]
fn repeated_update_is_idempotent() {
    let mut store = ItemStore::from_items("ops", vec![deploy_item()]).unwrap();
    let candidates = [json!({"id": "xyz-123", "owner": "Dana", "status": "completed"})];

    Reconciler::at(t(10)).reconcile(&mut store, &candidates);
    let after_first = store.list_all().to_vec();
    let second = Reconciler::at(t(20)).reconcile(&mut store, &candidates);

    assert!(second.updated.is_empty());
    assert_eq!(second.unchanged, vec![ItemId::from("xyz-123")]);
    assert_eq!(store.list_all(), after_first.as_slice());
}

#[test]
fn new_item_with_status_records_transition_from_open() {
    let mut store = ItemStore::new("ops");
    Reconciler::at(t(1)).reconcile(
        &mut store,
        &[json!({"task": "rotate keys", "status": "in_progress"})],
    );

    let item = &store.list_all()[0];
    assert_eq!(item.status, Status::InProgress);
    assert_eq!(item.update_history.len(), 1);
    assert_eq!(item.update_history[0].from.as_deref(), Some("open"));
    assert_eq!(item.update_history[0].to.as_deref(), Some("in_progress"));
    assert!(item.updated_at > item.created_at);
}

#[test]
fn reconciled_store_survives_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileRepository::new(dir.path().join("projects"));
    let mut store = ItemStore::from_items("ops", vec![deploy_item()]).unwrap();

    Reconciler::at(t(30)).reconcile(
        &mut store,
        &[
            json!({"id": "xyz-123", "status": "completed", "owner": "Erin"}),
            json!({"task": "write postmortem", "owner": "Erin", "deadline": "next week"}),
        ],
    );
    repo.save("ops", store.list_all()).unwrap();

    let reloaded = ItemStore::from_items("ops", repo.load("ops").unwrap()).unwrap();
    assert_eq!(reloaded.list_all(), store.list_all());
    assert_eq!(reloaded.list_open().count(), 1);
}

#[test]
fn unresolvable_reference_is_discarded() {
    let mut store = ItemStore::from_items("ops", vec![deploy_item()]).unwrap();
    let report = Reconciler::at(t(5)).reconcile(
        &mut store,
        &[json!({"reference": "abc-999", "task": "deploy service", "status": "completed"})],
    );

    assert_eq!(store.len(), 1);
    assert_eq!(
        report.warnings[0].issue,
        CandidateIssue::UnresolvedReference("abc-999".into())
    );
    assert_eq!(
        store.get(&ItemId::from("xyz-123")).unwrap().status,
        Status::InProgress
    );
}
