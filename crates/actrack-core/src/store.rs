//! In-memory collection of one project's action items.
//!
//! The store owns items in insertion order and is the only place that
//! mutates them. Every mutation goes through [`ItemStore::update_at`], which
//! appends one [`HistoryEntry`] per changed field and refreshes `updated_at`
//! exactly once per call.

use crate::error::ErrorCode;
use crate::model::{ActionItem, Field, HistoryEntry, ItemId, ItemPatch, Status};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("task text must not be empty")]
    EmptyTask,

    #[error("action item not found: {0}")]
    NotFound(ItemId),

    #[error("duplicate action item id {0} in project store")]
    DuplicateId(ItemId),

    #[error("action item {id} belongs to project '{found}', not '{expected}'")]
    ForeignItem {
        id: ItemId,
        expected: String,
        found: String,
    },
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyTask => ErrorCode::EmptyTask,
            Self::NotFound(_) => ErrorCode::ItemNotFound,
            Self::DuplicateId(_) => ErrorCode::DuplicateItemId,
            Self::ForeignItem { .. } => ErrorCode::ForeignItem,
        }
    }
}

/// Which fields an [`ItemStore::update`] call actually changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub changed: Vec<Field>,
}

impl UpdateOutcome {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ItemStore {
    project_id: String,
    items: Vec<ActionItem>,
    index: HashMap<ItemId, usize>,
}

impl ItemStore {
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Rebuild a store from persisted items, keeping their order.
    pub fn from_items(
        project_id: impl Into<String>,
        items: Vec<ActionItem>,
    ) -> Result<Self, StoreError> {
        let mut store = Self::new(project_id);
        for item in items {
            if item.project_id != store.project_id {
                return Err(StoreError::ForeignItem {
                    id: item.id,
                    expected: store.project_id,
                    found: item.project_id,
                });
            }
            if store.index.contains_key(&item.id) {
                return Err(StoreError::DuplicateId(item.id));
            }
            store.push(item);
        }
        Ok(store)
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&ActionItem> {
        self.index.get(id).map(|&pos| &self.items[pos])
    }

    /// Items still being worked on, in insertion order.
    ///
    /// Each call returns a fresh iterator over the current contents.
    pub fn list_open(&self) -> impl Iterator<Item = &ActionItem> + '_ {
        self.items.iter().filter(|item| item.status.is_active())
    }

    #[must_use]
    pub fn list_all(&self) -> &[ActionItem] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<ActionItem> {
        self.items
    }

    pub fn create(
        &mut self,
        task: &str,
        owner: Option<String>,
        deadline: Option<String>,
    ) -> Result<&ActionItem, StoreError> {
        self.create_at(task, owner, deadline, Utc::now())
    }

    /// Create a new open item stamped with `now`.
    pub fn create_at(
        &mut self,
        task: &str,
        owner: Option<String>,
        deadline: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<&ActionItem, StoreError> {
        let task = task.trim();
        if task.is_empty() {
            return Err(StoreError::EmptyTask);
        }

        let mut id = ItemId::generate();
        while self.index.contains_key(&id) {
            id = ItemId::generate();
        }

        let item = ActionItem {
            id,
            project_id: self.project_id.clone(),
            task: task.to_string(),
            owner,
            deadline,
            status: Status::Open,
            created_at: now,
            updated_at: now,
            source: None,
            update_history: Vec::new(),
        };
        let pos = self.push(item);
        Ok(&self.items[pos])
    }

    /// Tag an item with where it came from. Not a tracked field.
    pub fn set_source(&mut self, id: &ItemId, source: impl Into<String>) -> Result<(), StoreError> {
        let pos = self.position(id)?;
        self.items[pos].source = Some(source.into());
        Ok(())
    }

    pub fn update(&mut self, id: &ItemId, patch: &ItemPatch) -> Result<UpdateOutcome, StoreError> {
        self.update_at(id, patch, Utc::now())
    }

    /// Apply `patch` to the item, recording one history entry per changed field.
    ///
    /// Fields are applied in a fixed order: task, owner, deadline, status.
    /// Values equal to the current ones are skipped; if nothing changes the
    /// item is left exactly as it was.
    pub fn update_at(
        &mut self,
        id: &ItemId,
        patch: &ItemPatch,
        now: DateTime<Utc>,
    ) -> Result<UpdateOutcome, StoreError> {
        let pos = self.position(id)?;

        let task = match &patch.task {
            Some(task) if task.trim().is_empty() => return Err(StoreError::EmptyTask),
            Some(task) => Some(task.trim().to_string()),
            None => None,
        };

        let item = &mut self.items[pos];
        let stamp = next_stamp(item.updated_at, now);
        let mut outcome = UpdateOutcome::default();

        if let Some(task) = task.filter(|task| *task != item.task) {
            let from = std::mem::replace(&mut item.task, task);
            record(item, &mut outcome, Field::Task, Some(from), stamp);
        }
        if let Some(owner) = patch.owner.as_ref().filter(|owner| **owner != item.owner) {
            let from = std::mem::replace(&mut item.owner, owner.clone());
            record(item, &mut outcome, Field::Owner, from, stamp);
        }
        if let Some(deadline) = patch
            .deadline
            .as_ref()
            .filter(|deadline| **deadline != item.deadline)
        {
            let from = std::mem::replace(&mut item.deadline, deadline.clone());
            record(item, &mut outcome, Field::Deadline, from, stamp);
        }
        if let Some(status) = patch.status.filter(|status| *status != item.status) {
            let from = std::mem::replace(&mut item.status, status);
            record(
                item,
                &mut outcome,
                Field::Status,
                Some(from.as_str().to_string()),
                stamp,
            );
        }

        if !outcome.is_noop() {
            item.updated_at = stamp;
        }
        Ok(outcome)
    }

    fn position(&self, id: &ItemId) -> Result<usize, StoreError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn push(&mut self, item: ActionItem) -> usize {
        let pos = self.items.len();
        self.index.insert(item.id.clone(), pos);
        self.items.push(item);
        pos
    }
}

fn record(
    item: &mut ActionItem,
    outcome: &mut UpdateOutcome,
    field: Field,
    from: Option<String>,
    at: DateTime<Utc>,
) {
    item.update_history.push(HistoryEntry {
        field,
        from,
        to: item.field_text(field),
        at,
    });
    outcome.changed.push(field);
}

/// `updated_at` must move forward on every mutation, even within one clock tick.
fn next_stamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}
