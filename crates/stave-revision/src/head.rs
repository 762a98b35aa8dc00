//! The staging head: revision items waiting for the next commit.
//!
//! [`HeadState`] keeps a `BTreeMap<ItemUuid, RevisionItem>` so iteration and
//! the frozen revision are ordered by item uuid. All operations are
//! in-memory.

use std::collections::BTreeMap;

use chrono::Utc;
use stave_diff::{Diff, DiffLogic};
use stave_types::{ItemUuid, RevisionId, TrackedItem};
use tracing::debug;

use crate::error::{RevisionError, RevisionResult};
use crate::history::Revision;
use crate::item::{RevisionItem, RevisionItemKind};

/// What [`HeadState::stage_changes`] staged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    /// No baseline: a full snapshot was staged.
    Added,
    /// This many delta diffs were staged.
    Changed(usize),
    /// The item matches its baseline; nothing was staged.
    Unchanged,
}

/// Revision items staged for the next commit, keyed by item uuid.
#[derive(Clone, Debug, Default)]
pub struct HeadState {
    items: BTreeMap<ItemUuid, RevisionItem>,
}

impl HeadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Staged items in uuid order.
    pub fn items(&self) -> impl Iterator<Item = &RevisionItem> {
        self.items.values()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Stage a new item. Fails if its uuid is already staged.
    pub fn add_item(&mut self, item: RevisionItem) -> RevisionResult<()> {
        let uuid = item.uuid();
        if self.items.contains_key(&uuid) {
            return Err(RevisionError::AlreadyStaged(uuid));
        }
        self.items.insert(uuid, item);
        Ok(())
    }

    /// Unstage an item.
    pub fn remove_item(&mut self, uuid: &ItemUuid) -> RevisionResult<RevisionItem> {
        self.items
            .remove(uuid)
            .ok_or(RevisionError::ItemNotFound(*uuid))
    }

    /// Stage an item, replacing any item with the same uuid. Returns the
    /// replaced item.
    pub fn merge_item(&mut self, item: RevisionItem) -> Option<RevisionItem> {
        self.items.insert(item.uuid(), item)
    }

    pub fn get_item_with_uuid(&self, uuid: &ItemUuid) -> Option<&RevisionItem> {
        self.items.get(uuid)
    }

    /// The staged item tracking the same component as `item`.
    pub fn get_item_with_same_uuid(&self, item: &dyn TrackedItem) -> Option<&RevisionItem> {
        self.items.get(&item.uuid())
    }

    /// Diff a live item against its last committed state and stage the
    /// result.
    ///
    /// Without a baseline the live item is staged as a full snapshot. An
    /// unchanged item unstages anything previously staged for it.
    pub fn stage_changes(
        &mut self,
        live: &dyn TrackedItem,
        baseline: Option<&dyn TrackedItem>,
        logic: &DiffLogic,
    ) -> RevisionResult<StageOutcome> {
        let outcome = match baseline {
            None => {
                self.merge_item(RevisionItem::from_tracked(live));
                StageOutcome::Added
            }
            Some(baseline) => {
                let diff = logic.create_diff(live, baseline)?;
                if diff.is_empty() {
                    self.items.remove(&live.uuid());
                    StageOutcome::Unchanged
                } else {
                    let count = diff.len();
                    self.merge_item(RevisionItem::from_diff(
                        live,
                        &diff,
                        RevisionItemKind::Changed,
                    ));
                    StageOutcome::Changed(count)
                }
            }
        };
        debug!(item = %live.uuid(), ?outcome, "staged item");
        Ok(outcome)
    }

    /// Stage the removal of a tracked component.
    pub fn stage_removal(&mut self, item: &dyn TrackedItem) {
        self.merge_item(RevisionItem::from_diff(
            item,
            &Diff::new(),
            RevisionItemKind::Removed,
        ));
    }

    /// Commit the staged items into a new revision and empty the head.
    pub fn freeze(&mut self, message: impl Into<String>, parents: Vec<RevisionId>) -> Revision {
        let items: Vec<RevisionItem> = std::mem::take(&mut self.items).into_values().collect();
        let revision = Revision {
            id: RevisionId::new(),
            parents,
            items,
            message: message.into(),
            timestamp: Utc::now(),
        };
        debug!(
            revision = %revision.id,
            items = revision.items.len(),
            "froze head state"
        );
        revision
    }
}
