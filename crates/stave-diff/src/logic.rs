//! Per-kind diff and merge handlers.
//!
//! [`EntityLogic`] is the object-safe seam the engine dispatches through;
//! [`RecordLogic`] implements it once for every [`Record`] type, so adding an
//! entity kind means implementing `Record` and registering a handler.

use std::marker::PhantomData;

use stave_records::{
    decode_payload, delta_for, describe, diff_records, encode_payload, merge_added,
    merge_changed, merge_removed, Record,
};
use stave_types::{ChangeKind, Delta, DeltaType, EntityKind, Node};

use crate::entry::DeltaEntry;
use crate::error::DiffResult;

/// Diff and merge functions for one entity kind, over payload nodes.
pub trait EntityLogic: Send + Sync {
    /// The kind this handler serves.
    fn kind(&self) -> EntityKind;

    /// A payload with no records.
    fn empty_payload(&self) -> Node;

    /// Delta-diffs turning `state` into `changes`; empty buckets are omitted.
    fn diff(&self, state: &Node, changes: &Node) -> DiffResult<Vec<DeltaEntry>>;

    /// Union by id.
    fn merge_added(&self, ancestor: &Node, branch: &Node) -> DiffResult<Node>;

    /// Ancestor records whose id is absent from `branch`.
    fn merge_removed(&self, ancestor: &Node, branch: &Node) -> DiffResult<Node>;

    /// Ancestor records overridden by same-id branch records.
    fn merge_changed(&self, ancestor: &Node, branch: &Node) -> DiffResult<Node>;

    /// Delta describing `payload` under `change`.
    fn describe(&self, change: ChangeKind, payload: &Node) -> DiffResult<Delta>;
}

/// The [`EntityLogic`] of a [`Record`] type.
pub struct RecordLogic<R> {
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> RecordLogic<R> {
    pub fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }

    /// Both payloads must belong to this kind. A mismatch is an integration
    /// bug: it panics in debug builds and leaves the ancestor untouched in
    /// release builds.
    fn kinds_match(ancestor: &Node, branch: &Node) -> bool {
        let ok = ancestor.name == R::KIND && branch.name == R::KIND;
        debug_assert!(
            ok,
            "merging {} payload with {} payload in {} logic",
            ancestor.name,
            branch.name,
            R::KIND
        );
        ok
    }

    fn merge_with(
        ancestor: &Node,
        branch: &Node,
        op: fn(&[R], &[R]) -> Vec<R>,
    ) -> DiffResult<Node> {
        if !Self::kinds_match(ancestor, branch) {
            return Ok(ancestor.clone());
        }
        let ancestor_records = decode_payload::<R>(ancestor)?;
        let branch_records = decode_payload::<R>(branch)?;
        Ok(encode_payload(&op(&ancestor_records, &branch_records)))
    }
}

impl<R: Record> Default for RecordLogic<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> EntityLogic for RecordLogic<R> {
    fn kind(&self) -> EntityKind {
        R::entity_kind()
    }

    fn empty_payload(&self) -> Node {
        encode_payload::<R>(&[])
    }

    fn diff(&self, state: &Node, changes: &Node) -> DiffResult<Vec<DeltaEntry>> {
        let old = decode_payload::<R>(state)?;
        let new = decode_payload::<R>(changes)?;
        Ok(diff_records(&old, &new)
            .into_deltas()
            .into_iter()
            .map(DeltaEntry::from)
            .collect())
    }

    fn merge_added(&self, ancestor: &Node, branch: &Node) -> DiffResult<Node> {
        Self::merge_with(ancestor, branch, merge_added::<R>)
    }

    fn merge_removed(&self, ancestor: &Node, branch: &Node) -> DiffResult<Node> {
        Self::merge_with(ancestor, branch, merge_removed::<R>)
    }

    fn merge_changed(&self, ancestor: &Node, branch: &Node) -> DiffResult<Node> {
        Self::merge_with(ancestor, branch, merge_changed::<R>)
    }

    fn describe(&self, change: ChangeKind, payload: &Node) -> DiffResult<Delta> {
        let records = decode_payload::<R>(payload)?;
        Ok(Delta::new(
            DeltaType::new(R::KIND, change),
            describe::<R>(change),
            records.len() as i64,
        ))
    }
}

/// Full-state entry for a list of records, as a live item would expose it.
pub fn full_entry<R: Record>(records: &[R]) -> DeltaEntry {
    delta_for(ChangeKind::Full, records).into()
}
