//! Committed revisions and the graph between them.
//!
//! [`History`] stores revisions in a `HashMap` and validates parent
//! references on commit, so every parent always resolves. Item states are
//! never stored in full after their first snapshot: [`History::item_at`]
//! rebuilds them by replaying the first-parent chain.
//!
//! # Invariants
//!
//! - The graph is acyclic: a revision can only name parents committed
//!   before it.
//! - A revision has at most two parents.
//! - Revision ids are unique.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use stave_diff::{DeltaEntry, Diff, DiffLogic};
use stave_merge::ThreeWayMerge;
use stave_types::{ItemUuid, RevisionId, TrackedItem};
use tracing::debug;

use crate::config::VcsConfig;
use crate::error::{RevisionError, RevisionResult};
use crate::item::{RevisionItem, RevisionItemKind};

/// A frozen head state.
#[derive(Clone, Debug, PartialEq)]
pub struct Revision {
    pub id: RevisionId,
    /// Zero parents for the first revision, two for a merge.
    pub parents: Vec<RevisionId>,
    pub items: Vec<RevisionItem>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Revision {
    /// The revision item recorded for a component, if any.
    pub fn item(&self, uuid: &ItemUuid) -> Option<&RevisionItem> {
        self.items.iter().find(|i| i.uuid() == *uuid)
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// In-memory revision graph.
#[derive(Clone, Debug, Default)]
pub struct History {
    revisions: HashMap<RevisionId, Revision>,
    /// Commit order.
    order: Vec<RevisionId>,
    config: VcsConfig,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: VcsConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &VcsConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    /// The most recently committed revision.
    pub fn latest(&self) -> Option<&Revision> {
        self.order.last().and_then(|id| self.revisions.get(id))
    }

    /// Add a revision. Every parent must already be committed.
    pub fn commit(&mut self, revision: Revision) -> RevisionResult<RevisionId> {
        let id = revision.id;
        if self.revisions.contains_key(&id) {
            return Err(RevisionError::DuplicateRevision(id));
        }
        if revision.parents.len() > 2 {
            return Err(RevisionError::TooManyParents(id));
        }
        for parent in &revision.parents {
            if !self.revisions.contains_key(parent) {
                return Err(RevisionError::DanglingParent {
                    revision: id,
                    parent: *parent,
                });
            }
        }

        debug!(
            revision = %id.short_id(),
            parents = revision.parents.len(),
            items = revision.items.len(),
            "committed revision"
        );
        self.revisions.insert(id, revision);
        self.order.push(id);
        Ok(id)
    }

    pub fn get(&self, id: &RevisionId) -> Option<&Revision> {
        self.revisions.get(id)
    }

    /// Commit index of a revision.
    fn position(&self, id: &RevisionId) -> Option<usize> {
        self.order.iter().position(|r| r == id)
    }

    fn require(&self, id: &RevisionId) -> RevisionResult<&Revision> {
        self.revisions
            .get(id)
            .ok_or(RevisionError::RevisionNotFound(*id))
    }

    /// Ancestors of a revision, nearest first, up to
    /// [`VcsConfig::max_history_depth`] generations. The revision itself is
    /// not included.
    pub fn ancestors(&self, id: &RevisionId) -> Vec<&Revision> {
        let Some(start) = self.revisions.get(id) else {
            return Vec::new();
        };
        let max_depth = self.config.max_history_depth;

        let mut visited = HashSet::new();
        visited.insert(*id);
        let mut result = Vec::new();
        let mut queue: VecDeque<(&RevisionId, usize)> = VecDeque::new();
        for parent in &start.parents {
            if visited.insert(*parent) {
                queue.push_back((parent, 1));
            }
        }

        while let Some((current, depth)) = queue.pop_front() {
            if depth > max_depth {
                continue;
            }
            if let Some(revision) = self.revisions.get(current) {
                result.push(revision);
                if depth < max_depth {
                    for parent in &revision.parents {
                        if visited.insert(*parent) {
                            queue.push_back((parent, depth + 1));
                        }
                    }
                }
            }
        }

        result
    }

    /// The most recent revision both `a` and `b` descend from (either may
    /// be the other's ancestor). Ties on timestamp go to the later commit.
    pub fn common_ancestor(&self, a: &RevisionId, b: &RevisionId) -> Option<&Revision> {
        if !self.revisions.contains_key(a) || !self.revisions.contains_key(b) {
            return None;
        }
        if a == b {
            return self.revisions.get(a);
        }

        let ancestors_a = self.ancestor_set(a);
        let ancestors_b = self.ancestor_set(b);
        ancestors_a
            .intersection(&ancestors_b)
            .filter_map(|id| self.revisions.get(id))
            .max_by_key(|revision| (revision.timestamp, self.position(&revision.id)))
    }

    /// All ancestors of a revision, including itself, without a depth bound.
    fn ancestor_set(&self, id: &RevisionId) -> HashSet<RevisionId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(*id);
        queue.push_back(*id);

        while let Some(current) = queue.pop_front() {
            if let Some(revision) = self.revisions.get(&current) {
                for parent in &revision.parents {
                    if visited.insert(*parent) {
                        queue.push_back(*parent);
                    }
                }
            }
        }

        visited
    }

    /// First-parent chain ending at `id`, oldest first.
    fn first_parent_chain(&self, id: &RevisionId) -> RevisionResult<Vec<&Revision>> {
        let mut current = self.require(id)?;
        let mut chain = vec![current];
        while let Some(parent) = current.parents.first() {
            current = self.require(parent)?;
            chain.push(current);
        }
        chain.reverse();
        Ok(chain)
    }

    /// Full state of a component at a revision.
    ///
    /// Replays the first-parent chain: an `Added` item is a full snapshot,
    /// a `Changed` item is a diff applied to the state so far, a `Removed`
    /// item drops it. Returns `None` if the component does not exist at
    /// that revision.
    pub fn item_at(
        &self,
        revision: &RevisionId,
        uuid: &ItemUuid,
        logic: &DiffLogic,
    ) -> RevisionResult<Option<RevisionItem>> {
        let mut state: Option<RevisionItem> = None;

        for rev in self.first_parent_chain(revision)? {
            let Some(item) = rev.item(uuid) else {
                continue;
            };
            state = match item.kind() {
                RevisionItemKind::Added => Some(snapshot(item, item.entries().to_vec())),
                RevisionItemKind::Changed => {
                    let base: Vec<DeltaEntry> = state
                        .as_ref()
                        .map(|s| s.entries().to_vec())
                        .unwrap_or_default();
                    let entries = logic.apply_diff(&base, &item.to_diff())?;
                    Some(snapshot(item, entries))
                }
                RevisionItemKind::Removed => None,
                RevisionItemKind::Undefined => state,
            };
        }

        Ok(state)
    }

    /// Merge `theirs` into `ours` for one component.
    ///
    /// Their changes since the common ancestor are diffed against the
    /// ancestor state and folded onto our state; kinds only they know are
    /// adopted. Returns the merged diff, one merged entry per kind.
    pub fn merge_revisions(
        &self,
        ours: &RevisionId,
        theirs: &RevisionId,
        uuid: &ItemUuid,
        logic: &DiffLogic,
    ) -> RevisionResult<Diff> {
        self.require(ours)?;
        self.require(theirs)?;
        let base = self
            .common_ancestor(ours, theirs)
            .ok_or(RevisionError::NoCommonAncestor {
                ours: *ours,
                theirs: *theirs,
            })?;

        let ancestor = self.item_at(&base.id, uuid, logic)?;
        let our_item = self.item_at(ours, uuid, logic)?;
        let their_item = self.item_at(theirs, uuid, logic)?;
        if our_item.is_none() && their_item.is_none() {
            return Err(RevisionError::ItemMissing { item: *uuid });
        }

        let empty = RevisionItem::new();
        let ancestor = ancestor.unwrap_or_else(|| empty.clone());
        let our_state = our_item.unwrap_or_else(|| empty.clone());
        let their_changes = match &their_item {
            Some(their_state) => {
                let diff = logic.create_diff(their_state, &ancestor)?;
                RevisionItem::from_diff(their_state, &diff, RevisionItemKind::Changed)
            }
            None => empty,
        };

        let merged = logic.create_merged_item(&our_state, &their_changes)?;
        debug!(
            base = %base.id.short_id(),
            item = %uuid,
            kinds = merged.len(),
            "merged revisions"
        );
        Ok(merged)
    }
}

fn snapshot(item: &RevisionItem, entries: Vec<DeltaEntry>) -> RevisionItem {
    RevisionItem::from_parts(
        item.uuid(),
        item.name(),
        RevisionItemKind::Added,
        item.diff_logic(),
        entries,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use stave_records::{decode_payload, Annotation, KeySignature, Record, Timeline};
    use stave_types::ChangeKind;

    use crate::head::HeadState;

    fn commit(
        history: &mut History,
        head: &mut HeadState,
        live: &Timeline,
        baseline: Option<&RevisionItem>,
        parents: Vec<RevisionId>,
    ) -> RevisionId {
        let logic = DiffLogic::default();
        head.stage_changes(live, baseline.map(|b| b as &dyn TrackedItem), &logic)
            .unwrap();
        history.commit(head.freeze("edit", parents)).unwrap()
    }

    fn song() -> Timeline {
        let mut timeline = Timeline::new();
        timeline.annotations = vec![Annotation::new("a1", 0.0, "Verse")];
        timeline
    }

    fn annotations(item: &RevisionItem) -> Vec<Annotation> {
        let (index, _) = item.find_delta(&Annotation::entity_kind()).unwrap();
        decode_payload(&item.delta_payload(index).unwrap()).unwrap()
    }

    #[test]
    fn commit_validates_parents() {
        let mut history = History::new();
        let orphan = HeadState::new().freeze("orphan", vec![RevisionId::new()]);
        assert!(matches!(
            history.commit(orphan),
            Err(RevisionError::DanglingParent { .. })
        ));

        let root = HeadState::new().freeze("root", vec![]);
        let root_id = history.commit(root.clone()).unwrap();
        assert!(matches!(
            history.commit(root),
            Err(RevisionError::DuplicateRevision(_))
        ));
        assert!(history.get(&root_id).unwrap().is_root());

        let octopus = HeadState::new().freeze("octopus", vec![root_id; 3]);
        assert!(matches!(
            history.commit(octopus),
            Err(RevisionError::TooManyParents(_))
        ));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn ancestors_respect_depth_bound() {
        let mut history = History::with_config(VcsConfig {
            max_history_depth: 2,
            ..VcsConfig::default()
        });
        let mut parent = history.commit(HeadState::new().freeze("r0", vec![])).unwrap();
        for i in 1..5 {
            parent = history
                .commit(HeadState::new().freeze(format!("r{i}"), vec![parent]))
                .unwrap();
        }
        let messages: Vec<&str> = history
            .ancestors(&parent)
            .iter()
            .map(|r| r.message.as_str())
            .collect();
        assert_eq!(messages, ["r3", "r2"]);
        assert!(history.ancestors(&RevisionId::new()).is_empty());
        assert_eq!(history.latest().unwrap().message, "r4");
    }

    #[test]
    fn item_at_replays_first_parent_chain() {
        let logic = DiffLogic::default();
        let mut history = History::new();
        let mut head = HeadState::new();
        let mut live = song();

        let r1 = commit(&mut history, &mut head, &live, None, vec![]);
        let base = history.item_at(&r1, &live.uuid, &logic).unwrap().unwrap();

        live.annotations[0].text = "Chorus".into();
        live.annotations.push(Annotation::new("a2", 4.0, "Bridge"));
        let r2 = commit(&mut history, &mut head, &live, Some(&base), vec![r1]);
        assert_eq!(
            history.get(&r2).unwrap().item(&live.uuid).unwrap().kind(),
            RevisionItemKind::Changed
        );

        let state = history.item_at(&r2, &live.uuid, &logic).unwrap().unwrap();
        assert_eq!(state.kind(), RevisionItemKind::Added);
        assert_eq!(
            annotations(&state),
            vec![
                Annotation::new("a1", 0.0, "Chorus"),
                Annotation::new("a2", 4.0, "Bridge"),
            ]
        );
        assert!(logic.create_diff(&live, &state).unwrap().is_empty());

        head.stage_removal(&live);
        let r3 = history.commit(head.freeze("drop", vec![r2])).unwrap();
        assert!(history.item_at(&r3, &live.uuid, &logic).unwrap().is_none());
        assert!(matches!(
            history.item_at(&RevisionId::new(), &live.uuid, &logic),
            Err(RevisionError::RevisionNotFound(_))
        ));
    }

    #[test]
    fn common_ancestor_of_branches() {
        let mut history = History::new();
        let root = history.commit(HeadState::new().freeze("root", vec![])).unwrap();
        let left = history.commit(HeadState::new().freeze("left", vec![root])).unwrap();
        let right = history.commit(HeadState::new().freeze("right", vec![root])).unwrap();
        let tip = history.commit(HeadState::new().freeze("tip", vec![left])).unwrap();

        assert_eq!(history.common_ancestor(&tip, &right).unwrap().id, root);
        assert_eq!(history.common_ancestor(&tip, &left).unwrap().id, left);
        assert!(history.common_ancestor(&tip, &RevisionId::new()).is_none());
    }

    #[test]
    fn merge_revisions_combines_both_branches() {
        let logic = DiffLogic::default();
        let mut history = History::new();
        let mut head = HeadState::new();
        let live = song();

        let root = commit(&mut history, &mut head, &live, None, vec![]);
        let base = history.item_at(&root, &live.uuid, &logic).unwrap().unwrap();

        // Ours renames the verse.
        let mut ours_live = live.clone();
        ours_live.annotations[0].text = "Intro".into();
        let ours = commit(&mut history, &mut head, &ours_live, Some(&base), vec![root]);

        // Theirs adds a bridge and two key signatures.
        let mut theirs_live = live.clone();
        theirs_live.annotations.push(Annotation::new("a2", 4.0, "Bridge"));
        theirs_live.key_signatures = vec![
            KeySignature::new("k1", 0.0, 0, "major"),
            KeySignature::new("k2", 16.0, 9, "minor"),
        ];
        let theirs = commit(&mut history, &mut head, &theirs_live, Some(&base), vec![root]);

        let merged = history
            .merge_revisions(&ours, &theirs, &live.uuid, &logic)
            .unwrap();
        assert!(merged.iter().all(|e| e.change() == ChangeKind::Merged));

        let notes = merged
            .find(&Annotation::entity_kind(), ChangeKind::Merged)
            .unwrap();
        assert_eq!(
            decode_payload::<Annotation>(&notes.payload).unwrap(),
            vec![
                Annotation::new("a1", 0.0, "Intro"),
                Annotation::new("a2", 4.0, "Bridge"),
            ]
        );
        let keys = merged
            .find(&KeySignature::entity_kind(), ChangeKind::Merged)
            .unwrap();
        assert_eq!(keys.delta.count, 2);

        // The merged state lands back on the live item.
        let mut merged_live = ours_live.clone();
        logic.apply_to_item(&mut merged_live, &merged).unwrap();
        assert_eq!(merged_live.annotations.len(), 2);
        assert_eq!(merged_live.key_signatures.len(), 2);
    }

    #[test]
    fn merge_of_unknown_item_fails() {
        let logic = DiffLogic::default();
        let mut history = History::new();
        let root = history.commit(HeadState::new().freeze("root", vec![])).unwrap();
        assert!(matches!(
            history.merge_revisions(&root, &root, &ItemUuid::new(), &logic),
            Err(RevisionError::ItemMissing { .. })
        ));
    }
}
