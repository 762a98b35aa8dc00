//! Item-level diffing and diff application.

use stave_types::{ChangeKind, EntityKind, Node, TrackedItem};
use tracing::{debug, warn};

use crate::entry::{DeltaEntry, Diff};
use crate::error::{DiffError, DiffResult};
use crate::logic::EntityLogic;
use crate::registry::LogicRegistry;

/// Diff and fold operations over whole tracked items, dispatching each
/// entity kind to its registered handler.
#[derive(Debug, Default)]
pub struct DiffLogic {
    registry: LogicRegistry,
}

impl DiffLogic {
    pub fn new(registry: LogicRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &LogicRegistry {
        &self.registry
    }

    /// Handler for a kind, or [`DiffError::UnknownKind`].
    pub fn handler(&self, kind: &EntityKind) -> DiffResult<&dyn EntityLogic> {
        self.registry
            .get(kind)
            .ok_or_else(|| DiffError::UnknownKind(kind.clone()))
    }

    /// Delta diffs turning `baseline` into `target`.
    ///
    /// Target-driven: each target delta is compared with the first baseline
    /// delta of the same kind, and kinds only the baseline has are ignored.
    /// A missing baseline payload counts as empty. Kinds without a handler
    /// are skipped.
    pub fn create_diff(
        &self,
        target: &dyn TrackedItem,
        baseline: &dyn TrackedItem,
    ) -> DiffResult<Diff> {
        let mut diff = Diff::new();

        for (delta, payload) in target.delta_entries() {
            let kind = delta.kind();
            let Some(logic) = self.registry.get(kind) else {
                warn!(kind = %kind, item = %target.uuid(), "skipping delta with no diff logic");
                continue;
            };

            let state = match baseline
                .find_delta(kind)
                .and_then(|(index, _)| baseline.delta_payload(index))
            {
                Some(state) if state.is_equivalent_to(&payload) => continue,
                Some(state) => state,
                None => logic.empty_payload(),
            };

            diff.extend(logic.diff(&state, &payload)?);
        }

        debug!(
            item = %target.uuid(),
            entries = diff.len(),
            "created diff"
        );
        Ok(diff)
    }

    /// Fold one delta entry onto `seed`.
    ///
    /// Added, removed and changed entries go through the matching merge
    /// function. Full and merged entries are complete states: they are
    /// reconciled by diffing `seed` against them and folding each bucket.
    pub fn fold(&self, seed: &Node, entry: &DeltaEntry) -> DiffResult<Node> {
        let logic = self.handler(entry.kind())?;
        match entry.change() {
            ChangeKind::Full | ChangeKind::Merged => {
                let mut state = seed.clone();
                for bucket in logic.diff(seed, &entry.payload)? {
                    state = fold_bucket(logic, &state, bucket.change(), &bucket.payload)?;
                }
                Ok(state)
            }
            change => fold_bucket(logic, seed, change, &entry.payload),
        }
    }

    /// Apply `diff` to a list of full-state entries.
    ///
    /// Each diff entry is folded onto the first state entry of its kind, or
    /// onto an empty payload if there is none; full and merged entries
    /// replace the state outright. Every touched entry comes back as a
    /// `Full` entry with a fresh count. Kinds without a handler are skipped.
    pub fn apply_diff(&self, entries: &[DeltaEntry], diff: &Diff) -> DiffResult<Vec<DeltaEntry>> {
        let mut states = entries.to_vec();

        for entry in diff {
            let kind = entry.kind();
            let Some(logic) = self.registry.get(kind) else {
                warn!(kind = %kind, "skipping diff entry with no diff logic");
                continue;
            };

            let position = states.iter().position(|s| s.kind() == kind);
            let next = if entry.change().is_full_state() {
                entry.payload.clone()
            } else {
                let seed = match position {
                    Some(i) => states[i].payload.clone(),
                    None => logic.empty_payload(),
                };
                self.fold(&seed, entry)?
            };
            let applied = DeltaEntry::new(logic.describe(ChangeKind::Full, &next)?, next);

            match position {
                Some(i) => states[i] = applied,
                None => states.push(applied),
            }
        }

        Ok(states)
    }

    /// Apply `diff` to a live item through
    /// [`TrackedItem::restore_payload`]. Returns the number of payloads
    /// restored.
    pub fn apply_to_item(&self, item: &mut dyn TrackedItem, diff: &Diff) -> DiffResult<usize> {
        let current: Vec<DeltaEntry> = item
            .delta_entries()
            .into_iter()
            .map(DeltaEntry::from)
            .collect();
        let applied = self.apply_diff(&current, diff)?;

        let touched: Vec<EntityKind> = diff
            .kinds()
            .into_iter()
            .filter(|k| self.registry.contains(k))
            .collect();

        let mut restored: Vec<&EntityKind> = Vec::new();
        for kind in &touched {
            let Some(entry) = applied.iter().find(|e| e.kind() == kind) else {
                continue;
            };
            if !item.restore_payload(kind, &entry.payload) {
                self.roll_back(item, &current, &restored);
                return Err(DiffError::RestoreRejected {
                    item: item.vcs_name(),
                    kind: kind.clone(),
                });
            }
            restored.push(kind);
        }

        debug!(item = %item.uuid(), restored = restored.len(), "applied diff to item");
        Ok(restored.len())
    }

    /// Put the pre-apply payload of each kind back into `item`. A kind the
    /// item had no delta for goes back to the empty payload.
    fn roll_back(&self, item: &mut dyn TrackedItem, previous: &[DeltaEntry], kinds: &[&EntityKind]) {
        for &kind in kinds.iter().rev() {
            let payload = match previous.iter().find(|e| e.kind() == kind) {
                Some(entry) => entry.payload.clone(),
                None => match self.registry.get(kind) {
                    Some(logic) => logic.empty_payload(),
                    None => continue,
                },
            };
            if !item.restore_payload(kind, &payload) {
                warn!(item = %item.uuid(), kind = %kind, "could not roll back restored payload");
            }
        }
    }
}

fn fold_bucket(
    logic: &dyn EntityLogic,
    seed: &Node,
    change: ChangeKind,
    payload: &Node,
) -> DiffResult<Node> {
    match change {
        ChangeKind::Added => logic.merge_added(seed, payload),
        ChangeKind::Removed => logic.merge_removed(seed, payload),
        ChangeKind::Changed => logic.merge_changed(seed, payload),
        ChangeKind::Full | ChangeKind::Merged => Ok(payload.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stave_records::{
        decode_payload, encode_payload, Annotation, AnnotationsTrack, KeySignature, Record,
        TimeSignature, Timeline,
    };
    use stave_types::{Delta, DeltaType, Description, ItemUuid};

    fn timeline(annotations: Vec<Annotation>) -> Timeline {
        let mut timeline = Timeline::with_uuid(ItemUuid::nil());
        timeline.annotations = annotations;
        timeline.time_signatures = vec![TimeSignature::new("t1", 0.0, 4, 4)];
        timeline
    }

    fn verse() -> Timeline {
        timeline(vec![Annotation::new("a1", 0.0, "Verse")])
    }

    fn chorus_and_bridge() -> Timeline {
        timeline(vec![
            Annotation::new("a1", 0.0, "Chorus"),
            Annotation::new("a2", 4.0, "Bridge"),
        ])
    }

    #[test]
    fn diff_of_item_with_itself_is_empty() {
        let logic = DiffLogic::default();
        let item = chorus_and_bridge();
        assert!(logic.create_diff(&item, &item).unwrap().is_empty());
    }

    #[test]
    fn changed_and_added_annotations() {
        let logic = DiffLogic::default();
        let diff = logic.create_diff(&chorus_and_bridge(), &verse()).unwrap();

        assert_eq!(diff.len(), 2);
        assert_eq!(diff.summaries(), vec!["1 annotation added", "1 annotation changed"]);

        let kind = Annotation::entity_kind();
        let added = diff.find(&kind, ChangeKind::Added).unwrap();
        assert_eq!(
            decode_payload::<Annotation>(&added.payload).unwrap(),
            vec![Annotation::new("a2", 4.0, "Bridge")]
        );
        let changed = diff.find(&kind, ChangeKind::Changed).unwrap();
        assert_eq!(
            decode_payload::<Annotation>(&changed.payload).unwrap(),
            vec![Annotation::new("a1", 0.0, "Chorus")]
        );
    }

    #[test]
    fn applying_the_diff_reproduces_the_target() {
        let logic = DiffLogic::default();
        let diff = logic.create_diff(&chorus_and_bridge(), &verse()).unwrap();

        let mut item = verse();
        assert_eq!(logic.apply_to_item(&mut item, &diff).unwrap(), 1);
        assert_eq!(
            item.annotations,
            vec![
                Annotation::new("a1", 0.0, "Chorus"),
                Annotation::new("a2", 4.0, "Bridge"),
            ]
        );
        assert!(logic.create_diff(&item, &chorus_and_bridge()).unwrap().is_empty());
    }

    #[test]
    fn missing_baseline_kind_diffs_against_empty() {
        let logic = DiffLogic::default();
        let track = AnnotationsTrack::new("Markers");
        let mut target = Timeline::with_uuid(ItemUuid::nil());
        target.key_signatures = vec![KeySignature::new("k1", 0.0, 9, "minor")];

        let diff = logic.create_diff(&target, &track).unwrap();
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.entries[0].kind(), &KeySignature::entity_kind());
        assert_eq!(diff.entries[0].change(), ChangeKind::Added);
    }

    #[test]
    fn baseline_only_kinds_are_ignored() {
        let logic = DiffLogic::default();
        let track = AnnotationsTrack::new("Markers");
        let diff = logic.create_diff(&track, &verse()).unwrap();
        // The baseline's time signatures and key signatures are not reported.
        assert_eq!(diff.kinds(), vec![Annotation::entity_kind()]);
        assert_eq!(diff.summaries(), vec!["1 annotation removed"]);
    }

    #[test]
    fn unknown_kinds_are_skipped() {
        let logic = DiffLogic::new(LogicRegistry::empty());
        let diff = logic.create_diff(&chorus_and_bridge(), &verse()).unwrap();
        assert!(diff.is_empty());
        assert!(matches!(
            logic.fold(&Node::new("annotations"), &crate::full_entry::<Annotation>(&[])),
            Err(DiffError::UnknownKind(_))
        ));
    }

    #[test]
    fn fold_reconciles_full_state() {
        let logic = DiffLogic::default();
        let seed = encode_payload(&[
            Annotation::new("a1", 0.0, "Verse"),
            Annotation::new("a3", 8.0, "Outro"),
        ]);
        let target = crate::full_entry(&[
            Annotation::new("a1", 0.0, "Chorus"),
            Annotation::new("a2", 4.0, "Bridge"),
        ]);
        let folded = logic.fold(&seed, &target).unwrap();
        assert_eq!(folded, target.payload);
    }

    #[test]
    fn apply_diff_creates_missing_entries() {
        let logic = DiffLogic::default();
        let added = DeltaEntry::new(
            Delta::new(
                DeltaType::new(KeySignature::KIND, ChangeKind::Added),
                Description::plain("keys"),
                1,
            ),
            encode_payload(&[KeySignature::new("k1", 0.0, 0, "major")]),
        );
        let diff: Diff = [added].into_iter().collect();

        let states = logic.apply_diff(&[], &diff).unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].change(), ChangeKind::Full);
        assert_eq!(states[0].delta.count, 1);
        assert_eq!(states[0].delta.summary(), "1 key signature");
    }

    #[test]
    fn read_only_items_reject_restores() {
        struct Frozen(Timeline);

        impl TrackedItem for Frozen {
            fn uuid(&self) -> ItemUuid {
                self.0.uuid()
            }
            fn vcs_name(&self) -> String {
                "frozen".into()
            }
            fn diff_logic(&self) -> String {
                self.0.diff_logic()
            }
            fn deltas(&self) -> Vec<Delta> {
                self.0.deltas()
            }
            fn delta_payload(&self, index: usize) -> Option<Node> {
                self.0.delta_payload(index)
            }
        }

        let logic = DiffLogic::default();
        let diff = logic.create_diff(&chorus_and_bridge(), &verse()).unwrap();
        let mut frozen = Frozen(verse());
        assert!(matches!(
            logic.apply_to_item(&mut frozen, &diff),
            Err(DiffError::RestoreRejected { ref item, .. }) if item == "frozen"
        ));
    }

    fn merged(kind: &str, payload: Node, count: i64) -> DeltaEntry {
        DeltaEntry::new(
            Delta::new(
                DeltaType::new(kind, ChangeKind::Merged),
                Description::plain("merged"),
                count,
            ),
            payload,
        )
    }

    #[test]
    fn rejected_restore_leaves_item_untouched() {
        let logic = DiffLogic::default();
        let mut track =
            AnnotationsTrack::new("Markers").with_records([Annotation::new("a1", 0.0, "Verse")]);
        let before = track.records().to_vec();

        let diff: Diff = [
            merged(
                Annotation::KIND,
                encode_payload(&[Annotation::new("a9", 2.0, "Drop")]),
                1,
            ),
            merged(
                KeySignature::KIND,
                encode_payload(&[KeySignature::new("k1", 0.0, 0, "major")]),
                1,
            ),
        ]
        .into_iter()
        .collect();

        assert!(matches!(
            logic.apply_to_item(&mut track, &diff),
            Err(DiffError::RestoreRejected { ref kind, .. }) if kind.as_str() == KeySignature::KIND
        ));
        assert_eq!(track.records(), before.as_slice());
    }
}
