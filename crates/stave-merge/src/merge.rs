//! Three-way merge of tracked items.

use stave_diff::{DeltaEntry, Diff, DiffLogic, EntityLogic};
use stave_types::{ChangeKind, EntityKind, Node, TrackedItem};
use tracing::{debug, warn};

use crate::error::MergeResult;
use crate::report::{KindOutcome, MergeReport};

/// A merged diff together with the per-kind report.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergedItem {
    pub diff: Diff,
    pub report: MergeReport,
}

/// Three-way merge over tracked items.
pub trait ThreeWayMerge {
    /// Reconcile `target` against `ancestor`, reporting what happened to
    /// each kind.
    fn merge_items(
        &self,
        ancestor: &dyn TrackedItem,
        target: &dyn TrackedItem,
    ) -> MergeResult<MergedItem>;

    /// Reconcile `target` against `ancestor`, returning one
    /// [`ChangeKind::Merged`] entry per reconciled kind.
    fn create_merged_item(
        &self,
        ancestor: &dyn TrackedItem,
        target: &dyn TrackedItem,
    ) -> MergeResult<Diff> {
        Ok(self.merge_items(ancestor, target)?.diff)
    }
}

impl ThreeWayMerge for DiffLogic {
    fn merge_items(
        &self,
        ancestor: &dyn TrackedItem,
        target: &dyn TrackedItem,
    ) -> MergeResult<MergedItem> {
        let branch: Vec<DeltaEntry> = target
            .delta_entries()
            .into_iter()
            .map(DeltaEntry::from)
            .collect();
        let mut merged = MergedItem::default();
        let mut visited: Vec<EntityKind> = Vec::new();

        // Kinds the ancestor knows, seeded with the ancestor state.
        for (delta, payload) in ancestor.delta_entries() {
            let kind = delta.kind().clone();
            if visited.contains(&kind) {
                continue;
            }
            visited.push(kind.clone());

            let Some(logic) = self.registry().get(&kind) else {
                warn!(kind = %kind, item = %ancestor.uuid(), "no diff logic, kind left out of merge");
                merged.report.record(kind, KindOutcome::Skipped);
                continue;
            };

            let deltas = branch.iter().filter(|e| e.kind() == &kind).count();
            let state = fold_branch(self, payload, &kind, &branch)?;
            push_merged(&mut merged.diff, logic, state)?;
            let outcome = if deltas == 0 {
                KindOutcome::Carried
            } else {
                KindOutcome::Folded { deltas }
            };
            merged.report.record(kind, outcome);
        }

        // Kinds only the branch knows, seeded with an empty state.
        for entry in &branch {
            let kind = entry.kind();
            if visited.contains(kind) {
                continue;
            }
            visited.push(kind.clone());

            let Some(logic) = self.registry().get(kind) else {
                warn!(kind = %kind, item = %target.uuid(), "no diff logic, kind left out of merge");
                merged.report.record(kind.clone(), KindOutcome::Skipped);
                continue;
            };

            let deltas = branch.iter().filter(|e| e.kind() == kind).count();
            let state = fold_branch(self, logic.empty_payload(), kind, &branch)?;
            push_merged(&mut merged.diff, logic, state)?;
            merged
                .report
                .record(kind.clone(), KindOutcome::Adopted { deltas });
        }

        debug!(
            ancestor = %ancestor.uuid(),
            target = %target.uuid(),
            kinds = merged.diff.len(),
            adopted = merged.report.adopted().len(),
            "merged item"
        );
        Ok(merged)
    }
}

/// Fold every branch entry of `kind` onto `seed`, in branch order.
fn fold_branch(
    logic: &DiffLogic,
    seed: Node,
    kind: &EntityKind,
    branch: &[DeltaEntry],
) -> MergeResult<Node> {
    let mut state = seed;
    for entry in branch.iter().filter(|e| e.kind() == kind) {
        state = logic.fold(&state, entry)?;
    }
    Ok(state)
}

fn push_merged(diff: &mut Diff, logic: &dyn EntityLogic, state: Node) -> MergeResult<()> {
    let delta = logic.describe(ChangeKind::Merged, &state)?;
    diff.push(DeltaEntry::new(delta, state));
    Ok(())
}
