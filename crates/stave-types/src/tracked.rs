use crate::delta::{Delta, EntityKind};
use crate::identity::ItemUuid;
use crate::node::Node;

/// Contract every versionable project component implements.
///
/// A tracked item exposes an ordered list of [`Delta`]s and, for each, the
/// payload node it points at. Live components (annotation tracks, the
/// timeline, ...) expose one `Full` delta per entity kind they own;
/// revision items may carry older, duplicate or unknown kinds, so lookups
/// through [`find_delta`](TrackedItem::find_delta) take the first match.
pub trait TrackedItem {
    /// Stable identity of the component across revisions.
    fn uuid(&self) -> ItemUuid;

    /// Display name used in revision listings.
    fn vcs_name(&self) -> String;

    /// Tag naming the item's diff logic (stored with revision items so the
    /// right entity handlers are picked on load).
    fn diff_logic(&self) -> String;

    /// The deltas this item currently exposes.
    fn deltas(&self) -> Vec<Delta>;

    /// Payload for the delta at `index`, or `None` if out of range.
    fn delta_payload(&self, index: usize) -> Option<Node>;

    /// Replace the full state of one entity kind with `payload`.
    ///
    /// Returns `false` if the item does not own that kind or cannot decode
    /// the payload. Read-only items keep the default.
    fn restore_payload(&mut self, _kind: &EntityKind, _payload: &Node) -> bool {
        false
    }

    /// First delta of the given kind, with its index.
    fn find_delta(&self, kind: &EntityKind) -> Option<(usize, Delta)> {
        self.deltas()
            .into_iter()
            .enumerate()
            .find(|(_, d)| d.kind() == kind)
    }

    /// Every delta paired with its payload. Deltas without a payload are
    /// skipped.
    fn delta_entries(&self) -> Vec<(Delta, Node)> {
        self.deltas()
            .into_iter()
            .enumerate()
            .filter_map(|(i, d)| self.delta_payload(i).map(|p| (d, p)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::{DeltaType, Description};

    struct Fixed {
        uuid: ItemUuid,
        entries: Vec<(Delta, Node)>,
    }

    impl TrackedItem for Fixed {
        fn uuid(&self) -> ItemUuid {
            self.uuid
        }
        fn vcs_name(&self) -> String {
            "fixed".into()
        }
        fn diff_logic(&self) -> String {
            "fixed".into()
        }
        fn deltas(&self) -> Vec<Delta> {
            self.entries.iter().map(|(d, _)| d.clone()).collect()
        }
        fn delta_payload(&self, index: usize) -> Option<Node> {
            self.entries.get(index).map(|(_, p)| p.clone())
        }
    }

    fn full(kind: &str, marker: i64) -> (Delta, Node) {
        (
            Delta::new(DeltaType::full(kind), Description::plain(kind), 0),
            Node::new(kind).with_property("marker", marker),
        )
    }

    #[test]
    fn find_delta_takes_first_match() {
        let item = Fixed {
            uuid: ItemUuid::new(),
            entries: vec![full("annotations", 1), full("tempo", 2), full("annotations", 3)],
        };
        let (index, _) = item.find_delta(&EntityKind::new("annotations")).unwrap();
        assert_eq!(index, 0);
        assert!(item.find_delta(&EntityKind::new("keySignatures")).is_none());
    }

    #[test]
    fn delta_entries_pair_payloads() {
        let item = Fixed {
            uuid: ItemUuid::new(),
            entries: vec![full("annotations", 1), full("tempo", 2)],
        };
        let entries = item.delta_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].1.i64_property("marker"), Some(2));
    }

    #[test]
    fn default_restore_is_refused() {
        let mut item = Fixed {
            uuid: ItemUuid::new(),
            entries: vec![],
        };
        assert!(!item.restore_payload(&EntityKind::new("annotations"), &Node::new("annotations")));
        assert!(item.delta_payload(0).is_none());
    }
}
