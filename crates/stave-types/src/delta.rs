//! Delta markers: typed, described pointers to one payload stream.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Tag naming one entity kind (e.g. `"annotations"`).
///
/// Kinds are open: a tag this build has no handler for is still
/// representable, so history written by a newer build can be carried.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKind(String);

impl EntityKind {
    /// Create a kind tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityKind({})", self.0)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityKind {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// What a delta's payload represents relative to its entity kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// The complete current state of a live item.
    Full,
    /// Records that were added.
    Added,
    /// Records that were removed.
    Removed,
    /// New versions of records whose content changed.
    Changed,
    /// The complete state produced by a three-way merge.
    Merged,
}

impl ChangeKind {
    /// Returns `true` for kinds whose payload is a complete state.
    pub fn is_full_state(&self) -> bool {
        matches!(self, Self::Full | Self::Merged)
    }

    fn suffix(&self) -> Option<&'static str> {
        match self {
            Self::Full => None,
            Self::Added => Some("added"),
            Self::Removed => Some("removed"),
            Self::Changed => Some("changed"),
            Self::Merged => Some("merged"),
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix().unwrap_or("full"))
    }
}

/// Entity kind plus change kind: identifies which payload stream a delta
/// points at.
///
/// Text form is the bare kind for [`ChangeKind::Full`] and
/// `"<kind>:<change>"` otherwise, e.g. `"annotations:added"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeltaType {
    pub kind: EntityKind,
    pub change: ChangeKind,
}

impl DeltaType {
    pub fn new(kind: impl Into<EntityKind>, change: ChangeKind) -> Self {
        Self {
            kind: kind.into(),
            change,
        }
    }

    /// Full-state delta type for a kind.
    pub fn full(kind: impl Into<EntityKind>) -> Self {
        Self::new(kind, ChangeKind::Full)
    }
}

impl fmt::Display for DeltaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.change.suffix() {
            Some(suffix) => write!(f, "{}:{}", self.kind, suffix),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl FromStr for DeltaType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, change) = match s.split_once(':') {
            None => (s, ChangeKind::Full),
            Some((kind, suffix)) => {
                let change = match suffix {
                    "added" => ChangeKind::Added,
                    "removed" => ChangeKind::Removed,
                    "changed" => ChangeKind::Changed,
                    "merged" => ChangeKind::Merged,
                    _ => return Err(TypeError::InvalidDeltaType(s.to_string())),
                };
                (kind, change)
            }
        };
        if kind.is_empty() {
            return Err(TypeError::InvalidDeltaType(s.to_string()));
        }
        Ok(Self::new(kind, change))
    }
}

/// Pluralizable description template.
///
/// Both forms may contain the `{x}` placeholder, replaced by the count when
/// rendered: `"{x} annotation added"` / `"{x} annotations added"`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub singular: String,
    pub plural: String,
}

impl Description {
    /// Placeholder substituted with the count.
    pub const PLACEHOLDER: &'static str = "{x}";

    pub fn new(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            singular: singular.into(),
            plural: plural.into(),
        }
    }

    /// A description with a single form used for every count.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            singular: text.clone(),
            plural: text,
        }
    }

    /// Render for a count.
    pub fn render(&self, count: i64) -> String {
        let template = if count == 1 {
            &self.singular
        } else {
            &self.plural
        };
        template.replace(Self::PLACEHOLDER, &count.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.singular.is_empty() && self.plural.is_empty()
    }
}

/// A typed, described change-set marker.
///
/// A delta never embeds its payload; the payload is held next to it (by a
/// tracked item, a diff, or a revision item) and looked up separately.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub delta_type: DeltaType,
    pub description: Description,
    pub count: i64,
}

impl Delta {
    pub fn new(delta_type: DeltaType, description: Description, count: i64) -> Self {
        Self {
            delta_type,
            description,
            count,
        }
    }

    /// The entity kind this delta points at.
    pub fn kind(&self) -> &EntityKind {
        &self.delta_type.kind
    }

    /// The change kind of this delta.
    pub fn change(&self) -> ChangeKind {
        self.delta_type.change
    }

    /// Human-readable summary, e.g. `"2 annotations added"`.
    pub fn summary(&self) -> String {
        self.description.render(self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_type_text_form() {
        assert_eq!(DeltaType::full("annotations").to_string(), "annotations");
        assert_eq!(
            DeltaType::new("annotations", ChangeKind::Added).to_string(),
            "annotations:added"
        );
        assert_eq!(
            DeltaType::new("keySignatures", ChangeKind::Merged).to_string(),
            "keySignatures:merged"
        );
    }

    #[test]
    fn delta_type_parse_roundtrip() {
        for change in [
            ChangeKind::Full,
            ChangeKind::Added,
            ChangeKind::Removed,
            ChangeKind::Changed,
            ChangeKind::Merged,
        ] {
            let dt = DeltaType::new("timeSignatures", change);
            assert_eq!(dt.to_string().parse::<DeltaType>().unwrap(), dt);
        }
    }

    #[test]
    fn delta_type_rejects_unknown_suffix_and_empty_kind() {
        assert!(matches!(
            "annotations:exploded".parse::<DeltaType>(),
            Err(TypeError::InvalidDeltaType(_))
        ));
        assert!(matches!(
            ":added".parse::<DeltaType>(),
            Err(TypeError::InvalidDeltaType(_))
        ));
        assert!("".parse::<DeltaType>().is_err());
    }

    #[test]
    fn description_pluralizes() {
        let d = Description::new("{x} annotation added", "{x} annotations added");
        assert_eq!(d.render(1), "1 annotation added");
        assert_eq!(d.render(0), "0 annotations added");
        assert_eq!(d.render(3), "3 annotations added");
    }

    #[test]
    fn plain_description_ignores_count_form() {
        let d = Description::plain("merged");
        assert_eq!(d.render(1), "merged");
        assert_eq!(d.render(7), "merged");
        assert!(!d.is_empty());
        assert!(Description::default().is_empty());
    }

    #[test]
    fn delta_summary_uses_count() {
        let delta = Delta::new(
            DeltaType::new("annotations", ChangeKind::Removed),
            Description::new("{x} annotation removed", "{x} annotations removed"),
            2,
        );
        assert_eq!(delta.summary(), "2 annotations removed");
        assert_eq!(delta.kind().as_str(), "annotations");
        assert_eq!(delta.change(), ChangeKind::Removed);
    }

    #[test]
    fn full_state_kinds() {
        assert!(ChangeKind::Full.is_full_state());
        assert!(ChangeKind::Merged.is_full_state());
        assert!(!ChangeKind::Added.is_full_state());
    }
}
