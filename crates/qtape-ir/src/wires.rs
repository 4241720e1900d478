//! Wire labels and ordered wire sets.

use serde::{Deserialize, Serialize};
use std::fmt;

use rustc_hash::FxHashSet;

/// An opaque label for a single addressable subsystem.
///
/// Integer and string labels can be mixed freely; two wires are the same
/// only if they are the same variant with the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Wire {
    /// Integer label.
    Index(i64),
    /// String label.
    Label(String),
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wire::Index(i) => write!(f, "{i}"),
            Wire::Label(s) => write!(f, "'{s}'"),
        }
    }
}

impl From<i32> for Wire {
    fn from(i: i32) -> Self {
        Wire::Index(i64::from(i))
    }
}

impl From<i64> for Wire {
    fn from(i: i64) -> Self {
        Wire::Index(i)
    }
}

impl From<u32> for Wire {
    fn from(i: u32) -> Self {
        Wire::Index(i64::from(i))
    }
}

impl From<usize> for Wire {
    fn from(i: usize) -> Self {
        Wire::Index(i64::try_from(i).expect("wire index overflow: exceeds i64::MAX"))
    }
}

impl From<&str> for Wire {
    fn from(s: &str) -> Self {
        Wire::Label(s.to_string())
    }
}

impl From<String> for Wire {
    fn from(s: String) -> Self {
        Wire::Label(s)
    }
}

impl From<&Wire> for Wire {
    fn from(w: &Wire) -> Self {
        w.clone()
    }
}

/// An ordered sequence of wire labels.
///
/// Order is significant: it fixes how eigenvalues and matrices of
/// multi-wire objects are laid out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wires(Vec<Wire>);

impl Wires {
    /// Create wires from labels, keeping their order.
    pub fn new<W: Into<Wire>>(wires: impl IntoIterator<Item = W>) -> Self {
        Self(wires.into_iter().map(Into::into).collect())
    }

    /// An empty wire set.
    pub fn empty() -> Self {
        Self(vec![])
    }

    /// Order-preserving union: every label appears once, at the position
    /// of its first occurrence.
    pub fn union<'a>(sets: impl IntoIterator<Item = &'a Wires>) -> Self {
        let mut seen = FxHashSet::default();
        let mut out = vec![];
        for set in sets {
            for w in &set.0 {
                if seen.insert(w) {
                    out.push(w.clone());
                }
            }
        }
        Self(out)
    }

    /// The first label that appears more than once, if any.
    pub fn first_duplicate(&self) -> Option<&Wire> {
        let mut seen = FxHashSet::default();
        self.0.iter().find(|w| !seen.insert(*w))
    }

    /// True if the two sets share at least one label.
    pub fn intersects(&self, other: &Wires) -> bool {
        self.shared_with(other).is_some()
    }

    /// The first label of `self` that also appears in `other`.
    pub fn shared_with(&self, other: &Wires) -> Option<&Wire> {
        self.0.iter().find(|w| other.contains(w))
    }

    /// Position of a label.
    pub fn index_of(&self, wire: &Wire) -> Option<usize> {
        self.0.iter().position(|w| w == wire)
    }

    /// Check membership.
    pub fn contains(&self, wire: &Wire) -> bool {
        self.0.contains(wire)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no labels.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the labels in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Wire> {
        self.0.iter()
    }

    /// Labels as a slice.
    pub fn as_slice(&self) -> &[Wire] {
        &self.0
    }
}

impl fmt::Display for Wires {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, w) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{w}")?;
        }
        write!(f, "]")
    }
}

impl<'a> IntoIterator for &'a Wires {
    type Item = &'a Wire;
    type IntoIter = std::slice::Iter<'a, Wire>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<W: Into<Wire>> FromIterator<W> for Wires {
    fn from_iter<T: IntoIterator<Item = W>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<Wire>> for Wires {
    fn from(wires: Vec<Wire>) -> Self {
        Self(wires)
    }
}

impl<W: Into<Wire>, const N: usize> From<[W; N]> for Wires {
    fn from(wires: [W; N]) -> Self {
        Self::new(wires)
    }
}

impl From<Wire> for Wires {
    fn from(wire: Wire) -> Self {
        Self(vec![wire])
    }
}

impl From<i32> for Wires {
    fn from(i: i32) -> Self {
        Self(vec![i.into()])
    }
}

impl From<usize> for Wires {
    fn from(i: usize) -> Self {
        Self(vec![i.into()])
    }
}

impl From<&str> for Wires {
    fn from(s: &str) -> Self {
        Self(vec![s.into()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_display() {
        assert_eq!(format!("{}", Wire::from(3)), "3");
        assert_eq!(format!("{}", Wire::from("a")), "'a'");
        assert_eq!(format!("{}", Wires::from([0, 1])), "[0, 1]");
    }

    #[test]
    fn test_mixed_labels_are_distinct() {
        assert_ne!(Wire::from(0), Wire::from("0"));
    }

    #[test]
    fn test_union_preserves_first_occurrence() {
        let a = Wires::from([2, 0]);
        let b = Wires::from([0, 5, 2, 7]);
        assert_eq!(Wires::union([&a, &b]), Wires::from([2, 0, 5, 7]));
    }

    #[test]
    fn test_first_duplicate() {
        assert_eq!(Wires::from([0, 1, 2]).first_duplicate(), None);
        assert_eq!(
            Wires::from(["a", "b", "a"]).first_duplicate(),
            Some(&Wire::from("a"))
        );
    }

    #[test]
    fn test_intersects() {
        let a = Wires::from([0, 1]);
        assert!(a.intersects(&Wires::from([1, 2])));
        assert!(!a.intersects(&Wires::from([2, 3])));
        assert_eq!(a.index_of(&Wire::from(1)), Some(1));
    }
}
