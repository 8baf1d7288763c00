//! Labels, index keys and ordered index sets for indexed components.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;

/// An identifier for a single set member, e.g. a phase (`Liq`) or a component (`H2O`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub String);

impl Label {
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self { Self(s.to_string()) }
}

impl From<String> for Label {
    fn from(s: String) -> Self { Self(s) }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The key of one entry of an indexed component.
///
/// `Unindexed` is the only member of the trivial singleton set used by scalar
/// components. Every other key is a tuple of labels, one per dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndexKey {
    Unindexed,
    Tuple(SmallVec<[Label; 2]>),
}

impl IndexKey {
    pub fn single(label: impl Into<Label>) -> Self {
        let mut labels = SmallVec::new();
        labels.push(label.into());
        IndexKey::Tuple(labels)
    }

    pub fn pair(first: impl Into<Label>, second: impl Into<Label>) -> Self {
        let mut labels = SmallVec::new();
        labels.push(first.into());
        labels.push(second.into());
        IndexKey::Tuple(labels)
    }

    pub fn labels(&self) -> &[Label] {
        match self {
            IndexKey::Unindexed => &[],
            IndexKey::Tuple(labels) => labels.as_slice(),
        }
    }

    pub fn dimen(&self) -> usize { self.labels().len() }

    /// Concatenation of two keys; used to build cartesian products.
    pub fn join(&self, other: &IndexKey) -> IndexKey {
        match (self, other) {
            (IndexKey::Unindexed, k) | (k, IndexKey::Unindexed) => k.clone(),
            (IndexKey::Tuple(a), IndexKey::Tuple(b)) => {
                IndexKey::Tuple(a.iter().chain(b.iter()).cloned().collect())
            }
        }
    }

    /// Name of the entry of component `component` at this key: `k_eq` or `k_eq[R1]`.
    pub fn entry_name(&self, component: &str) -> String {
        match self {
            IndexKey::Unindexed => component.to_string(),
            IndexKey::Tuple(labels) => {
                let parts: Vec<&str> = labels.iter().map(Label::as_str).collect();
                format!("{}[{}]", component, parts.join(","))
            }
        }
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Unindexed => f.write_str("None"),
            IndexKey::Tuple(labels) if labels.len() == 1 => write!(f, "{}", labels[0]),
            IndexKey::Tuple(labels) => {
                let parts: Vec<&str> = labels.iter().map(Label::as_str).collect();
                write!(f, "({})", parts.join(","))
            }
        }
    }
}

impl From<&str> for IndexKey {
    fn from(s: &str) -> Self { IndexKey::single(s) }
}

impl From<(&str, &str)> for IndexKey {
    fn from((a, b): (&str, &str)) -> Self { IndexKey::pair(a, b) }
}

/// An ordered, duplicate-free set of index keys. Iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct IndexSet {
    keys: Vec<IndexKey>,
    lookup: HashSet<IndexKey>,
}

impl IndexSet {
    pub fn new() -> Self { Self::default() }

    /// The trivial singleton set indexing scalar components.
    pub fn unindexed() -> Self {
        let mut set = Self::new();
        set.insert(IndexKey::Unindexed);
        set
    }

    pub fn from_labels<I, L>(labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        let mut set = Self::new();
        for label in labels {
            set.insert(IndexKey::single(label));
        }
        set
    }

    /// Cartesian product in row-major order: every key of `self` paired with every key of `other`.
    pub fn product(&self, other: &IndexSet) -> Self {
        let mut set = Self::new();
        for a in &self.keys {
            for b in &other.keys {
                set.insert(a.join(b));
            }
        }
        set
    }

    /// Returns `false` if the key was already present.
    pub fn insert(&mut self, key: IndexKey) -> bool {
        if self.lookup.insert(key.clone()) {
            self.keys.push(key);
            true
        } else {
            false
        }
    }

    pub fn is_unindexed(&self) -> bool {
        self.keys.len() == 1 && self.keys[0] == IndexKey::Unindexed
    }

    pub fn contains(&self, key: &IndexKey) -> bool { self.lookup.contains(key) }
    pub fn len(&self) -> usize { self.keys.len() }
    pub fn is_empty(&self) -> bool { self.keys.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = &IndexKey> { self.keys.iter() }

    /// Members of a one-dimensional set, as labels.
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.keys.iter().filter_map(|k| match k.labels() {
            [only] => Some(only),
            _ => None,
        })
    }
}

impl PartialEq for IndexSet {
    fn eq(&self, other: &Self) -> bool { self.keys == other.keys }
}

impl<'a> IntoIterator for &'a IndexSet {
    type Item = &'a IndexKey;
    type IntoIter = std::slice::Iter<'a, IndexKey>;
    fn into_iter(self) -> Self::IntoIter { self.keys.iter() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_is_row_major() {
        let phases = IndexSet::from_labels(["Liq", "Vap"]);
        let comps = IndexSet::from_labels(["A", "B"]);
        let pc: Vec<IndexKey> = phases.product(&comps).iter().cloned().collect();
        assert_eq!(
            pc,
            vec![
                IndexKey::pair("Liq", "A"),
                IndexKey::pair("Liq", "B"),
                IndexKey::pair("Vap", "A"),
                IndexKey::pair("Vap", "B"),
            ]
        );
    }

    #[test]
    fn test_unindexed_set() {
        let s = IndexSet::unindexed();
        assert!(s.is_unindexed());
        assert!(!IndexSet::from_labels(["R1"]).is_unindexed());
        assert_eq!(IndexSet::unindexed().product(&IndexSet::from_labels(["a"])).len(), 1);
    }

    #[test]
    fn test_duplicates_are_ignored() {
        let mut s = IndexSet::from_labels(["a", "b"]);
        assert!(!s.insert(IndexKey::single("a")));
        assert_eq!(s.len(), 2);
        let labels: Vec<&str> = s.labels().map(Label::as_str).collect();
        assert_eq!(labels, vec!["a", "b"]);
    }

    #[test]
    fn test_entry_names_and_display() {
        assert_eq!(IndexKey::Unindexed.entry_name("k"), "k");
        assert_eq!(IndexKey::single("R1").entry_name("k_eq"), "k_eq[R1]");
        assert_eq!(IndexKey::pair("Liq", "A").entry_name("x"), "x[Liq,A]");
        assert_eq!(IndexKey::Unindexed.to_string(), "None");
        assert_eq!(IndexKey::pair("Liq", "A").to_string(), "(Liq,A)");
    }
}
