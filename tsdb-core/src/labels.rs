//! Label sets identifying a time series
//!
//! A series is identified by its full set of `(name, value)` pairs. The engine
//! hashes the set in order, so callers must canonicalize (sort by name) before
//! handing a set to an appender.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single label pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

/// An ordered sequence of label pairs
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(Vec<Label>);

impl Label {
    /// Create a new label pair
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Labels {
    /// Create a label set, keeping the given order
    pub fn new(labels: Vec<Label>) -> Self {
        Self(labels)
    }

    /// Create a label set from name/value pairs, keeping the given order
    pub fn from_pairs<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        Self(pairs.into_iter().map(|(n, v)| Label::new(n, v)).collect())
    }

    /// Sort labels by name.
    ///
    /// The sort is stable: labels sharing a name keep their relative order.
    /// Duplicates are not removed here; the engine decides how to treat them.
    pub fn canonicalize(&mut self) {
        self.0.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Consume and return the canonical form
    pub fn canonical(mut self) -> Self {
        self.canonicalize();
        self
    }

    /// Check whether labels are sorted by name
    pub fn is_canonical(&self) -> bool {
        self.0.windows(2).all(|w| w[0].name <= w[1].name)
    }

    /// Check whether any label name appears more than once.
    /// Only meaningful on a canonical set.
    pub fn has_duplicate_names(&self) -> bool {
        self.0.windows(2).any(|w| w[0].name == w[1].name)
    }

    /// Get the value of the first label with the given name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
    }

    /// Iterate over label pairs in order
    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Label>> for Labels {
    fn from(labels: Vec<Label>) -> Self {
        Self(labels)
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={:?}", label.name, label.value)?;
        }
        write!(f, "}}")
    }
}
