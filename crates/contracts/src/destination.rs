//! Destination identity, open mode, and the ordered destination set

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Identifies one output sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DestinationId {
    /// The process standard output
    Stdout,
    /// A named file. `-` is a file called `-`, not standard output.
    File(PathBuf),
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("standard output"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// How a file destination is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Create if missing, truncate existing contents
    #[default]
    Truncate,
    /// Create if missing, keep existing contents and write after them
    Append,
}

impl OpenMode {
    /// Pick the mode from the append flag
    pub fn from_append(append: bool) -> Self {
        if append {
            Self::Append
        } else {
            Self::Truncate
        }
    }
}

/// Insertion-ordered set of destinations.
///
/// Duplicates collapse to their first occurrence.
#[derive(Debug, Clone, Default)]
pub struct DestinationSet {
    order: Vec<DestinationId>,
    seen: HashSet<DestinationId>,
}

impl DestinationSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve file operands, in order, followed by the implicit standard output.
    pub fn resolve<I, P>(operands: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut set = Self::new();
        for operand in operands {
            set.insert(DestinationId::File(operand.into()));
        }
        set.insert(DestinationId::Stdout);
        set
    }

    /// Add a destination. Returns false if it was already present.
    pub fn insert(&mut self, id: DestinationId) -> bool {
        if !self.seen.insert(id.clone()) {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Whether the destination is in the set
    pub fn contains(&self, id: &DestinationId) -> bool {
        self.seen.contains(id)
    }

    /// Destinations in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &DestinationId> {
        self.order.iter()
    }

    /// Number of destinations
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl IntoIterator for DestinationSet {
    type Item = DestinationId;
    type IntoIter = std::vec::IntoIter<DestinationId>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.into_iter()
    }
}
