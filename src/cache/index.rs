//! Name Index Module
//!
//! Ordered record of names written through the client, used for enumeration
//! because the backing store offers no key listing.
//!
//! The index is process-local. It starts empty on every run, is never
//! reconciled against the store, and can therefore go stale when records are
//! removed or written by anyone else.

// == Index Policy ==
/// Controls how deletes affect the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexPolicy {
    /// Names are only ever appended; deletes leave them in place
    #[default]
    AppendOnly,
    /// A successful delete removes every occurrence of the name
    PruneOnDelete,
}

// == Name Index ==
/// Append-only list of names in write order.
///
/// Duplicates are kept: a name written twice is listed twice.
#[derive(Debug, Default, Clone)]
pub struct NameIndex {
    names: Vec<String>,
}

impl NameIndex {
    // == Constructor ==
    /// Creates an empty index.
    pub fn new() -> Self {
        Self { names: Vec::new() }
    }

    // == Record ==
    /// Appends a name at the end of the write order.
    pub fn record(&mut self, name: &str) {
        self.names.push(name.to_string());
    }

    // == Forget ==
    /// Removes every occurrence of a name, returning how many were dropped.
    pub fn forget(&mut self, name: &str) -> usize {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        before - self.names.len()
    }

    // == Snapshot ==
    /// Returns the names in write order.
    pub fn snapshot(&self) -> Vec<String> {
        self.names.clone()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}
