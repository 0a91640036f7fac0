//!
//! This is the selector registry.
//!
//! Selector names are interned to small, copyable handles: two registrations
//! of the same name always yield the same handle, so selector equality is a
//! plain integer comparison. Interned names live for the whole process and
//! are never destroyed.
//!

use mort_core::{HashTable, TableKey};

/// An interned selector.
///
/// This is fast to move, clone and compare; handle equality is name equality.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Sel(pub u32);

impl TableKey for Sel {
    fn table_hash(&self) -> u32 {
        self.0
    }
}

struct SelectorEntry {
    name: &'static str,
    selector: Sel,
}

fn entry_name(entry: &SelectorEntry) -> &str {
    entry.name
}

fn entry_equals(a: &SelectorEntry, b: &SelectorEntry) -> bool {
    a.name == b.name
}

/// The table of all interned selectors.
///
/// The table itself is unsynchronized; the runtime wraps it in a
/// reader-writer lock and re-checks under the write lock before inserting,
/// so concurrent first registrations of a name produce a single handle.
pub struct SelectorTable {
    by_name: HashTable<SelectorEntry, str>,
    names: Vec<&'static str>,
}

impl SelectorTable {
    /// Create an empty selector table.
    pub fn new() -> Self {
        Self {
            by_name: HashTable::with_capacity(64, entry_name, entry_equals),
            names: Vec::new(),
        }
    }

    /// Look up the handle for `name`, without interning it.
    pub fn lookup(&self, name: &str) -> Option<Sel> {
        self.by_name.get(name).map(|entry| entry.selector)
    }

    /// Intern `name`, returning its canonical handle.
    ///
    /// Registering an empty name is a caller error and panics.
    pub fn intern(&mut self, name: &str) -> Sel {
        if name.is_empty() {
            panic!("cannot register an empty selector name");
        }
        if let Some(selector) = self.lookup(name) {
            return selector;
        }

        // Selectors are process-lifetime entities, so the name is leaked.
        let name: &'static str = Box::leak(name.to_string().into_boxed_str());
        let selector = Sel(self.names.len() as u32);
        self.names.push(name);
        self.by_name.insert(SelectorEntry { name, selector });
        selector
    }

    /// Get the name behind an interned handle.
    pub fn name(&self, selector: Sel) -> &'static str {
        match self.names.get(selector.0 as usize) {
            Some(name) => name,
            None => panic!("unknown selector handle ({})", selector.0),
        }
    }

    /// The number of interned selectors.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no selector has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for SelectorTable {
    fn default() -> Self {
        Self::new()
    }
}
