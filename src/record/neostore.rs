use crate::types::Ref;

use super::Record;

/// The single graph-global record, owner of the graph property chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NeoStoreRecord {
    /// Head of the graph property chain.
    pub next_prop: Ref,
}

impl NeoStoreRecord {
    /// Creates the record with the given property chain head.
    pub fn new(next_prop: Ref) -> Self {
        Self { next_prop }
    }
}

impl Default for NeoStoreRecord {
    fn default() -> Self {
        Self::new(Ref::NONE)
    }
}

impl Record for NeoStoreRecord {
    fn id(&self) -> u64 {
        0
    }

    fn in_use(&self) -> bool {
        true
    }

    fn absent(_id: u64) -> Self {
        Self::default()
    }
}
