//! Store builders shared by the checker tests.

use std::fmt::Debug;
use std::ops::{Deref, DerefMut};

use crate::access::{DiffStore, StoreAccess};
use crate::record::{
    DynamicRecord, DynamicStore, LabelTokenRecord, NeoStoreRecord, NodeRecord,
    PropertyKeyTokenRecord, PropertyRecord, RelationshipRecord, RelationshipTypeTokenRecord,
    SchemaRule,
};
use crate::types::Ref;

/// An in-memory store populated record by record.
#[derive(Default)]
pub(crate) struct Fixture {
    store: StoreAccess,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn access(&self) -> &StoreAccess {
        &self.store
    }

    pub(crate) fn node(&mut self, record: NodeRecord) -> NodeRecord {
        self.store.nodes.insert(record.clone());
        record
    }

    pub(crate) fn relationship(&mut self, record: RelationshipRecord) -> RelationshipRecord {
        self.store.relationships.insert(record.clone());
        record
    }

    pub(crate) fn property(&mut self, record: PropertyRecord) -> PropertyRecord {
        self.store.properties.insert(record.clone());
        record
    }

    pub(crate) fn dynamic(&mut self, store: DynamicStore, record: DynamicRecord) -> DynamicRecord {
        self.store.dynamic_store_mut(store).insert(record.clone());
        record
    }

    pub(crate) fn chain(&mut self, store: DynamicStore, first: u64, bytes: &[u8]) -> Vec<u64> {
        self.store.put_chain(store, first, bytes)
    }

    /// In-use label tokens with the given ids.
    pub(crate) fn labels(&mut self, ids: &[u32]) {
        for id in ids {
            self.store
                .label_tokens
                .insert(LabelTokenRecord::new(u64::from(*id)));
        }
    }

    pub(crate) fn property_keys(&mut self, ids: &[u32]) {
        for id in ids {
            self.store
                .property_key_tokens
                .insert(PropertyKeyTokenRecord::new(u64::from(*id)));
        }
    }

    pub(crate) fn relationship_types(&mut self, ids: &[u32]) {
        for id in ids {
            self.store
                .relationship_type_tokens
                .insert(RelationshipTypeTokenRecord::new(u64::from(*id)));
        }
    }

    pub(crate) fn graph_properties(&mut self, head: Ref) {
        self.store.graph = NeoStoreRecord::new(head);
    }

    pub(crate) fn schema_rule(&mut self, rule: &SchemaRule) -> Vec<u64> {
        self.store.put_schema_rule(rule)
    }
}

/// A change set over a [`Fixture`].
pub(crate) struct DiffFixture {
    diff: DiffStore,
}

impl DiffFixture {
    pub(crate) fn new() -> Self {
        Self::over(Fixture::new())
    }

    pub(crate) fn over(base: Fixture) -> Self {
        Self {
            diff: DiffStore::new(base.store),
        }
    }

    pub(crate) fn access(&self) -> &DiffStore {
        &self.diff
    }
}

impl Deref for DiffFixture {
    type Target = DiffStore;

    fn deref(&self) -> &DiffStore {
        &self.diff
    }
}

impl DerefMut for DiffFixture {
    fn deref_mut(&mut self) -> &mut DiffStore {
        &mut self.diff
    }
}

/// A relationship `source -> target` of type 0 that is first in both chains,
/// adjusted by `edit`.
pub(crate) fn chained(
    id: u64,
    source: u64,
    target: u64,
    edit: impl FnOnce(&mut RelationshipRecord),
) -> RelationshipRecord {
    let mut record = RelationshipRecord::new(id, source, target, 0);
    edit(&mut record);
    record
}

/// Asserts that both lists hold the same violations, ignoring order.
#[track_caller]
pub(crate) fn assert_same_violations<V: PartialEq + Debug>(actual: Vec<V>, expected: Vec<V>) {
    let mut remaining = actual;
    for violation in &expected {
        match remaining.iter().position(|candidate| candidate == violation) {
            Some(at) => {
                remaining.swap_remove(at);
            }
            None => panic!("missing {violation:?}; expected {expected:?}, got {remaining:?}"),
        }
    }
    assert!(remaining.is_empty(), "unexpected {remaining:?}");
}
