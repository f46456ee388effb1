#![forbid(unsafe_code)]

//! Record resolution for the checkers.
//!
//! Checkers never hold references between records; every pointer is resolved
//! again through a [`RecordAccess`], which hands out value snapshots and
//! answers with the record's [`absent`](crate::record::Record::absent)
//! sentinel for ids it does not hold. [`DiffRecordAccess`] adds the view of a
//! change set used by the `check_change` entry points.

mod diff;
mod store;

pub use diff::DiffStore;
pub use store::{RecordStore, StoreAccess};

use crate::record::{
    DynamicRecord, DynamicStore, LabelTokenRecord, NeoStoreRecord, NodeRecord,
    PropertyKeyTokenRecord, PropertyRecord, RelationshipRecord, RelationshipTypeTokenRecord,
    StoreLayout,
};

/// The before and after image of one changed record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordChange<T> {
    /// State before the change.
    pub before: T,
    /// State after the change.
    pub after: T,
}

impl<T> RecordChange<T> {
    /// Pairs two images of the same record.
    pub fn new(before: T, after: T) -> Self {
        Self { before, after }
    }
}

/// Read-only, snapshot-returning access to every store.
pub trait RecordAccess {
    /// Node `id`.
    fn node(&self, id: u64) -> NodeRecord;
    /// Relationship `id`.
    fn relationship(&self, id: u64) -> RelationshipRecord;
    /// Property record `id`.
    fn property(&self, id: u64) -> PropertyRecord;
    /// Block `id` of the given dynamic store.
    fn dynamic(&self, store: DynamicStore, id: u64) -> DynamicRecord;
    /// Label token `id`.
    fn label_token(&self, id: u64) -> LabelTokenRecord;
    /// Property key token `id`.
    fn property_key_token(&self, id: u64) -> PropertyKeyTokenRecord;
    /// Relationship type token `id`.
    fn relationship_type_token(&self, id: u64) -> RelationshipTypeTokenRecord;
    /// The graph-global record.
    fn graph(&self) -> NeoStoreRecord;
    /// Record geometry of a dynamic store.
    fn layout(&self, store: DynamicStore) -> StoreLayout;
}

/// Record access over a change set.
///
/// The plain [`RecordAccess`] getters answer with the after image. The
/// `changed_*` queries return `Some` only for records the change touched.
pub trait DiffRecordAccess: RecordAccess {
    /// Change to node `id`, if any.
    fn changed_node(&self, id: u64) -> Option<RecordChange<NodeRecord>>;
    /// Change to relationship `id`, if any.
    fn changed_relationship(&self, id: u64) -> Option<RecordChange<RelationshipRecord>>;
    /// Change to property record `id`, if any.
    fn changed_property(&self, id: u64) -> Option<RecordChange<PropertyRecord>>;
    /// Change to block `id` of a dynamic store, if any.
    fn changed_dynamic(&self, store: DynamicStore, id: u64) -> Option<RecordChange<DynamicRecord>>;
    /// Change to the graph-global record, if any.
    fn changed_graph(&self) -> Option<RecordChange<NeoStoreRecord>>;

    /// Node `id` as it was before the change.
    fn previous_node(&self, id: u64) -> NodeRecord {
        self.changed_node(id)
            .map(|change| change.before)
            .unwrap_or_else(|| self.node(id))
    }

    /// Relationship `id` as it was before the change.
    fn previous_relationship(&self, id: u64) -> RelationshipRecord {
        self.changed_relationship(id)
            .map(|change| change.before)
            .unwrap_or_else(|| self.relationship(id))
    }

    /// Property record `id` as it was before the change.
    fn previous_property(&self, id: u64) -> PropertyRecord {
        self.changed_property(id)
            .map(|change| change.before)
            .unwrap_or_else(|| self.property(id))
    }

    /// The graph-global record as it was before the change.
    fn previous_graph(&self) -> NeoStoreRecord {
        self.changed_graph()
            .map(|change| change.before)
            .unwrap_or_else(|| self.graph())
    }
}
