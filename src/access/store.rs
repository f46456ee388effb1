use std::collections::BTreeMap;

use crate::options::StoreLayouts;
use crate::record::{
    allocate_chain, DynamicRecord, DynamicStore, LabelTokenRecord, NeoStoreRecord, NodeRecord,
    PropertyKeyTokenRecord, PropertyRecord, Record, RelationshipRecord,
    RelationshipTypeTokenRecord, SchemaRule, StoreLayout,
};

use super::RecordAccess;

const FIXED_HEADER: usize = 1;

/// An in-memory record store keyed by id. Only written ids take space, so
/// sparse or very large ids are cheap.
#[derive(Clone, Debug)]
pub struct RecordStore<T> {
    slots: BTreeMap<u64, T>,
    layout: StoreLayout,
}

impl<T: Record> RecordStore<T> {
    /// Creates an empty store with the given geometry.
    pub fn new(layout: StoreLayout) -> Self {
        Self {
            slots: BTreeMap::new(),
            layout,
        }
    }

    /// Stores `record` in its slot, returning what was there.
    pub fn insert(&mut self, record: T) -> Option<T> {
        self.slots.insert(record.id(), record)
    }

    /// Snapshot of record `id`, or the not-in-use sentinel.
    pub fn get(&self, id: u64) -> T {
        self.slots
            .get(&id)
            .cloned()
            .unwrap_or_else(|| T::absent(id))
    }

    /// Bytes per record slot.
    pub fn record_size(&self) -> usize {
        self.layout.record_size
    }

    /// Bytes of per-record header.
    pub fn record_header_size(&self) -> usize {
        self.layout.header_size
    }

    /// Store geometry.
    pub fn layout(&self) -> StoreLayout {
        self.layout
    }

    /// One past the highest id ever written, saturating at `u64::MAX`.
    pub fn high_id(&self) -> u64 {
        self.slots
            .last_key_value()
            .map_or(0, |(id, _)| id.saturating_add(1))
    }

    /// Every written record in id order, in use or not.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.values()
    }
}

impl<T: Record> Default for RecordStore<T> {
    fn default() -> Self {
        Self::new(StoreLayout::new(FIXED_HEADER + 1, FIXED_HEADER))
    }
}

/// Every store of a graph, held in memory.
#[derive(Clone, Debug)]
pub struct StoreAccess {
    /// The node store.
    pub nodes: RecordStore<NodeRecord>,
    /// The relationship store.
    pub relationships: RecordStore<RelationshipRecord>,
    /// The property store.
    pub properties: RecordStore<PropertyRecord>,
    /// The label token store.
    pub label_tokens: RecordStore<LabelTokenRecord>,
    /// The property key token store.
    pub property_key_tokens: RecordStore<PropertyKeyTokenRecord>,
    /// The relationship type token store.
    pub relationship_type_tokens: RecordStore<RelationshipTypeTokenRecord>,
    /// The graph-global record.
    pub graph: NeoStoreRecord,
    dynamic: Vec<RecordStore<DynamicRecord>>,
}

impl StoreAccess {
    /// Empty stores using the given dynamic store geometry.
    pub fn new(layouts: &StoreLayouts) -> Self {
        Self {
            nodes: RecordStore::default(),
            relationships: RecordStore::default(),
            properties: RecordStore::default(),
            label_tokens: RecordStore::default(),
            property_key_tokens: RecordStore::default(),
            relationship_type_tokens: RecordStore::default(),
            graph: NeoStoreRecord::default(),
            dynamic: DynamicStore::ALL
                .iter()
                .map(|store| RecordStore::new(layouts.get(*store)))
                .collect(),
        }
    }

    /// The dynamic store `store`.
    pub fn dynamic_store(&self, store: DynamicStore) -> &RecordStore<DynamicRecord> {
        &self.dynamic[slot(store)]
    }

    /// Mutable access to the dynamic store `store`.
    pub fn dynamic_store_mut(&mut self, store: DynamicStore) -> &mut RecordStore<DynamicRecord> {
        &mut self.dynamic[slot(store)]
    }

    /// Writes `bytes` as a chain of full blocks starting at `first_id` and
    /// returns the ids used.
    pub fn put_chain(&mut self, store: DynamicStore, first_id: u64, bytes: &[u8]) -> Vec<u64> {
        let target = self.dynamic_store_mut(store);
        let capacity = target.layout().data_size();
        allocate_chain(first_id, bytes, capacity)
            .into_iter()
            .map(|block| {
                let id = block.id;
                target.insert(block);
                id
            })
            .collect()
    }

    /// Writes `rule` as a schema chain starting at `rule.id`.
    pub fn put_schema_rule(&mut self, rule: &SchemaRule) -> Vec<u64> {
        self.put_chain(DynamicStore::Schema, rule.id, &rule.encode())
    }
}

impl Default for StoreAccess {
    fn default() -> Self {
        Self::new(&StoreLayouts::default())
    }
}

// `DynamicStore::ALL` lists the variants in declaration order.
fn slot(store: DynamicStore) -> usize {
    store as usize
}

impl RecordAccess for StoreAccess {
    fn node(&self, id: u64) -> NodeRecord {
        self.nodes.get(id)
    }

    fn relationship(&self, id: u64) -> RelationshipRecord {
        self.relationships.get(id)
    }

    fn property(&self, id: u64) -> PropertyRecord {
        self.properties.get(id)
    }

    fn dynamic(&self, store: DynamicStore, id: u64) -> DynamicRecord {
        self.dynamic_store(store).get(id)
    }

    fn label_token(&self, id: u64) -> LabelTokenRecord {
        self.label_tokens.get(id)
    }

    fn property_key_token(&self, id: u64) -> PropertyKeyTokenRecord {
        self.property_key_tokens.get(id)
    }

    fn relationship_type_token(&self, id: u64) -> RelationshipTypeTokenRecord {
        self.relationship_type_tokens.get(id)
    }

    fn graph(&self) -> NeoStoreRecord {
        self.graph.clone()
    }

    fn layout(&self, store: DynamicStore) -> StoreLayout {
        self.dynamic_store(store).layout()
    }
}
