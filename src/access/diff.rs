use rustc_hash::FxHashMap;

use crate::record::{
    DynamicRecord, DynamicStore, LabelTokenRecord, NeoStoreRecord, NodeRecord,
    PropertyKeyTokenRecord, PropertyRecord, Record, RelationshipRecord,
    RelationshipTypeTokenRecord, StoreLayout,
};

use super::{DiffRecordAccess, RecordAccess, RecordChange, StoreAccess};

/// A change set layered over the stores it was applied to.
///
/// `base` holds the state before the change. Recording a change captures the
/// base record as the before image, so a record absent from `base` is a
/// creation and an after image that is not in use is a deletion.
#[derive(Clone, Debug)]
pub struct DiffStore {
    base: StoreAccess,
    nodes: FxHashMap<u64, RecordChange<NodeRecord>>,
    relationships: FxHashMap<u64, RecordChange<RelationshipRecord>>,
    properties: FxHashMap<u64, RecordChange<PropertyRecord>>,
    dynamic: FxHashMap<(DynamicStore, u64), RecordChange<DynamicRecord>>,
    label_tokens: FxHashMap<u64, RecordChange<LabelTokenRecord>>,
    property_key_tokens: FxHashMap<u64, RecordChange<PropertyKeyTokenRecord>>,
    relationship_type_tokens: FxHashMap<u64, RecordChange<RelationshipTypeTokenRecord>>,
    graph: Option<RecordChange<NeoStoreRecord>>,
}

impl DiffStore {
    /// An empty change set over `base`.
    pub fn new(base: StoreAccess) -> Self {
        Self {
            base,
            nodes: FxHashMap::default(),
            relationships: FxHashMap::default(),
            properties: FxHashMap::default(),
            dynamic: FxHashMap::default(),
            label_tokens: FxHashMap::default(),
            property_key_tokens: FxHashMap::default(),
            relationship_type_tokens: FxHashMap::default(),
            graph: None,
        }
    }

    /// The pre-change stores.
    pub fn base(&self) -> &StoreAccess {
        &self.base
    }

    /// Records `after` as the new state of its node.
    pub fn change_node(&mut self, after: NodeRecord) -> &mut Self {
        let before = self.base.nodes.get(after.id);
        self.nodes.insert(after.id, RecordChange::new(before, after));
        self
    }

    /// Records `after` as the new state of its relationship.
    pub fn change_relationship(&mut self, after: RelationshipRecord) -> &mut Self {
        let before = self.base.relationships.get(after.id);
        self.relationships
            .insert(after.id, RecordChange::new(before, after));
        self
    }

    /// Records `after` as the new state of its property record.
    pub fn change_property(&mut self, after: PropertyRecord) -> &mut Self {
        let before = self.base.properties.get(after.id);
        self.properties.insert(after.id, RecordChange::new(before, after));
        self
    }

    /// Records `after` as the new state of its block in `store`.
    pub fn change_dynamic(&mut self, store: DynamicStore, after: DynamicRecord) -> &mut Self {
        let before = self.base.dynamic(store, after.id);
        self.dynamic
            .insert((store, after.id), RecordChange::new(before, after));
        self
    }

    /// Records `after` as the new state of its label token.
    pub fn change_label_token(&mut self, after: LabelTokenRecord) -> &mut Self {
        let before = self.base.label_tokens.get(after.id);
        self.label_tokens
            .insert(after.id, RecordChange::new(before, after));
        self
    }

    /// Records `after` as the new state of its property key token.
    pub fn change_property_key_token(&mut self, after: PropertyKeyTokenRecord) -> &mut Self {
        let before = self.base.property_key_tokens.get(after.id);
        self.property_key_tokens
            .insert(after.id, RecordChange::new(before, after));
        self
    }

    /// Records `after` as the new state of its relationship type token.
    pub fn change_relationship_type_token(
        &mut self,
        after: RelationshipTypeTokenRecord,
    ) -> &mut Self {
        let before = self.base.relationship_type_tokens.get(after.id);
        self.relationship_type_tokens
            .insert(after.id, RecordChange::new(before, after));
        self
    }

    /// Records `after` as the new graph-global record.
    pub fn change_graph(&mut self, after: NeoStoreRecord) -> &mut Self {
        let before = self.base.graph.clone();
        self.graph = Some(RecordChange::new(before, after));
        self
    }

    /// Changed nodes in id order.
    pub fn node_changes(&self) -> Vec<&RecordChange<NodeRecord>> {
        sorted(self.nodes.iter())
    }

    /// Changed relationships in id order.
    pub fn relationship_changes(&self) -> Vec<&RecordChange<RelationshipRecord>> {
        sorted(self.relationships.iter())
    }

    /// Changed property records in id order.
    pub fn property_changes(&self) -> Vec<&RecordChange<PropertyRecord>> {
        sorted(self.properties.iter())
    }

    /// Changed blocks of `store` in id order.
    pub fn dynamic_changes(&self, store: DynamicStore) -> Vec<&RecordChange<DynamicRecord>> {
        let mut changes: Vec<_> = self
            .dynamic
            .iter()
            .filter(|((owner, _), _)| *owner == store)
            .map(|((_, id), change)| (*id, change))
            .collect();
        changes.sort_by_key(|(id, _)| *id);
        changes.into_iter().map(|(_, change)| change).collect()
    }

    /// Changed label tokens in id order.
    pub fn label_token_changes(&self) -> Vec<&RecordChange<LabelTokenRecord>> {
        sorted(self.label_tokens.iter())
    }

    /// Changed property key tokens in id order.
    pub fn property_key_token_changes(&self) -> Vec<&RecordChange<PropertyKeyTokenRecord>> {
        sorted(self.property_key_tokens.iter())
    }

    /// Changed relationship type tokens in id order.
    pub fn relationship_type_token_changes(
        &self,
    ) -> Vec<&RecordChange<RelationshipTypeTokenRecord>> {
        sorted(self.relationship_type_tokens.iter())
    }

    /// The graph record change, if any.
    pub fn graph_change(&self) -> Option<&RecordChange<NeoStoreRecord>> {
        self.graph.as_ref()
    }
}

fn sorted<'a, T>(
    changes: impl Iterator<Item = (&'a u64, &'a RecordChange<T>)>,
) -> Vec<&'a RecordChange<T>> {
    let mut changes: Vec<_> = changes.collect();
    changes.sort_by_key(|(id, _)| **id);
    changes.into_iter().map(|(_, change)| change).collect()
}

fn after_or<T: Record>(change: Option<&RecordChange<T>>, base: impl FnOnce() -> T) -> T {
    change.map(|change| change.after.clone()).unwrap_or_else(base)
}

impl RecordAccess for DiffStore {
    fn node(&self, id: u64) -> NodeRecord {
        after_or(self.nodes.get(&id), || self.base.node(id))
    }

    fn relationship(&self, id: u64) -> RelationshipRecord {
        after_or(self.relationships.get(&id), || self.base.relationship(id))
    }

    fn property(&self, id: u64) -> PropertyRecord {
        after_or(self.properties.get(&id), || self.base.property(id))
    }

    fn dynamic(&self, store: DynamicStore, id: u64) -> DynamicRecord {
        after_or(self.dynamic.get(&(store, id)), || self.base.dynamic(store, id))
    }

    fn label_token(&self, id: u64) -> LabelTokenRecord {
        after_or(self.label_tokens.get(&id), || self.base.label_token(id))
    }

    fn property_key_token(&self, id: u64) -> PropertyKeyTokenRecord {
        after_or(self.property_key_tokens.get(&id), || {
            self.base.property_key_token(id)
        })
    }

    fn relationship_type_token(&self, id: u64) -> RelationshipTypeTokenRecord {
        after_or(self.relationship_type_tokens.get(&id), || {
            self.base.relationship_type_token(id)
        })
    }

    fn graph(&self) -> NeoStoreRecord {
        after_or(self.graph.as_ref(), || self.base.graph())
    }

    fn layout(&self, store: DynamicStore) -> StoreLayout {
        self.base.layout(store)
    }
}

impl DiffRecordAccess for DiffStore {
    fn changed_node(&self, id: u64) -> Option<RecordChange<NodeRecord>> {
        self.nodes.get(&id).cloned()
    }

    fn changed_relationship(&self, id: u64) -> Option<RecordChange<RelationshipRecord>> {
        self.relationships.get(&id).cloned()
    }

    fn changed_property(&self, id: u64) -> Option<RecordChange<PropertyRecord>> {
        self.properties.get(&id).cloned()
    }

    fn changed_dynamic(&self, store: DynamicStore, id: u64) -> Option<RecordChange<DynamicRecord>> {
        self.dynamic.get(&(store, id)).cloned()
    }

    fn changed_graph(&self) -> Option<RecordChange<NeoStoreRecord>> {
        self.graph.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Ref;

    #[test]
    fn change_overlays_base_and_keeps_before_image() {
        let mut base = StoreAccess::default();
        base.nodes.insert(NodeRecord::new(1, Ref::to(10), Ref::NONE));
        let mut diff = DiffStore::new(base);
        diff.change_node(NodeRecord::absent(1))
            .change_node(NodeRecord::new(2, Ref::NONE, Ref::NONE));

        assert!(!diff.node(1).in_use);
        assert!(diff.previous_node(1).in_use);
        let created = diff.changed_node(2).unwrap();
        assert!(!created.before.in_use);
        assert!(created.after.in_use);
        assert!(diff.changed_node(3).is_none());
        let ids: Vec<u64> = diff.node_changes().iter().map(|c| c.after.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn dynamic_changes_are_keyed_per_store() {
        let mut diff = DiffStore::new(StoreAccess::default());
        diff.change_dynamic(DynamicStore::String, DynamicRecord::with_data(4, b"a".to_vec()));
        assert!(diff.changed_dynamic(DynamicStore::String, 4).is_some());
        assert!(diff.changed_dynamic(DynamicStore::Array, 4).is_none());
        assert_eq!(diff.dynamic_changes(DynamicStore::String).len(), 1);
    }
}
