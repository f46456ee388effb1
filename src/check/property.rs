use rustc_hash::FxHashSet;

use crate::access::{DiffRecordAccess, RecordAccess};
use crate::record::{DynamicStore, PropertyBlock, PropertyOwner, PropertyRecord, PropertyType};
use crate::types::Ref;

use super::{CheckerEngine, PropertyViolation, RecordCheck};

/// Validates property records: block keys and values, the chain links to
/// neighbouring records, and on change the owner's chain.
#[derive(Copy, Clone, Debug, Default)]
pub struct PropertyRecordCheck;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Link {
    Prev,
    Next,
}

impl Link {
    fn value(self, record: &PropertyRecord) -> Ref {
        match self {
            Link::Prev => record.prev_prop,
            Link::Next => record.next_prop,
        }
    }

    /// The pointer on the neighbour that must lead back.
    fn back(self, neighbour: &PropertyRecord) -> Ref {
        match self {
            Link::Prev => neighbour.next_prop,
            Link::Next => neighbour.prev_prop,
        }
    }

    fn illegal(self, value: Ref) -> PropertyViolation {
        match self {
            Link::Prev => PropertyViolation::IllegalPrevReference(value),
            Link::Next => PropertyViolation::IllegalNextReference(value),
        }
    }

    fn not_in_use(self, neighbour: PropertyRecord) -> PropertyViolation {
        match self {
            Link::Prev => PropertyViolation::PrevNotInUse(neighbour),
            Link::Next => PropertyViolation::NextNotInUse(neighbour),
        }
    }

    fn does_not_reference_back(self, neighbour: PropertyRecord) -> PropertyViolation {
        match self {
            Link::Prev => PropertyViolation::PreviousDoesNotReferenceBack(neighbour),
            Link::Next => PropertyViolation::NextDoesNotReferenceBack(neighbour),
        }
    }

    fn not_updated(self) -> PropertyViolation {
        match self {
            Link::Prev => PropertyViolation::PrevNotUpdated,
            Link::Next => PropertyViolation::NextNotUpdated,
        }
    }
}

fn value_store(ty: PropertyType) -> DynamicStore {
    match ty {
        PropertyType::Array => DynamicStore::Array,
        _ => DynamicStore::String,
    }
}

impl PropertyRecordCheck {
    /// Creates the checker.
    pub fn new() -> Self {
        Self
    }

    fn check_block<'a, A: RecordAccess + ?Sized>(
        &self,
        block: &PropertyBlock,
        engine: &mut CheckerEngine<'a, PropertyViolation>,
        records: &'a A,
    ) {
        match block.key.get() {
            None => engine.report(PropertyViolation::InvalidPropertyKey(block.clone())),
            Some(key) => {
                let owned = block.clone();
                engine.comparative_check(records.property_key_token(key), move |key, engine| {
                    if !key.in_use {
                        engine.report(PropertyViolation::KeyNotInUse { block: owned, key });
                    }
                });
            }
        }

        let Some(ty) = block.kind() else {
            engine.report(PropertyViolation::InvalidPropertyType(block.clone()));
            return;
        };
        if !ty.is_dynamic() {
            if !ty.accepts_inline(block.value) {
                engine.report(PropertyViolation::InvalidPropertyValue(block.clone()));
            }
            return;
        }
        let owned = block.clone();
        let value = records.dynamic(value_store(ty), block.value);
        engine.comparative_check(value, move |value, engine| {
            let violation = match (ty, value.in_use) {
                (PropertyType::Array, false) => PropertyViolation::ArrayNotInUse {
                    block: owned,
                    value,
                },
                (_, false) => PropertyViolation::StringNotInUse {
                    block: owned,
                    value,
                },
                _ if value.length > 0 => return,
                (PropertyType::Array, true) => PropertyViolation::ArrayEmpty {
                    block: owned,
                    value,
                },
                (_, true) => PropertyViolation::StringEmpty {
                    block: owned,
                    value,
                },
            };
            engine.report(violation);
        });
    }

    fn check_link<'a, A: RecordAccess + ?Sized>(
        &self,
        link: Link,
        record: &PropertyRecord,
        engine: &mut CheckerEngine<'a, PropertyViolation>,
        records: &'a A,
    ) {
        let value = link.value(record);
        let neighbour = match value.resolve() {
            Ok(Some(neighbour)) => neighbour,
            Ok(None) => return,
            Err(_) => {
                engine.report(link.illegal(value));
                return;
            }
        };
        let id = record.id;
        engine.comparative_check(records.property(neighbour), move |neighbour, engine| {
            if !neighbour.in_use {
                engine.report(link.not_in_use(neighbour));
            } else if !link.back(&neighbour).points_to(id) {
                engine.report(link.does_not_reference_back(neighbour));
            }
        });
    }

    fn check_link_change<A: DiffRecordAccess + ?Sized>(
        &self,
        link: Link,
        old: &PropertyRecord,
        new: &PropertyRecord,
        engine: &mut CheckerEngine<'_, PropertyViolation>,
        records: &A,
    ) {
        if new.in_use && link.value(old) == link.value(new) {
            return;
        }
        if let Some(neighbour) = link.value(old).get() {
            if records.changed_property(neighbour).is_none() {
                engine.report(link.not_updated());
            }
        }
    }

    /// Dynamic values the new state no longer references must be deleted by
    /// the same change.
    fn check_removed_values<A: DiffRecordAccess + ?Sized>(
        &self,
        old: &PropertyRecord,
        new: &PropertyRecord,
        engine: &mut CheckerEngine<'_, PropertyViolation>,
        records: &A,
    ) {
        for block in &old.blocks {
            let Some(ty) = block.kind().filter(|ty| ty.is_dynamic()) else {
                continue;
            };
            let still_referenced = new.in_use
                && new.blocks.iter().any(|candidate| {
                    candidate.type_tag == block.type_tag && candidate.value == block.value
                });
            if still_referenced {
                continue;
            }
            let deleted = records
                .changed_dynamic(value_store(ty), block.value)
                .is_some_and(|change| !change.after.in_use);
            if deleted {
                continue;
            }
            let block = block.clone();
            engine.report(match ty {
                PropertyType::Array => PropertyViolation::ArrayUnreferencedButNotDeleted(block),
                _ => PropertyViolation::StringUnreferencedButNotDeleted(block),
            });
        }
    }

    fn check_owner<'a, A: DiffRecordAccess + ?Sized>(
        &self,
        old: &PropertyRecord,
        new: &PropertyRecord,
        engine: &mut CheckerEngine<'a, PropertyViolation>,
        records: &'a A,
    ) {
        let Some(owner) = new.owner else {
            return;
        };
        let id = new.id;
        let created = !old.in_use;
        engine.defer(move |engine| {
            if !created {
                let head = previous_head(owner, records);
                if !chain_contains(head, id, |next| records.previous_property(next)) {
                    engine.report(PropertyViolation::ChangedForWrongOwner);
                }
            }
            let head = current_head(owner, records);
            if !chain_contains(head, id, |next| records.property(next)) {
                engine.report(PropertyViolation::OwnerDoesNotReferenceBack);
            }
        });
    }
}

fn current_head<A: RecordAccess + ?Sized>(owner: PropertyOwner, records: &A) -> Ref {
    match owner {
        PropertyOwner::Node(id) => {
            let node = records.node(id);
            if node.in_use { node.next_prop } else { Ref::NONE }
        }
        PropertyOwner::Relationship(id) => {
            let relationship = records.relationship(id);
            if relationship.in_use {
                relationship.next_prop
            } else {
                Ref::NONE
            }
        }
        PropertyOwner::Graph => records.graph().next_prop,
    }
}

fn previous_head<A: DiffRecordAccess + ?Sized>(owner: PropertyOwner, records: &A) -> Ref {
    match owner {
        PropertyOwner::Node(id) => {
            let node = records.previous_node(id);
            if node.in_use { node.next_prop } else { Ref::NONE }
        }
        PropertyOwner::Relationship(id) => {
            let relationship = records.previous_relationship(id);
            if relationship.in_use {
                relationship.next_prop
            } else {
                Ref::NONE
            }
        }
        PropertyOwner::Graph => records.previous_graph().next_prop,
    }
}

/// Walks a property chain from `head` looking for `target`. Stops at the
/// first record that is not in use or was already visited.
fn chain_contains(head: Ref, target: u64, fetch: impl Fn(u64) -> PropertyRecord) -> bool {
    let mut visited = FxHashSet::default();
    let mut current = head;
    while let Some(id) = current.get() {
        if id == target {
            return true;
        }
        if !visited.insert(id) {
            return false;
        }
        let record = fetch(id);
        if !record.in_use {
            return false;
        }
        current = record.next_prop;
    }
    false
}

impl RecordCheck<PropertyRecord> for PropertyRecordCheck {
    type Violation = PropertyViolation;

    fn check<'a, A: RecordAccess + ?Sized>(
        &'a self,
        record: &PropertyRecord,
        engine: &mut CheckerEngine<'a, PropertyViolation>,
        records: &'a A,
    ) {
        if !record.in_use {
            return;
        }
        for block in &record.blocks {
            self.check_block(block, engine, records);
        }
        self.check_link(Link::Prev, record, engine, records);
        self.check_link(Link::Next, record, engine, records);
    }

    fn check_change<'a, A: DiffRecordAccess + ?Sized>(
        &'a self,
        old: &PropertyRecord,
        new: &PropertyRecord,
        engine: &mut CheckerEngine<'a, PropertyViolation>,
        records: &'a A,
    ) {
        self.check(new, engine, records);
        if old.in_use {
            self.check_link_change(Link::Prev, old, new, engine, records);
            self.check_link_change(Link::Next, old, new, engine, records);
            self.check_removed_values(old, new, engine, records);
        }
        if new.in_use {
            self.check_owner(old, new, engine, records);
        }
    }
}
