use crate::access::{DiffRecordAccess, RecordAccess};
use crate::record::{NeoStoreRecord, NodeRecord, PropertyOwner, Record, RelationshipRecord};
use crate::types::Ref;

use super::{CheckerEngine, PrimitiveViolation};

/// A record that heads a property chain.
pub trait PrimitiveRecord: Record {
    /// Head of the property chain.
    fn next_prop(&self) -> Ref;

    /// How property records name this record as their owner.
    fn property_owner(&self) -> PropertyOwner;
}

impl PrimitiveRecord for NodeRecord {
    fn next_prop(&self) -> Ref {
        self.next_prop
    }

    fn property_owner(&self) -> PropertyOwner {
        PropertyOwner::Node(self.id)
    }
}

impl PrimitiveRecord for RelationshipRecord {
    fn next_prop(&self) -> Ref {
        self.next_prop
    }

    fn property_owner(&self) -> PropertyOwner {
        PropertyOwner::Relationship(self.id)
    }
}

impl PrimitiveRecord for NeoStoreRecord {
    fn next_prop(&self) -> Ref {
        self.next_prop
    }

    fn property_owner(&self) -> PropertyOwner {
        PropertyOwner::Graph
    }
}

/// The property chain head must be in use and first in its chain.
pub(crate) fn check_property_head<'a, R, V, A>(
    record: &R,
    engine: &mut CheckerEngine<'a, V>,
    records: &'a A,
) where
    R: PrimitiveRecord,
    V: PrimitiveViolation,
    A: RecordAccess + ?Sized,
{
    let head = match record.next_prop().resolve() {
        Ok(Some(head)) => head,
        Ok(None) => return,
        Err(_) => {
            engine.report(V::illegal_property_reference(record.next_prop()));
            return;
        }
    };
    engine.comparative_check(records.property(head), |property, engine| {
        if !property.in_use {
            engine.report(V::property_not_in_use(property));
        } else if !property.prev_prop.is_none() {
            engine.report(V::property_not_first_in_chain(property));
        }
    });
}

/// A dropped or replaced property chain head must be part of the change.
pub(crate) fn check_property_head_change<R, V, A>(
    old: &R,
    new: &R,
    engine: &mut CheckerEngine<'_, V>,
    records: &A,
) where
    R: PrimitiveRecord,
    V: PrimitiveViolation,
    A: DiffRecordAccess + ?Sized,
{
    if new.in_use() && old.next_prop() == new.next_prop() {
        return;
    }
    if let Some(old_head) = old.next_prop().get() {
        if records.changed_property(old_head).is_none() {
            engine.report(V::property_not_updated());
        }
    }
}
