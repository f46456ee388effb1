use std::collections::hash_map::Entry;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::access::{DiffRecordAccess, RecordAccess};
use crate::record::{PropertyOwner, PropertyRecord};

use super::{CheckerEngine, PrimitiveRecord, PrimitiveViolation, PropertyViolation, RecordCheck};

/// Tracks which primitive claims each property chain during a full scan.
///
/// Wrap the primitive checkers with [`OwnerCheck::primitive`] and the
/// property checker with [`OwnerCheck::property`]; once every record has
/// been visited, [`OwnerCheck::orphan_chains`] lists the chains nobody
/// claimed.
#[derive(Debug)]
pub struct OwnerCheck {
    enabled: bool,
    owners: Mutex<FxHashMap<u64, PropertyOwner>>,
    heads: Mutex<FxHashSet<u64>>,
}

impl Default for OwnerCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl OwnerCheck {
    /// An empty ownership table.
    pub fn new() -> Self {
        Self {
            enabled: true,
            owners: Mutex::new(FxHashMap::default()),
            heads: Mutex::new(FxHashSet::default()),
        }
    }

    /// A table that records nothing, so decorated checkers behave exactly
    /// like the checkers they wrap.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    /// Whether ownership is being tracked.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Decorates a node, relationship or graph checker so that it registers
    /// the chain head it claims.
    pub fn primitive<C>(&self, inner: C) -> OwnerRegistering<'_, C> {
        OwnerRegistering {
            owners: self,
            inner,
        }
    }

    /// Decorates the property checker so that it records chain heads.
    pub fn property<C>(&self, inner: C) -> OrphanTracking<'_, C> {
        OrphanTracking {
            owners: self,
            inner,
        }
    }

    /// Chain heads seen by the property checker that no primitive claimed,
    /// in id order.
    pub fn orphan_chains(&self) -> Vec<(u64, PropertyViolation)> {
        let owners = self.owners.lock();
        let heads = self.heads.lock();
        let mut orphans: Vec<u64> = heads
            .iter()
            .copied()
            .filter(|head| !owners.contains_key(head))
            .collect();
        orphans.sort_unstable();
        orphans
            .into_iter()
            .map(|id| (id, PropertyViolation::OrphanPropertyChain))
            .collect()
    }

    /// Claims `head` for `owner`, returning the earlier owner on conflict.
    fn claim(&self, head: u64, owner: PropertyOwner) -> Option<PropertyOwner> {
        if !self.enabled {
            return None;
        }
        match self.owners.lock().entry(head) {
            Entry::Occupied(existing) if *existing.get() != owner => Some(*existing.get()),
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(owner);
                None
            }
        }
    }
}

/// A primitive checker that also registers property chain ownership.
#[derive(Debug)]
pub struct OwnerRegistering<'o, C> {
    owners: &'o OwnerCheck,
    inner: C,
}

impl<R, C> RecordCheck<R> for OwnerRegistering<'_, C>
where
    R: PrimitiveRecord,
    C: RecordCheck<R>,
    C::Violation: PrimitiveViolation,
{
    type Violation = C::Violation;

    fn check<'a, A: RecordAccess + ?Sized>(
        &'a self,
        record: &R,
        engine: &mut CheckerEngine<'a, C::Violation>,
        records: &'a A,
    ) {
        self.inner.check(record, engine, records);
        if !record.in_use() {
            return;
        }
        if let Some(head) = record.next_prop().get() {
            if let Some(previous) = self.owners.claim(head, record.property_owner()) {
                engine.report(<C::Violation as PrimitiveViolation>::multiple_owners(previous));
            }
        }
    }

    fn check_change<'a, A: DiffRecordAccess + ?Sized>(
        &'a self,
        old: &R,
        new: &R,
        engine: &mut CheckerEngine<'a, C::Violation>,
        records: &'a A,
    ) {
        self.inner.check_change(old, new, engine, records);
    }
}

/// A property checker that also records which properties head a chain.
#[derive(Debug)]
pub struct OrphanTracking<'o, C> {
    owners: &'o OwnerCheck,
    inner: C,
}

impl<C> RecordCheck<PropertyRecord> for OrphanTracking<'_, C>
where
    C: RecordCheck<PropertyRecord>,
{
    type Violation = C::Violation;

    fn check<'a, A: RecordAccess + ?Sized>(
        &'a self,
        record: &PropertyRecord,
        engine: &mut CheckerEngine<'a, C::Violation>,
        records: &'a A,
    ) {
        self.inner.check(record, engine, records);
        if self.owners.enabled && record.in_use && record.prev_prop.is_none() {
            self.owners.heads.lock().insert(record.id);
        }
    }

    fn check_change<'a, A: DiffRecordAccess + ?Sized>(
        &'a self,
        old: &PropertyRecord,
        new: &PropertyRecord,
        engine: &mut CheckerEngine<'a, C::Violation>,
        records: &'a A,
    ) {
        self.inner.check_change(old, new, engine, records);
    }
}
