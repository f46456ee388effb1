use crate::access::{DiffRecordAccess, RecordAccess};
use crate::record::{DynamicRecord, DynamicStore};

use super::{CheckerEngine, DynamicViolation, RecordCheck};

/// Validates the blocks of one dynamic store.
///
/// Block capacity comes from the store layout, so the same checker serves
/// every dynamic store.
#[derive(Copy, Clone, Debug)]
pub struct DynamicRecordCheck {
    store: DynamicStore,
}

impl DynamicRecordCheck {
    /// Checker for blocks of `store`.
    pub fn new(store: DynamicStore) -> Self {
        Self { store }
    }

    /// The store this checker resolves next blocks in.
    pub fn store(&self) -> DynamicStore {
        self.store
    }
}

impl RecordCheck<DynamicRecord> for DynamicRecordCheck {
    type Violation = DynamicViolation;

    fn check<'a, A: RecordAccess + ?Sized>(
        &'a self,
        record: &DynamicRecord,
        engine: &mut CheckerEngine<'a, DynamicViolation>,
        records: &'a A,
    ) {
        if !record.in_use {
            return;
        }
        if record.length < 0 {
            engine.report(DynamicViolation::InvalidLength);
        }
        let next = match record.next_block.resolve() {
            Ok(Some(next)) => next,
            Ok(None) => {
                if record.length == 0 {
                    engine.report(DynamicViolation::EmptyBlock);
                }
                return;
            }
            Err(_) => {
                engine.report(DynamicViolation::IllegalNextReference(record.next_block));
                return;
            }
        };
        if next == record.id {
            engine.report(DynamicViolation::SelfReferentialNext);
        } else {
            engine.comparative_check(records.dynamic(self.store, next), |next, engine| {
                if !next.in_use {
                    engine.report(DynamicViolation::NextNotInUse(next));
                } else if next.length <= 0 {
                    engine.report(DynamicViolation::EmptyNextBlock(next));
                }
            });
        }
        let capacity = records.layout(self.store).data_size();
        let full = usize::try_from(record.length).is_ok_and(|length| length >= capacity);
        if !full {
            engine.report(DynamicViolation::RecordNotFullReferencesNext);
        }
    }

    fn check_change<'a, A: DiffRecordAccess + ?Sized>(
        &'a self,
        old: &DynamicRecord,
        new: &DynamicRecord,
        engine: &mut CheckerEngine<'a, DynamicViolation>,
        records: &'a A,
    ) {
        self.check(new, engine, records);
        if !old.in_use {
            return;
        }
        if new.in_use && old.next_block == new.next_block {
            return;
        }
        if let Some(next) = old.next_block.get() {
            if records.changed_dynamic(self.store, next).is_none() {
                engine.report(DynamicViolation::NextNotUpdated);
            }
        }
    }
}
