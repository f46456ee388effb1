use crate::access::{DiffRecordAccess, RecordAccess};
use crate::record::NeoStoreRecord;

use super::primitive::{check_property_head, check_property_head_change};
use super::{CheckerEngine, NeoStoreViolation, RecordCheck};

/// Validates the graph-global record's property chain head.
#[derive(Copy, Clone, Debug, Default)]
pub struct NeoStoreCheck;

impl NeoStoreCheck {
    /// Creates the checker.
    pub fn new() -> Self {
        Self
    }
}

impl RecordCheck<NeoStoreRecord> for NeoStoreCheck {
    type Violation = NeoStoreViolation;

    fn check<'a, A: RecordAccess + ?Sized>(
        &'a self,
        record: &NeoStoreRecord,
        engine: &mut CheckerEngine<'a, NeoStoreViolation>,
        records: &'a A,
    ) {
        check_property_head(record, engine, records);
    }

    fn check_change<'a, A: DiffRecordAccess + ?Sized>(
        &'a self,
        old: &NeoStoreRecord,
        new: &NeoStoreRecord,
        engine: &mut CheckerEngine<'a, NeoStoreViolation>,
        records: &'a A,
    ) {
        self.check(new, engine, records);
        check_property_head_change(old, new, engine, records);
    }
}
