#![forbid(unsafe_code)]

//! Per-record consistency checkers.
//!
//! Every checker implements [`RecordCheck`] for one record kind and exposes
//! two entry points: `check` validates a snapshot in isolation and
//! `check_change` validates a transition between two snapshots of the same
//! record. Both report into a [`CheckerEngine`] and never fail; an empty
//! result means the record is consistent.

mod dynamic;
mod engine;
mod neostore;
mod node;
mod owner;
mod primitive;
mod property;
mod relationship;
mod report;
mod schema;
mod token;

#[cfg(test)]
pub(crate) mod testing;

pub use dynamic::DynamicRecordCheck;
pub use engine::CheckerEngine;
pub use neostore::NeoStoreCheck;
pub use node::NodeRecordCheck;
pub use owner::{OrphanTracking, OwnerCheck, OwnerRegistering};
pub use primitive::PrimitiveRecord;
pub use property::PropertyRecordCheck;
pub use relationship::{NodeSide, RelationshipRecordCheck};
pub use report::{
    ConsistencyReport, DynamicViolation, NameViolation, NeoStoreViolation, NodeViolation,
    PrimitiveViolation, PropertyViolation, RelationshipViolation, SchemaViolation, Severity,
    Violation,
};
pub use schema::{Phase, SchemaObligations, SchemaRecordCheck, StoreSchemaRules};
pub use token::{
    LabelTokenCheck, PropertyKeyTokenCheck, RelationshipTypeTokenCheck, TokenRecordCheck,
};

use crate::access::{DiffRecordAccess, RecordAccess};

/// A validator for one record kind.
pub trait RecordCheck<R> {
    /// Violation type this checker reports.
    type Violation;

    /// Validates `record` on its own.
    fn check<'a, A: RecordAccess + ?Sized>(
        &'a self,
        record: &R,
        engine: &mut CheckerEngine<'a, Self::Violation>,
        records: &'a A,
    );

    /// Validates the change from `old` to `new`. Reports everything `check`
    /// reports for `new` plus the transition-specific findings.
    fn check_change<'a, A: DiffRecordAccess + ?Sized>(
        &'a self,
        old: &R,
        new: &R,
        engine: &mut CheckerEngine<'a, Self::Violation>,
        records: &'a A,
    );
}

/// Runs `checker` over `record` and returns its violations in report order.
pub fn run_check<R, C, A>(checker: &C, record: &R, records: &A) -> Vec<C::Violation>
where
    C: RecordCheck<R>,
    A: RecordAccess + ?Sized,
{
    let mut engine = CheckerEngine::new();
    checker.check(record, &mut engine, records);
    engine.finish()
}

/// Runs `checker` over the change `old -> new` and returns its violations.
pub fn run_check_change<R, C, A>(checker: &C, old: &R, new: &R, records: &A) -> Vec<C::Violation>
where
    C: RecordCheck<R>,
    A: DiffRecordAccess + ?Sized,
{
    let mut engine = CheckerEngine::new();
    checker.check_change(old, new, &mut engine, records);
    engine.finish()
}

/// Forwards `violations` to `sink`, returning how many there were.
pub fn deliver<V, S>(violations: Vec<V>, sink: &mut S) -> usize
where
    S: ConsistencyReport<V> + ?Sized,
{
    let count = violations.len();
    for violation in violations {
        sink.report(violation);
    }
    count
}
