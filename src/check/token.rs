use std::marker::PhantomData;

use crate::access::{DiffRecordAccess, RecordAccess};
use crate::record::{Label, PropertyKey, RelationshipType, TokenKind, TokenRecord};

use super::{CheckerEngine, NameViolation, RecordCheck};

/// Validates token records of kind `K`: the name chain must be in use and
/// non-empty.
#[derive(Copy, Clone, Debug, Default)]
pub struct TokenRecordCheck<K: TokenKind> {
    kind: PhantomData<K>,
}

/// Checker for label tokens.
pub type LabelTokenCheck = TokenRecordCheck<Label>;
/// Checker for property key tokens.
pub type PropertyKeyTokenCheck = TokenRecordCheck<PropertyKey>;
/// Checker for relationship type tokens.
pub type RelationshipTypeTokenCheck = TokenRecordCheck<RelationshipType>;

impl<K: TokenKind> TokenRecordCheck<K> {
    /// Creates the checker.
    pub fn new() -> Self {
        Self { kind: PhantomData }
    }
}

impl<K: TokenKind> RecordCheck<TokenRecord<K>> for TokenRecordCheck<K> {
    type Violation = NameViolation;

    fn check<'a, A: RecordAccess + ?Sized>(
        &'a self,
        record: &TokenRecord<K>,
        engine: &mut CheckerEngine<'a, NameViolation>,
        records: &'a A,
    ) {
        if !record.in_use {
            return;
        }
        let name = match record.name_id.resolve() {
            Ok(Some(name)) => name,
            Ok(None) => return,
            Err(_) => {
                engine.report(NameViolation::IllegalNameReference(record.name_id));
                return;
            }
        };
        engine.comparative_check(records.dynamic(K::NAME_STORE, name), |block, engine| {
            if !block.in_use {
                engine.report(NameViolation::NameBlockNotInUse(block));
            } else if block.length <= 0 {
                engine.report(NameViolation::EmptyName(block));
            }
        });
    }

    fn check_change<'a, A: DiffRecordAccess + ?Sized>(
        &'a self,
        _old: &TokenRecord<K>,
        new: &TokenRecord<K>,
        engine: &mut CheckerEngine<'a, NameViolation>,
        records: &'a A,
    ) {
        self.check(new, engine, records);
    }
}
