use std::collections::hash_map::Entry;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::access::{DiffRecordAccess, RecordAccess};
use crate::record::{
    DynamicRecord, DynamicStore, RuleKind, SchemaRule, SchemaRuleAccess, SchemaRuleError,
    SchemaRuleKind,
};

use super::{CheckerEngine, RecordCheck, SchemaViolation};

/// Which of the two schema passes a checker runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Validate each rule and register the counterparts it expects.
    CheckRules,
    /// Confirm that every registered expectation was met.
    CheckObligations,
}

/// Identity of a rule's schema content. Both index kinds share one family.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct ContentKey {
    index: bool,
    label: u32,
    property_key: u32,
}

impl From<&SchemaRule> for ContentKey {
    fn from(rule: &SchemaRule) -> Self {
        Self {
            index: rule.kind.is_index(),
            label: rule.label,
            property_key: rule.property_key,
        }
    }
}

#[derive(Debug, Default)]
struct ObligationMaps {
    /// Owned index id -> the uniqueness constraint that claims it.
    index: FxHashMap<u64, DynamicRecord>,
    /// Constraint id -> the constraint index that names it as owner.
    constraint: FxHashMap<u64, DynamicRecord>,
    content: FxHashMap<ContentKey, DynamicRecord>,
}

/// Expectations registered by the first schema pass and resolved by the
/// second. Shared by both passes of one scan.
#[derive(Debug, Default)]
pub struct SchemaObligations {
    maps: Mutex<ObligationMaps>,
}

impl SchemaObligations {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered index and constraint obligations.
    pub fn len(&self) -> usize {
        let maps = self.maps.lock();
        maps.index.len() + maps.constraint.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registers `record` under `key` unless a different record holds it, in
/// which case that record is returned. Repeat registrations are no-ops.
fn register<K: std::hash::Hash + Eq>(
    map: &mut FxHashMap<K, DynamicRecord>,
    key: K,
    record: &DynamicRecord,
) -> Option<DynamicRecord> {
    match map.entry(key) {
        Entry::Occupied(existing) if existing.get().id != record.id => Some(existing.get().clone()),
        Entry::Occupied(_) => None,
        Entry::Vacant(slot) => {
            slot.insert(record.clone());
            None
        }
    }
}

/// Decodes schema rules from the schema store of a [`RecordAccess`].
pub struct StoreSchemaRules<'a, A: ?Sized> {
    records: &'a A,
}

impl<'a, A: ?Sized> StoreSchemaRules<'a, A> {
    /// Decoder reading through `records`.
    pub fn new(records: &'a A) -> Self {
        Self { records }
    }
}

impl<A: ?Sized> Clone for StoreSchemaRules<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A: ?Sized> Copy for StoreSchemaRules<'_, A> {}

impl<A: RecordAccess + ?Sized> SchemaRuleAccess for StoreSchemaRules<'_, A> {
    fn load_rule(&self, id: u64) -> Result<SchemaRule, SchemaRuleError> {
        let mut visited = FxHashSet::default();
        let mut bytes = Vec::new();
        let mut next = Some(id);
        while let Some(block_id) = next {
            if !visited.insert(block_id) {
                return Err(SchemaRuleError::ChainCycle(block_id));
            }
            let block = self.records.dynamic(DynamicStore::Schema, block_id);
            if !block.in_use {
                return Err(SchemaRuleError::Malformed("schema chain block not in use"));
            }
            bytes.extend_from_slice(block.payload());
            next = block
                .next_block
                .resolve()
                .map_err(|_| SchemaRuleError::Malformed("corrupt schema chain pointer"))?;
        }
        SchemaRule::decode(id, &bytes)
    }
}

/// Validates schema rules, stored as chains in the schema store and checked
/// through their first block.
///
/// A checker built with [`SchemaRecordCheck::new`] runs [`Phase::CheckRules`].
/// After that pass has seen every rule, [`for_obligation_checking`] yields the
/// checker for [`Phase::CheckObligations`], sharing the same obligations.
///
/// [`for_obligation_checking`]: SchemaRecordCheck::for_obligation_checking
#[derive(Clone, Debug)]
pub struct SchemaRecordCheck<D> {
    rules: D,
    obligations: Arc<SchemaObligations>,
    phase: Phase,
}

impl<D: SchemaRuleAccess> SchemaRecordCheck<D> {
    /// First-pass checker decoding rules through `rules`.
    pub fn new(rules: D) -> Self {
        Self {
            rules,
            obligations: Arc::new(SchemaObligations::new()),
            phase: Phase::CheckRules,
        }
    }

    /// The pass this checker runs.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Obligations registered so far.
    pub fn obligations(&self) -> &SchemaObligations {
        &self.obligations
    }

    /// Second-pass checker over the obligations registered by this one.
    pub fn for_obligation_checking(&self) -> Self
    where
        D: Clone,
    {
        Self {
            rules: self.rules.clone(),
            obligations: Arc::clone(&self.obligations),
            phase: Phase::CheckObligations,
        }
    }

    fn check_rule<'a, A: RecordAccess + ?Sized>(
        &self,
        rule: SchemaRule,
        record: &DynamicRecord,
        engine: &mut CheckerEngine<'a, SchemaViolation>,
        records: &'a A,
    ) {
        engine.comparative_check(
            records.label_token(u64::from(rule.label)),
            |label, engine| {
                if !label.in_use {
                    engine.report(SchemaViolation::LabelNotInUse(label));
                }
            },
        );
        engine.comparative_check(
            records.property_key_token(u64::from(rule.property_key)),
            |key, engine| {
                if !key.in_use {
                    engine.report(SchemaViolation::PropertyKeyNotInUse(key));
                }
            },
        );

        let mut maps = self.obligations.maps.lock();
        if let Some(previous) = register(&mut maps.content, ContentKey::from(&rule), record) {
            engine.report(SchemaViolation::DuplicateRuleContent(previous));
        }
        let duplicate = match rule.kind {
            SchemaRuleKind::ConstraintIndex {
                owning_constraint: Some(owner),
            } => register(&mut maps.constraint, owner, record),
            SchemaRuleKind::UniquenessConstraint { owned_index } => {
                register(&mut maps.index, owned_index, record)
            }
            SchemaRuleKind::Index | SchemaRuleKind::ConstraintIndex { .. } => None,
        };
        if let Some(previous) = duplicate {
            engine.report(SchemaViolation::DuplicateObligation(previous));
        }
    }

    fn check_obligations(&self, rule: SchemaRule, engine: &mut CheckerEngine<'_, SchemaViolation>) {
        let maps = self.obligations.maps.lock();
        match rule.kind {
            SchemaRuleKind::Index => {}
            SchemaRuleKind::ConstraintIndex { owning_constraint } => {
                match (maps.index.get(&rule.id), owning_constraint) {
                    (None, Some(_)) => engine.report(SchemaViolation::MissingObligation(
                        RuleKind::UniquenessConstraint,
                    )),
                    (None, None) => {}
                    (Some(obligation), owner) if owner != Some(obligation.id) => engine.report(
                        SchemaViolation::ConstraintIndexRuleNotReferencingBack(obligation.clone()),
                    ),
                    (Some(_), _) => {}
                }
            }
            SchemaRuleKind::UniquenessConstraint { owned_index } => {
                match maps.constraint.get(&rule.id) {
                    None => engine.report(SchemaViolation::MissingObligation(
                        RuleKind::ConstraintIndexRule,
                    )),
                    Some(obligation) if obligation.id != owned_index => engine.report(
                        SchemaViolation::UniquenessConstraintNotReferencingBack(obligation.clone()),
                    ),
                    Some(_) => {}
                }
            }
        }
    }
}

impl<D: SchemaRuleAccess> RecordCheck<DynamicRecord> for SchemaRecordCheck<D> {
    type Violation = SchemaViolation;

    fn check<'a, A: RecordAccess + ?Sized>(
        &'a self,
        record: &DynamicRecord,
        engine: &mut CheckerEngine<'a, SchemaViolation>,
        records: &'a A,
    ) {
        if !record.in_use || !record.start_record {
            return;
        }
        let rule = match self.rules.load_rule(record.id) {
            Ok(rule) => rule,
            Err(err) => {
                if self.phase == Phase::CheckRules {
                    debug!(id = record.id, error = %err, "consistency.schema.malformed");
                    engine.report(match err {
                        SchemaRuleError::UnsupportedKind(kind) => {
                            SchemaViolation::UnsupportedSchemaRuleKind(kind)
                        }
                        _ => SchemaViolation::MalformedSchemaRule,
                    });
                }
                return;
            }
        };
        match self.phase {
            Phase::CheckRules => self.check_rule(rule, record, engine, records),
            Phase::CheckObligations => self.check_obligations(rule, engine),
        }
    }

    fn check_change<'a, A: DiffRecordAccess + ?Sized>(
        &'a self,
        _old: &DynamicRecord,
        new: &DynamicRecord,
        engine: &mut CheckerEngine<'a, SchemaViolation>,
        records: &'a A,
    ) {
        self.check(new, engine, records);
    }
}
