#![forbid(unsafe_code)]

//! Whole-store and change-set scans built from the per-record checkers.

mod summary;

pub use summary::{ConsistencySummary, Finding};

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::access::{DiffStore, RecordAccess, RecordChange, StoreAccess};
use crate::check::{
    deliver, run_check, run_check_change, ConsistencyReport, DynamicRecordCheck, LabelTokenCheck,
    NeoStoreCheck, NodeRecordCheck, OwnerCheck, PropertyKeyTokenCheck, PropertyRecordCheck,
    RecordCheck, RelationshipRecordCheck, RelationshipTypeTokenCheck, SchemaRecordCheck,
    StoreSchemaRules, Violation,
};
use crate::options::CheckOptions;
use crate::record::{DynamicRecord, DynamicStore, Record};
use crate::types::RecordType;

use summary::SummaryBuilder;

/// Drives every checker over a store or a change set.
#[derive(Clone, Debug, Default)]
pub struct FullCheck {
    options: CheckOptions,
}

impl FullCheck {
    /// A scan configured by `options`.
    pub fn new(options: CheckOptions) -> Self {
        Self { options }
    }

    /// Options this scan runs with.
    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    /// Dynamic stores whose layout in `records` differs from the configured
    /// one.
    ///
    /// Block capacity is always taken from `records`. The configured layouts
    /// only shape stores built with [`StoreAccess::new`], so a mismatch means
    /// the store was built from other options.
    pub fn layout_mismatches<A: RecordAccess + ?Sized>(&self, records: &A) -> Vec<DynamicStore> {
        DynamicStore::ALL
            .into_iter()
            .filter(|store| records.layout(*store) != self.options.layouts.get(*store))
            .collect()
    }

    fn warn_layout_mismatches<A: RecordAccess + ?Sized>(&self, records: &A) {
        for store in self.layout_mismatches(records) {
            warn!(
                store = %store.record_type(),
                configured = ?self.options.layouts.get(store),
                actual = ?records.layout(store),
                "consistency.layout_mismatch"
            );
        }
    }

    /// Checks every record of `store`.
    ///
    /// Schema rules are checked twice: once to validate each rule and
    /// register what it expects from its counterpart, and once more after
    /// every rule was seen to resolve those expectations. Property chains no
    /// primitive claimed are reported last.
    pub fn run(&self, store: &StoreAccess) -> ConsistencySummary {
        self.warn_layout_mismatches(store);
        let mut summary = SummaryBuilder::new(self.options.max_findings);
        let owners = if self.options.owner_check {
            OwnerCheck::new()
        } else {
            OwnerCheck::disabled()
        };
        let schema_blocks = store.dynamic_store(DynamicStore::Schema);

        let schema = SchemaRecordCheck::new(StoreSchemaRules::new(store));
        scan(&schema, RecordType::Schema, schema_blocks.iter(), store, &mut summary);
        scan(
            &LabelTokenCheck::new(),
            RecordType::LabelToken,
            store.label_tokens.iter(),
            store,
            &mut summary,
        );
        scan(
            &PropertyKeyTokenCheck::new(),
            RecordType::PropertyKeyToken,
            store.property_key_tokens.iter(),
            store,
            &mut summary,
        );
        scan(
            &RelationshipTypeTokenCheck::new(),
            RecordType::RelationshipTypeToken,
            store.relationship_type_tokens.iter(),
            store,
            &mut summary,
        );
        scan(
            &owners.primitive(NodeRecordCheck::new()),
            RecordType::Node,
            store.nodes.iter(),
            store,
            &mut summary,
        );
        scan(
            &owners.primitive(RelationshipRecordCheck::new()),
            RecordType::Relationship,
            store.relationships.iter(),
            store,
            &mut summary,
        );
        scan(
            &owners.property(PropertyRecordCheck::new()),
            RecordType::Property,
            store.properties.iter(),
            store,
            &mut summary,
        );
        scan(
            &owners.primitive(NeoStoreCheck::new()),
            RecordType::NeoStore,
            std::iter::once(&store.graph),
            store,
            &mut summary,
        );
        for dynamic in DynamicStore::ALL {
            scan(
                &DynamicRecordCheck::new(dynamic),
                dynamic.record_type(),
                store.dynamic_store(dynamic).iter(),
                store,
                &mut summary,
            );
        }

        let obligations = schema.for_obligation_checking();
        for block in schema_blocks.iter() {
            let violations = run_check(&obligations, block, store);
            deliver(violations, &mut summary.late(RecordType::Schema, block.id));
        }

        for (id, violation) in owners.orphan_chains() {
            summary.late(RecordType::Property, id).report(violation);
        }
        summary.finish()
    }

    /// Checks only the records `diff` changes, each as a transition from its
    /// before image to its after image.
    ///
    /// When any schema block changed, every schema rule of the after state
    /// is checked again since obligations span rules.
    pub fn run_change(&self, diff: &DiffStore) -> ConsistencySummary {
        self.warn_layout_mismatches(diff);
        let mut summary = SummaryBuilder::new(self.options.max_findings);

        scan_changes(
            &LabelTokenCheck::new(),
            RecordType::LabelToken,
            diff.label_token_changes(),
            diff,
            &mut summary,
        );
        scan_changes(
            &PropertyKeyTokenCheck::new(),
            RecordType::PropertyKeyToken,
            diff.property_key_token_changes(),
            diff,
            &mut summary,
        );
        scan_changes(
            &RelationshipTypeTokenCheck::new(),
            RecordType::RelationshipTypeToken,
            diff.relationship_type_token_changes(),
            diff,
            &mut summary,
        );
        scan_changes(
            &NodeRecordCheck::new(),
            RecordType::Node,
            diff.node_changes(),
            diff,
            &mut summary,
        );
        scan_changes(
            &RelationshipRecordCheck::new(),
            RecordType::Relationship,
            diff.relationship_changes(),
            diff,
            &mut summary,
        );
        scan_changes(
            &PropertyRecordCheck::new(),
            RecordType::Property,
            diff.property_changes(),
            diff,
            &mut summary,
        );
        scan_changes(
            &NeoStoreCheck::new(),
            RecordType::NeoStore,
            diff.graph_change().into_iter().collect(),
            diff,
            &mut summary,
        );
        for dynamic in DynamicStore::ALL {
            scan_changes(
                &DynamicRecordCheck::new(dynamic),
                dynamic.record_type(),
                diff.dynamic_changes(dynamic),
                diff,
                &mut summary,
            );
        }

        let schema_changes = diff.dynamic_changes(DynamicStore::Schema);
        if !schema_changes.is_empty() {
            let mut ids: BTreeSet<u64> = diff
                .base()
                .dynamic_store(DynamicStore::Schema)
                .iter()
                .map(|block| block.id)
                .collect();
            ids.extend(schema_changes.iter().map(|change| change.after.id));
            let blocks: Vec<DynamicRecord> = ids
                .into_iter()
                .map(|id| diff.dynamic(DynamicStore::Schema, id))
                .collect();
            debug!(rules = blocks.len(), "consistency.schema.recheck");

            let schema = SchemaRecordCheck::new(StoreSchemaRules::new(diff));
            scan(&schema, RecordType::Schema, blocks.iter(), diff, &mut summary);
            let obligations = schema.for_obligation_checking();
            for block in &blocks {
                let violations = run_check(&obligations, block, diff);
                deliver(violations, &mut summary.late(RecordType::Schema, block.id));
            }
        }
        summary.finish()
    }
}

fn scan<'r, R, C, A>(
    checker: &C,
    record_type: RecordType,
    records: impl IntoIterator<Item = &'r R>,
    access: &A,
    summary: &mut SummaryBuilder,
) where
    R: Record + 'r,
    C: RecordCheck<R>,
    C::Violation: Violation,
    A: RecordAccess + ?Sized,
{
    debug!(store = %record_type, "consistency.store.begin");
    let mut found = 0;
    for record in records {
        let violations = run_check(checker, record, access);
        found += deliver(violations, &mut summary.scope(record_type, record.id()));
    }
    debug!(store = %record_type, violations = found, "consistency.store.end");
}

fn scan_changes<R, C>(
    checker: &C,
    record_type: RecordType,
    changes: Vec<&RecordChange<R>>,
    diff: &DiffStore,
    summary: &mut SummaryBuilder,
) where
    R: Record,
    C: RecordCheck<R>,
    C::Violation: Violation,
{
    if changes.is_empty() {
        return;
    }
    debug!(store = %record_type, changes = changes.len(), "consistency.store.begin");
    for change in changes {
        let violations = run_check_change(checker, &change.before, &change.after, diff);
        deliver(violations, &mut summary.scope(record_type, change.after.id()));
    }
}
