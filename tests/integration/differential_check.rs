#![allow(missing_docs)]

use std::sync::Once;

use sombra_consistency::{
    check::{run_check_change, PropertyRecordCheck, PropertyViolation},
    record::{
        allocate_chain, DynamicRecord, DynamicStore, LabelTokenRecord, NodeRecord,
        PropertyBlock, PropertyKeyTokenRecord, PropertyOwner, PropertyRecord, Record,
        RelationshipRecord, RelationshipTypeTokenRecord, SchemaRule,
    },
    DiffStore, FullCheck, RecordAccess, RecordType, Ref, StoreAccess,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("sombra_consistency=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init();
    });
}

fn base() -> StoreAccess {
    let mut store = StoreAccess::default();
    store.label_tokens.insert(LabelTokenRecord::new(1));
    store.property_key_tokens.insert(PropertyKeyTokenRecord::new(1));
    store
        .relationship_type_tokens
        .insert(RelationshipTypeTokenRecord::new(3));
    store.put_chain(DynamicStore::String, 40, b"Alice");
    store.properties.insert(
        PropertyRecord::new(20)
            .with_block(PropertyBlock::string(1, 40))
            .owned_by(PropertyOwner::Node(1)),
    );
    store.nodes.insert(NodeRecord::new(1, Ref::to(10), Ref::to(20)));
    store.nodes.insert(NodeRecord::new(2, Ref::to(10), Ref::NONE));
    store
        .relationships
        .insert(RelationshipRecord::new(10, 1, 2, 3));
    store
}

#[test]
fn untouched_store_has_nothing_to_check() {
    init_tracing();
    let summary = FullCheck::default().run_change(&DiffStore::new(base()));

    assert!(summary.consistent);
    assert_eq!(summary.records_checked, 0);
}

#[test]
fn deleting_a_relationship_with_its_endpoints() {
    init_tracing();
    let mut diff = DiffStore::new(base());
    diff.change_relationship(RelationshipRecord::absent(10))
        .change_node(NodeRecord::new(1, Ref::NONE, Ref::to(20)))
        .change_node(NodeRecord::new(2, Ref::NONE, Ref::NONE));

    let summary = FullCheck::default().run_change(&diff);
    assert!(summary.consistent, "{:?}", summary.findings);
    assert_eq!(summary.records_checked, 3);
}

#[test]
fn deleting_a_relationship_alone_strands_its_nodes() {
    init_tracing();
    let mut diff = DiffStore::new(base());
    diff.change_relationship(RelationshipRecord::absent(10));

    let summary = FullCheck::default().run_change(&diff);
    assert_eq!(summary.count(RecordType::Relationship), 2);
    let violations: Vec<&str> = summary
        .findings
        .iter()
        .map(|finding| finding.violation.as_str())
        .collect();
    assert_eq!(violations, ["SourceNodeNotUpdated", "TargetNodeNotUpdated"]);
}

#[test]
fn replaced_string_value_must_be_freed() {
    init_tracing();
    let mut diff = DiffStore::new(base());
    let old = diff.property(20);
    let new = PropertyRecord::new(20)
        .with_block(PropertyBlock::string(1, 41))
        .owned_by(PropertyOwner::Node(1));
    diff.change_property(new.clone())
        .change_dynamic(DynamicStore::String, DynamicRecord::with_data(41, b"Bob".to_vec()));

    assert_eq!(
        run_check_change(&PropertyRecordCheck::new(), &old, &new, &diff),
        vec![PropertyViolation::StringUnreferencedButNotDeleted(
            PropertyBlock::string(1, 40)
        )]
    );
    assert_eq!(FullCheck::default().run_change(&diff).count(RecordType::Property), 1);

    let mut freed = diff.dynamic(DynamicStore::String, 40);
    freed.in_use = false;
    diff.change_dynamic(DynamicStore::String, freed);
    let summary = FullCheck::default().run_change(&diff);
    assert!(summary.consistent, "{:?}", summary.findings);
}

#[test]
fn created_property_must_hang_off_its_owner() {
    init_tracing();
    let mut diff = DiffStore::new(base());
    let stray = PropertyRecord::new(21).owned_by(PropertyOwner::Node(2));
    diff.change_property(stray);

    let summary = FullCheck::default().run_change(&diff);
    assert_eq!(summary.findings.len(), 1);
    assert_eq!(summary.findings[0].violation, "OwnerDoesNotReferenceBack");

    diff.change_node(NodeRecord::new(2, Ref::to(10), Ref::to(21)));
    assert!(FullCheck::default().run_change(&diff).consistent);
}

#[test]
fn new_constraint_without_index_breaks_the_schema() {
    init_tracing();
    let mut diff = DiffStore::new(base());
    let capacity = diff.layout(DynamicStore::Schema).data_size();
    let rule = SchemaRule::uniqueness_constraint(60, 1, 1, 61);
    for block in allocate_chain(rule.id, &rule.encode(), capacity) {
        diff.change_dynamic(DynamicStore::Schema, block);
    }

    let summary = FullCheck::default().run_change(&diff);
    assert_eq!(summary.count(RecordType::Schema), 1);
    assert!(summary.findings[0].violation.starts_with("MissingObligation"));

    let index = SchemaRule::constraint_index(61, 1, 1, Some(60));
    for block in allocate_chain(index.id, &index.encode(), capacity) {
        diff.change_dynamic(DynamicStore::Schema, block);
    }
    let summary = FullCheck::default().run_change(&diff);
    assert!(summary.consistent, "{:?}", summary.findings);
}
