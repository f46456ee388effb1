#![allow(missing_docs)]

use std::sync::Once;

use sombra_consistency::{
    record::{
        DynamicStore, LabelTokenRecord, NodeRecord, PropertyBlock, PropertyKeyTokenRecord,
        PropertyOwner, PropertyRecord, RelationshipRecord, RelationshipTypeTokenRecord,
        SchemaRule,
    },
    CheckOptions, FullCheck, RecordType, Ref, StoreAccess,
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

/// Two labelled people joined by one relationship; the first carries a
/// string property.
fn social_graph() -> StoreAccess {
    let mut store = StoreAccess::default();
    store.put_chain(DynamicStore::LabelName, 1, b"Person");
    store.put_chain(DynamicStore::PropertyKeyName, 1, b"name");
    store.put_chain(DynamicStore::RelationshipTypeName, 1, b"KNOWS");
    store.label_tokens.insert(LabelTokenRecord::new(1).named(1));
    store
        .property_key_tokens
        .insert(PropertyKeyTokenRecord::new(1).named(1));
    store
        .relationship_type_tokens
        .insert(RelationshipTypeTokenRecord::new(3).named(1));

    store.put_chain(DynamicStore::String, 40, b"Alice");
    store.properties.insert(
        PropertyRecord::new(20)
            .with_block(PropertyBlock::string(1, 40))
            .owned_by(PropertyOwner::Node(1)),
    );
    store
        .nodes
        .insert(NodeRecord::new(1, Ref::to(10), Ref::to(20)).with_inline_labels(&[1]));
    store
        .nodes
        .insert(NodeRecord::new(2, Ref::to(10), Ref::NONE).with_inline_labels(&[1]));
    store
        .relationships
        .insert(RelationshipRecord::new(10, 1, 2, 3));
    store
}

#[test]
fn consistent_graph_reports_nothing() {
    init_tracing();
    let summary = FullCheck::default().run(&social_graph());

    assert!(summary.consistent, "{:?}", summary.findings);
    assert_eq!(summary.total(), 0);
    // 2 nodes, 1 relationship, 1 property, 3 tokens, the graph record and
    // 4 dynamic blocks.
    assert_eq!(summary.records_checked, 12);
}

#[test]
fn dangling_relationship_head_is_seen_from_both_ends() {
    init_tracing();
    let mut store = social_graph();
    store
        .nodes
        .insert(NodeRecord::new(2, Ref::to(11), Ref::NONE).with_inline_labels(&[1]));

    let summary = FullCheck::default().run(&store);
    assert!(!summary.consistent);
    assert_eq!(summary.count(RecordType::Node), 1);
    assert_eq!(summary.count(RecordType::Relationship), 1);
    assert_eq!(summary.errors, 2);

    let node = &summary.findings[0];
    assert_eq!((node.record_type, node.id), (RecordType::Node, 2));
    assert!(node.violation.starts_with("RelationshipNotInUse"));
    let relationship = &summary.findings[1];
    assert_eq!(relationship.id, 10);
    assert!(relationship
        .violation
        .starts_with("TargetNodeDoesNotReferenceBack"));
}

#[test]
fn shared_property_chain_needs_the_owner_check() {
    init_tracing();
    let mut store = social_graph();
    store
        .nodes
        .insert(NodeRecord::new(2, Ref::to(10), Ref::to(20)).with_inline_labels(&[1]));

    let summary = FullCheck::default().run(&store);
    assert_eq!(summary.count(RecordType::Node), 1);
    assert_eq!(summary.findings[0].id, 2);
    assert_eq!(summary.findings[0].violation, "MultipleOwners(Node(1))");

    let relaxed = FullCheck::new(CheckOptions::default().owner_check(false)).run(&store);
    assert!(relaxed.consistent);
}

#[test]
fn unnamed_label_and_missing_string_value() {
    init_tracing();
    let mut store = social_graph();
    store.label_tokens.insert(LabelTokenRecord::new(1).named(7));
    store.properties.insert(
        PropertyRecord::new(20)
            .with_block(PropertyBlock::string(1, 41))
            .owned_by(PropertyOwner::Node(1)),
    );

    let summary = FullCheck::default().run(&store);
    assert_eq!(summary.count(RecordType::LabelToken), 1);
    assert_eq!(summary.count(RecordType::Property), 1);
    assert_eq!(summary.total(), 2);
}

#[test]
fn findings_are_capped_but_counts_are_not() {
    init_tracing();
    let mut store = social_graph();
    for id in 30..35 {
        store.properties.insert(PropertyRecord::new(id));
    }

    let summary = FullCheck::new(CheckOptions::default().max_findings(2)).run(&store);
    assert_eq!(summary.count(RecordType::Property), 5);
    assert_eq!(summary.findings.len(), 2);
    assert_eq!(summary.findings[0].id, 30);
}

#[test]
fn schema_rules_resolve_their_counterparts() {
    init_tracing();
    let mut store = social_graph();
    store.put_schema_rule(&SchemaRule::constraint_index(60, 1, 1, Some(61)));
    store.put_schema_rule(&SchemaRule::uniqueness_constraint(61, 1, 1, 60));
    assert!(FullCheck::default().run(&store).consistent);

    store.put_schema_rule(&SchemaRule::uniqueness_constraint(61, 1, 1, 62));
    let summary = FullCheck::default().run(&store);
    assert_eq!(summary.count(RecordType::Schema), 2);
}

#[test]
fn summary_serialises_to_json() {
    init_tracing();
    let mut store = social_graph();
    store.properties.insert(PropertyRecord::new(30));

    let summary = FullCheck::default().run(&store);
    let json = serde_json::to_value(&summary).expect("serialise summary");
    assert_eq!(json["consistent"], false);
    assert_eq!(json["counts"]["property"], 1);
    assert_eq!(json["findings"][0]["record_type"], "property");
    assert_eq!(json["findings"][0]["severity"], "error");
    assert_eq!(json["findings"][0]["violation"], "OrphanPropertyChain");
}
