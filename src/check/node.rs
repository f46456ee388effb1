use rustc_hash::FxHashSet;

use crate::access::{DiffRecordAccess, RecordAccess};
use crate::record::{decode_label_array, DynamicStore, LabelField, NodeRecord};

use super::primitive::{check_property_head, check_property_head_change};
use super::relationship::NodeSide;
use super::{CheckerEngine, NodeViolation, RecordCheck};

/// Validates node records: relationship chain head, property chain head and
/// labels.
#[derive(Copy, Clone, Debug, Default)]
pub struct NodeRecordCheck;

impl NodeRecordCheck {
    /// Creates the checker.
    pub fn new() -> Self {
        Self
    }

    fn check_relationship_head<'a, A: RecordAccess + ?Sized>(
        &self,
        node: &NodeRecord,
        engine: &mut CheckerEngine<'a, NodeViolation>,
        records: &'a A,
    ) {
        let head = match node.next_rel.resolve() {
            Ok(Some(head)) => head,
            Ok(None) => return,
            Err(_) => {
                engine.report(NodeViolation::IllegalRelationshipReference(node.next_rel));
                return;
            }
        };
        let node_id = node.id;
        engine.comparative_check(records.relationship(head), move |relationship, engine| {
            if !relationship.in_use {
                engine.report(NodeViolation::RelationshipNotInUse(relationship));
                return;
            }
            let Some(selected) = NodeSide::select(&relationship, node_id) else {
                engine.report(NodeViolation::RelationshipForOtherNode(relationship));
                return;
            };
            let sides: &[NodeSide] = if relationship.is_loop() {
                &[NodeSide::Source, NodeSide::Target]
            } else if selected == NodeSide::Source {
                &[NodeSide::Source]
            } else {
                &[NodeSide::Target]
            };
            for side in sides {
                if side.is_first(&relationship) {
                    continue;
                }
                engine.report(match side {
                    NodeSide::Source => {
                        NodeViolation::RelationshipNotFirstInSourceChain(relationship.clone())
                    }
                    NodeSide::Target => {
                        NodeViolation::RelationshipNotFirstInTargetChain(relationship.clone())
                    }
                });
            }
        });
    }

    fn check_labels<'a, A: RecordAccess + ?Sized>(
        &self,
        node: &NodeRecord,
        engine: &mut CheckerEngine<'a, NodeViolation>,
        records: &'a A,
    ) {
        match &node.labels {
            LabelField::Inline(labels) => validate_labels(labels, engine, records),
            LabelField::Dynamic(head) => {
                let first = match head.resolve() {
                    Ok(Some(first)) => first,
                    Ok(None) => return,
                    Err(_) => {
                        engine.report(NodeViolation::IllegalDynamicLabelReference(*head));
                        return;
                    }
                };
                let first = records.dynamic(DynamicStore::NodeLabels, first);
                engine.comparative_check(first, move |first, engine| {
                    walk_label_chain(first, engine, records);
                });
            }
        }
    }
}

fn walk_label_chain<'a, A: RecordAccess + ?Sized>(
    first: crate::record::DynamicRecord,
    engine: &mut CheckerEngine<'a, NodeViolation>,
    records: &'a A,
) {
    let mut visited = FxHashSet::default();
    let mut bytes = Vec::new();
    let mut intact = true;
    let mut current = first.clone();
    loop {
        visited.insert(current.id);
        if current.in_use {
            bytes.extend_from_slice(current.payload());
        } else {
            intact = false;
            engine.report(NodeViolation::DynamicLabelRecordNotInUse(current.clone()));
        }
        let next = match current.next_block.resolve() {
            Ok(Some(next)) => next,
            Ok(None) => break,
            Err(_) => {
                intact = false;
                engine.report(NodeViolation::IllegalDynamicLabelReference(current.next_block));
                break;
            }
        };
        if visited.contains(&next) {
            intact = false;
            engine.report(NodeViolation::DynamicRecordChainCycle(current));
            break;
        }
        current = records.dynamic(DynamicStore::NodeLabels, next);
    }
    if !intact {
        return;
    }
    match decode_label_array(&bytes) {
        Some(labels) => validate_labels(&labels, engine, records),
        None => engine.report(NodeViolation::MalformedLabelArray(first)),
    }
}

/// Every label must be an in-use token and the ids strictly ascending.
fn validate_labels<'a, A: RecordAccess + ?Sized>(
    labels: &[u32],
    engine: &mut CheckerEngine<'a, NodeViolation>,
    records: &'a A,
) {
    for label in labels {
        engine.comparative_check(
            records.label_token(u64::from(*label)),
            |token, engine| {
                if !token.in_use {
                    engine.report(NodeViolation::LabelNotInUse(token));
                }
            },
        );
    }

    let mut sorted = true;
    for pair in labels.windows(2) {
        if pair[0] > pair[1] {
            sorted = false;
            engine.report(NodeViolation::LabelsOutOfOrder {
                largest: pair[0],
                smallest: pair[1],
            });
        }
    }
    let mut ordered = labels.to_vec();
    if !sorted {
        ordered.sort_unstable();
    }
    for pair in ordered.windows(2) {
        if pair[0] == pair[1] {
            engine.report(NodeViolation::LabelDuplicate(pair[0]));
        }
    }
}

impl RecordCheck<NodeRecord> for NodeRecordCheck {
    type Violation = NodeViolation;

    fn check<'a, A: RecordAccess + ?Sized>(
        &'a self,
        record: &NodeRecord,
        engine: &mut CheckerEngine<'a, NodeViolation>,
        records: &'a A,
    ) {
        if !record.in_use {
            return;
        }
        self.check_relationship_head(record, engine, records);
        check_property_head(record, engine, records);
        self.check_labels(record, engine, records);
    }

    fn check_change<'a, A: DiffRecordAccess + ?Sized>(
        &'a self,
        old: &NodeRecord,
        new: &NodeRecord,
        engine: &mut CheckerEngine<'a, NodeViolation>,
        records: &'a A,
    ) {
        self.check(new, engine, records);
        if !old.in_use {
            return;
        }
        if !new.in_use || old.next_rel != new.next_rel {
            if let Some(old_head) = old.next_rel.get() {
                if records.changed_relationship(old_head).is_none() {
                    engine.report(NodeViolation::RelationshipNotUpdated);
                }
            }
        }
        check_property_head_change(old, new, engine, records);
    }
}
