use std::fmt;

use serde::Serialize;

use crate::record::{
    DynamicRecord, LabelTokenRecord, NodeRecord, PropertyBlock, PropertyKeyTokenRecord,
    PropertyOwner, PropertyRecord, RelationshipRecord, RelationshipTypeTokenRecord, RuleKind,
};
use crate::types::Ref;

/// Receives the violations found for one record.
pub trait ConsistencyReport<V> {
    /// Records a single violation.
    fn report(&mut self, violation: V);
}

impl<V> ConsistencyReport<V> for Vec<V> {
    fn report(&mut self, violation: V) {
        self.push(violation);
    }
}

/// How bad a violation is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Suspicious but readable.
    Warning,
    /// The store is corrupt.
    Error,
}

/// Common surface of the per-record violation enums.
pub trait Violation: fmt::Debug {
    /// Severity of this violation.
    fn severity(&self) -> Severity {
        Severity::Error
    }
}

/// Violations shared by every record that heads a property chain.
pub trait PrimitiveViolation: Sized {
    /// The property chain head is not in use.
    fn property_not_in_use(property: PropertyRecord) -> Self;
    /// The property chain head has a prev pointer.
    fn property_not_first_in_chain(property: PropertyRecord) -> Self;
    /// The property chain pointer holds a corrupt value.
    fn illegal_property_reference(pointer: Ref) -> Self;
    /// The old property chain head was dropped without being updated.
    fn property_not_updated() -> Self;
    /// The property chain head is also claimed by `previous`.
    fn multiple_owners(previous: PropertyOwner) -> Self;
}

macro_rules! primitive_violations {
    ($name:ident) => {
        impl PrimitiveViolation for $name {
            fn property_not_in_use(property: PropertyRecord) -> Self {
                $name::PropertyNotInUse(property)
            }

            fn property_not_first_in_chain(property: PropertyRecord) -> Self {
                $name::PropertyNotFirstInChain(property)
            }

            fn illegal_property_reference(pointer: Ref) -> Self {
                $name::IllegalPropertyReference(pointer)
            }

            fn property_not_updated() -> Self {
                $name::PropertyNotUpdated
            }

            fn multiple_owners(previous: PropertyOwner) -> Self {
                $name::MultipleOwners(previous)
            }
        }
    };
}

/// Node inconsistencies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeViolation {
    /// The first property record is not in use.
    PropertyNotInUse(PropertyRecord),
    /// The first property record has a prev pointer.
    PropertyNotFirstInChain(PropertyRecord),
    /// `next_prop` is negative but not the empty pointer.
    IllegalPropertyReference(Ref),
    /// The old property chain head was not part of the change.
    PropertyNotUpdated,
    /// Another record already claimed this property chain.
    MultipleOwners(PropertyOwner),
    /// The first relationship is not in use.
    RelationshipNotInUse(RelationshipRecord),
    /// The chain head names neither endpoint as this node.
    RelationshipForOtherNode(RelationshipRecord),
    /// The head is not flagged first in the source chain.
    RelationshipNotFirstInSourceChain(RelationshipRecord),
    /// The head is not flagged first in the target chain.
    RelationshipNotFirstInTargetChain(RelationshipRecord),
    /// `next_rel` is negative but not the empty pointer.
    IllegalRelationshipReference(Ref),
    /// The old relationship chain head was not part of the change.
    RelationshipNotUpdated,
    /// A label token is not in use.
    LabelNotInUse(LabelTokenRecord),
    /// A label id appears more than once.
    LabelDuplicate(u32),
    /// One adjacent inversion in the stored label order.
    LabelsOutOfOrder {
        /// The earlier, larger label id.
        largest: u32,
        /// The later, smaller label id.
        smallest: u32,
    },
    /// A block of the label chain is not in use.
    DynamicLabelRecordNotInUse(DynamicRecord),
    /// The label chain loops back at this block.
    DynamicRecordChainCycle(DynamicRecord),
    /// A label chain pointer is negative but not the empty pointer.
    IllegalDynamicLabelReference(Ref),
    /// The label chain bytes are not a label array. Carries the first block.
    MalformedLabelArray(DynamicRecord),
}

primitive_violations!(NodeViolation);
impl Violation for NodeViolation {}

/// Relationship inconsistencies.
///
/// Source and target name the two endpoints together with the chain each
/// endpoint threads through this relationship.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelationshipViolation {
    /// The first property record is not in use.
    PropertyNotInUse(PropertyRecord),
    /// The first property record has a prev pointer.
    PropertyNotFirstInChain(PropertyRecord),
    /// `next_prop` is negative but not the empty pointer.
    IllegalPropertyReference(Ref),
    /// The old property chain head was not part of the change.
    PropertyNotUpdated,
    /// Another record already claimed this property chain.
    MultipleOwners(PropertyOwner),
    /// No type id.
    IllegalRelationshipType,
    /// The type token is not in use.
    RelationshipTypeNotInUse(RelationshipTypeTokenRecord),
    /// No source node id.
    IllegalSourceNode,
    /// No target node id.
    IllegalTargetNode,
    /// The source node is not in use.
    SourceNodeNotInUse(NodeRecord),
    /// The target node is not in use.
    TargetNodeNotInUse(NodeRecord),
    /// Flagged first, but the source node starts its chain elsewhere.
    SourceNodeDoesNotReferenceBack(NodeRecord),
    /// Flagged first, but the target node starts its chain elsewhere.
    TargetNodeDoesNotReferenceBack(NodeRecord),
    /// Mid-chain, yet the source node has no chain.
    SourceNodeHasNoRelationships(NodeRecord),
    /// Mid-chain, yet the target node has no chain.
    TargetNodeHasNoRelationships(NodeRecord),
    /// Source prev not in use.
    SourcePrevNotInUse(RelationshipRecord),
    /// Source next not in use.
    SourceNextNotInUse(RelationshipRecord),
    /// Target prev not in use.
    TargetPrevNotInUse(RelationshipRecord),
    /// Target next not in use.
    TargetNextNotInUse(RelationshipRecord),
    /// The source prev does not touch the source node.
    SourcePrevReferencesOtherNodes(RelationshipRecord),
    /// The source next does not touch the source node.
    SourceNextReferencesOtherNodes(RelationshipRecord),
    /// The target prev does not touch the target node.
    TargetPrevReferencesOtherNodes(RelationshipRecord),
    /// The target next does not touch the target node.
    TargetNextReferencesOtherNodes(RelationshipRecord),
    /// The source prev's next pointer leads elsewhere.
    SourcePrevDoesNotReferenceBack(RelationshipRecord),
    /// The source next's prev pointer leads elsewhere.
    SourceNextDoesNotReferenceBack(RelationshipRecord),
    /// The target prev's next pointer leads elsewhere.
    TargetPrevDoesNotReferenceBack(RelationshipRecord),
    /// The target next's prev pointer leads elsewhere.
    TargetNextDoesNotReferenceBack(RelationshipRecord),
    /// `first_prev_rel` holds a corrupt value.
    IllegalSourcePrev(Ref),
    /// `first_next_rel` holds a corrupt value.
    IllegalSourceNext(Ref),
    /// `second_prev_rel` holds a corrupt value.
    IllegalTargetPrev(Ref),
    /// `second_next_rel` holds a corrupt value.
    IllegalTargetNext(Ref),
    /// The old source prev was not part of the change.
    SourcePrevNotUpdated,
    /// The old source next was not part of the change.
    SourceNextNotUpdated,
    /// The old target prev was not part of the change.
    TargetPrevNotUpdated,
    /// The old target next was not part of the change.
    TargetNextNotUpdated,
    /// The source node still names this relationship as its chain head.
    SourceNodeNotUpdated,
    /// The target node still names this relationship as its chain head.
    TargetNodeNotUpdated,
}

primitive_violations!(RelationshipViolation);
impl Violation for RelationshipViolation {}

/// Inconsistencies of the graph-global record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NeoStoreViolation {
    /// The first graph property is not in use.
    PropertyNotInUse(PropertyRecord),
    /// The first graph property has a prev pointer.
    PropertyNotFirstInChain(PropertyRecord),
    /// `next_prop` is negative but not the empty pointer.
    IllegalPropertyReference(Ref),
    /// The old graph property head was not part of the change.
    PropertyNotUpdated,
    /// Another record already claimed the graph property chain.
    MultipleOwners(PropertyOwner),
}

primitive_violations!(NeoStoreViolation);
impl Violation for NeoStoreViolation {}

/// Property record inconsistencies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyViolation {
    /// The block carries no key id.
    InvalidPropertyKey(PropertyBlock),
    /// The key token is not in use.
    KeyNotInUse {
        /// Block naming the key.
        block: PropertyBlock,
        /// The key token as read.
        key: PropertyKeyTokenRecord,
    },
    /// The type tag names no known type.
    InvalidPropertyType(PropertyBlock),
    /// The inline value does not fit its type.
    InvalidPropertyValue(PropertyBlock),
    /// The string value block is not in use.
    StringNotInUse {
        /// Block referencing the value.
        block: PropertyBlock,
        /// First value block as read.
        value: DynamicRecord,
    },
    /// The array value block is not in use.
    ArrayNotInUse {
        /// Block referencing the value.
        block: PropertyBlock,
        /// First value block as read.
        value: DynamicRecord,
    },
    /// The string value block holds no bytes.
    StringEmpty {
        /// Block referencing the value.
        block: PropertyBlock,
        /// First value block as read.
        value: DynamicRecord,
    },
    /// The array value block holds no bytes.
    ArrayEmpty {
        /// Block referencing the value.
        block: PropertyBlock,
        /// First value block as read.
        value: DynamicRecord,
    },
    /// Prev record not in use.
    PrevNotInUse(PropertyRecord),
    /// Next record not in use.
    NextNotInUse(PropertyRecord),
    /// The prev record's next pointer leads elsewhere.
    PreviousDoesNotReferenceBack(PropertyRecord),
    /// The next record's prev pointer leads elsewhere.
    NextDoesNotReferenceBack(PropertyRecord),
    /// `prev_prop` is negative but not the empty pointer.
    IllegalPrevReference(Ref),
    /// `next_prop` is negative but not the empty pointer.
    IllegalNextReference(Ref),
    /// The old prev record was not part of the change.
    PrevNotUpdated,
    /// The old next record was not part of the change.
    NextNotUpdated,
    /// A string value dropped by the change was left in use.
    StringUnreferencedButNotDeleted(PropertyBlock),
    /// An array value dropped by the change was left in use.
    ArrayUnreferencedButNotDeleted(PropertyBlock),
    /// The owner's chain does not reach this record after the change.
    OwnerDoesNotReferenceBack,
    /// The owner's chain did not reach this record before the change.
    ChangedForWrongOwner,
    /// First record of a chain that no owner claims.
    OrphanPropertyChain,
}

impl Violation for PropertyViolation {}

/// Dynamic block inconsistencies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DynamicViolation {
    /// Negative payload length.
    InvalidLength,
    /// A terminal block with no payload.
    EmptyBlock,
    /// The next block holds no payload.
    EmptyNextBlock(DynamicRecord),
    /// A partially filled block still chains on.
    RecordNotFullReferencesNext,
    /// The next block is not in use.
    NextNotInUse(DynamicRecord),
    /// The block names itself as next.
    SelfReferentialNext,
    /// `next_block` is negative but not the empty pointer.
    IllegalNextReference(Ref),
    /// The old next block was not part of the change.
    NextNotUpdated,
}

impl Violation for DynamicViolation {
    fn severity(&self) -> Severity {
        match self {
            DynamicViolation::EmptyBlock
            | DynamicViolation::EmptyNextBlock(_)
            | DynamicViolation::RecordNotFullReferencesNext => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// Token name inconsistencies, shared by all token stores.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameViolation {
    /// The first name block is not in use.
    NameBlockNotInUse(DynamicRecord),
    /// The first name block holds no bytes.
    EmptyName(DynamicRecord),
    /// `name_id` is negative but not the empty pointer.
    IllegalNameReference(Ref),
}

impl Violation for NameViolation {
    fn severity(&self) -> Severity {
        match self {
            NameViolation::EmptyName(_) => Severity::Warning,
            NameViolation::NameBlockNotInUse(_) | NameViolation::IllegalNameReference(_) => {
                Severity::Error
            }
        }
    }
}

/// Schema rule inconsistencies. Related rules are named by their first
/// schema block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaViolation {
    /// The rule's label token is not in use.
    LabelNotInUse(LabelTokenRecord),
    /// The rule's property key token is not in use.
    PropertyKeyNotInUse(PropertyKeyTokenRecord),
    /// The constraint's index is owned by a different constraint.
    UniquenessConstraintNotReferencingBack(DynamicRecord),
    /// The index's constraint backs a different index.
    ConstraintIndexRuleNotReferencingBack(DynamicRecord),
    /// No rule of the expected kind claimed this one.
    MissingObligation(RuleKind),
    /// Another rule already claimed the same counterpart.
    DuplicateObligation(DynamicRecord),
    /// Another rule covers the same kind, label and key.
    DuplicateRuleContent(DynamicRecord),
    /// The rule bytes do not decode.
    MalformedSchemaRule,
    /// The rule kind byte is unknown.
    UnsupportedSchemaRuleKind(u8),
}

impl Violation for SchemaViolation {}
