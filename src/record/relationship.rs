use crate::types::Ref;

use super::Record;

/// A relationship store record.
///
/// Each relationship sits in two doubly-linked chains, one per endpoint. The
/// `first_*` pointers belong to the source node's chain and the `second_*`
/// pointers to the target node's chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationshipRecord {
    /// Relationship id.
    pub id: u64,
    /// Whether the relationship exists.
    pub in_use: bool,
    /// Source node.
    pub first_node: Ref,
    /// Target node.
    pub second_node: Ref,
    /// Relationship type token.
    pub rel_type: Ref,
    /// Previous relationship of the source chain. On a chain head this
    /// slot holds the chain length instead.
    pub first_prev_rel: Ref,
    /// Next relationship of the source chain.
    pub first_next_rel: Ref,
    /// Previous relationship of the target chain, or the chain length on a
    /// head.
    pub second_prev_rel: Ref,
    /// Next relationship of the target chain.
    pub second_next_rel: Ref,
    /// Whether this record heads the source node's chain.
    pub first_in_first_chain: bool,
    /// Whether this record heads the target node's chain.
    pub first_in_second_chain: bool,
    /// Head of the property chain.
    pub next_prop: Ref,
}

impl RelationshipRecord {
    /// Creates an in-use relationship that heads both of its chains and
    /// links to nothing.
    pub fn new(id: u64, first_node: u64, second_node: u64, rel_type: u64) -> Self {
        Self {
            id,
            in_use: true,
            first_node: Ref::to(first_node),
            second_node: Ref::to(second_node),
            rel_type: Ref::to(rel_type),
            first_prev_rel: Ref::NONE,
            first_next_rel: Ref::NONE,
            second_prev_rel: Ref::NONE,
            second_next_rel: Ref::NONE,
            first_in_first_chain: true,
            first_in_second_chain: true,
            next_prop: Ref::NONE,
        }
    }

    /// Whether both endpoints are the same node.
    pub fn is_loop(&self) -> bool {
        self.first_node == self.second_node
    }
}

impl Record for RelationshipRecord {
    fn id(&self) -> u64 {
        self.id
    }

    fn in_use(&self) -> bool {
        self.in_use
    }

    fn absent(id: u64) -> Self {
        Self {
            in_use: false,
            first_node: Ref::NONE,
            second_node: Ref::NONE,
            rel_type: Ref::NONE,
            ..Self::new(id, 0, 0, 0)
        }
    }
}
