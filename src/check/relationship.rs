use crate::access::{DiffRecordAccess, RecordAccess};
use crate::record::{NodeRecord, RelationshipRecord};
use crate::types::Ref;

use super::primitive::{check_property_head, check_property_head_change};
use super::{CheckerEngine, RecordCheck, RelationshipViolation as V};

/// One endpoint of a relationship, and with it one of its two chains.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeSide {
    /// The start node and its chain.
    Source,
    /// The end node and its chain.
    Target,
}

impl NodeSide {
    /// The side of `relationship` that belongs to `node`, preferring
    /// [`NodeSide::Source`] for self-loops.
    pub fn select(relationship: &RelationshipRecord, node: u64) -> Option<NodeSide> {
        if relationship.first_node.points_to(node) {
            Some(NodeSide::Source)
        } else if relationship.second_node.points_to(node) {
            Some(NodeSide::Target)
        } else {
            None
        }
    }

    /// Endpoint node on this side.
    pub fn node(self, relationship: &RelationshipRecord) -> Ref {
        match self {
            NodeSide::Source => relationship.first_node,
            NodeSide::Target => relationship.second_node,
        }
    }

    /// Whether `relationship` heads this side's chain.
    pub fn is_first(self, relationship: &RelationshipRecord) -> bool {
        match self {
            NodeSide::Source => relationship.first_in_first_chain,
            NodeSide::Target => relationship.first_in_second_chain,
        }
    }

    /// Prev pointer in this side's chain.
    pub fn prev(self, relationship: &RelationshipRecord) -> Ref {
        match self {
            NodeSide::Source => relationship.first_prev_rel,
            NodeSide::Target => relationship.second_prev_rel,
        }
    }

    /// Next pointer in this side's chain.
    pub fn next(self, relationship: &RelationshipRecord) -> Ref {
        match self {
            NodeSide::Source => relationship.first_next_rel,
            NodeSide::Target => relationship.second_next_rel,
        }
    }

    fn illegal(self) -> V {
        match self {
            NodeSide::Source => V::IllegalSourceNode,
            NodeSide::Target => V::IllegalTargetNode,
        }
    }

    fn not_in_use(self, node: NodeRecord) -> V {
        match self {
            NodeSide::Source => V::SourceNodeNotInUse(node),
            NodeSide::Target => V::TargetNodeNotInUse(node),
        }
    }

    fn does_not_reference_back(self, node: NodeRecord) -> V {
        match self {
            NodeSide::Source => V::SourceNodeDoesNotReferenceBack(node),
            NodeSide::Target => V::TargetNodeDoesNotReferenceBack(node),
        }
    }

    fn has_no_relationships(self, node: NodeRecord) -> V {
        match self {
            NodeSide::Source => V::SourceNodeHasNoRelationships(node),
            NodeSide::Target => V::TargetNodeHasNoRelationships(node),
        }
    }

    fn not_updated(self) -> V {
        match self {
            NodeSide::Source => V::SourceNodeNotUpdated,
            NodeSide::Target => V::TargetNodeNotUpdated,
        }
    }
}

/// The four chain pointers of a relationship.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ChainPointer {
    SourcePrev,
    SourceNext,
    TargetPrev,
    TargetNext,
}

impl ChainPointer {
    const ALL: [ChainPointer; 4] = [
        ChainPointer::SourcePrev,
        ChainPointer::SourceNext,
        ChainPointer::TargetPrev,
        ChainPointer::TargetNext,
    ];

    fn side(self) -> NodeSide {
        match self {
            ChainPointer::SourcePrev | ChainPointer::SourceNext => NodeSide::Source,
            ChainPointer::TargetPrev | ChainPointer::TargetNext => NodeSide::Target,
        }
    }

    fn is_prev(self) -> bool {
        matches!(self, ChainPointer::SourcePrev | ChainPointer::TargetPrev)
    }

    fn value(self, relationship: &RelationshipRecord) -> Ref {
        if self.is_prev() {
            self.side().prev(relationship)
        } else {
            self.side().next(relationship)
        }
    }

    /// A chain head has no prev; its prev slot carries no pointer.
    fn is_end_of_chain(self, relationship: &RelationshipRecord) -> bool {
        if self.is_prev() {
            self.side().is_first(relationship)
        } else {
            self.value(relationship).is_none()
        }
    }

    /// The pointer on `referred` that must lead back along this pointer.
    fn back_reference(self, referred: &RelationshipRecord, side: NodeSide) -> Ref {
        if self.is_prev() {
            side.next(referred)
        } else {
            side.prev(referred)
        }
    }

    fn illegal(self, value: Ref) -> V {
        match self {
            ChainPointer::SourcePrev => V::IllegalSourcePrev(value),
            ChainPointer::SourceNext => V::IllegalSourceNext(value),
            ChainPointer::TargetPrev => V::IllegalTargetPrev(value),
            ChainPointer::TargetNext => V::IllegalTargetNext(value),
        }
    }

    fn not_in_use(self, referred: RelationshipRecord) -> V {
        match self {
            ChainPointer::SourcePrev => V::SourcePrevNotInUse(referred),
            ChainPointer::SourceNext => V::SourceNextNotInUse(referred),
            ChainPointer::TargetPrev => V::TargetPrevNotInUse(referred),
            ChainPointer::TargetNext => V::TargetNextNotInUse(referred),
        }
    }

    fn references_other_nodes(self, referred: RelationshipRecord) -> V {
        match self {
            ChainPointer::SourcePrev => V::SourcePrevReferencesOtherNodes(referred),
            ChainPointer::SourceNext => V::SourceNextReferencesOtherNodes(referred),
            ChainPointer::TargetPrev => V::TargetPrevReferencesOtherNodes(referred),
            ChainPointer::TargetNext => V::TargetNextReferencesOtherNodes(referred),
        }
    }

    fn does_not_reference_back(self, referred: RelationshipRecord) -> V {
        match self {
            ChainPointer::SourcePrev => V::SourcePrevDoesNotReferenceBack(referred),
            ChainPointer::SourceNext => V::SourceNextDoesNotReferenceBack(referred),
            ChainPointer::TargetPrev => V::TargetPrevDoesNotReferenceBack(referred),
            ChainPointer::TargetNext => V::TargetNextDoesNotReferenceBack(referred),
        }
    }

    fn not_updated(self) -> V {
        match self {
            ChainPointer::SourcePrev => V::SourcePrevNotUpdated,
            ChainPointer::SourceNext => V::SourceNextNotUpdated,
            ChainPointer::TargetPrev => V::TargetPrevNotUpdated,
            ChainPointer::TargetNext => V::TargetNextNotUpdated,
        }
    }
}

/// Validates relationship records: type, both endpoints, the four chain
/// pointers and the property chain head.
#[derive(Copy, Clone, Debug, Default)]
pub struct RelationshipRecordCheck;

impl RelationshipRecordCheck {
    /// Creates the checker.
    pub fn new() -> Self {
        Self
    }

    fn check_type<'a, A: RecordAccess + ?Sized>(
        &self,
        relationship: &RelationshipRecord,
        engine: &mut CheckerEngine<'a, V>,
        records: &'a A,
    ) {
        match relationship.rel_type.get() {
            None => engine.report(V::IllegalRelationshipType),
            Some(token) => {
                engine.comparative_check(records.relationship_type_token(token), |token, engine| {
                    if !token.in_use {
                        engine.report(V::RelationshipTypeNotInUse(token));
                    }
                })
            }
        }
    }

    fn check_node<'a, A: RecordAccess + ?Sized>(
        &self,
        side: NodeSide,
        relationship: &RelationshipRecord,
        engine: &mut CheckerEngine<'a, V>,
        records: &'a A,
    ) {
        let Some(node_id) = side.node(relationship).get() else {
            engine.report(side.illegal());
            return;
        };
        let id = relationship.id;
        let first = side.is_first(relationship);
        engine.comparative_check(records.node(node_id), move |node, engine| {
            if !node.in_use {
                engine.report(side.not_in_use(node));
            } else if first {
                if !node.next_rel.points_to(id) {
                    engine.report(side.does_not_reference_back(node));
                }
            } else if node.next_rel.is_none() {
                engine.report(side.has_no_relationships(node));
            }
        });
    }

    fn check_pointer<'a, A: RecordAccess + ?Sized>(
        &self,
        pointer: ChainPointer,
        relationship: &RelationshipRecord,
        engine: &mut CheckerEngine<'a, V>,
        records: &'a A,
    ) {
        if pointer.is_end_of_chain(relationship) {
            return;
        }
        let value = pointer.value(relationship);
        let target = match value.resolve() {
            Ok(Some(target)) => target,
            Ok(None) => return,
            Err(_) => {
                engine.report(pointer.illegal(value));
                return;
            }
        };
        // A missing endpoint is already reported as illegal.
        let Some(node) = pointer.side().node(relationship).get() else {
            return;
        };
        let id = relationship.id;
        engine.comparative_check(records.relationship(target), move |referred, engine| {
            if !referred.in_use {
                engine.report(pointer.not_in_use(referred));
                return;
            }
            let Some(side) = NodeSide::select(&referred, node) else {
                engine.report(pointer.references_other_nodes(referred));
                return;
            };
            let mut linked = pointer.back_reference(&referred, side).points_to(id);
            if !linked && referred.is_loop() {
                linked = pointer
                    .back_reference(&referred, NodeSide::Target)
                    .points_to(id);
            }
            if !linked {
                engine.report(pointer.does_not_reference_back(referred));
            }
        });
    }

    fn check_node_change<A: DiffRecordAccess + ?Sized>(
        &self,
        side: NodeSide,
        old: &RelationshipRecord,
        new: &RelationshipRecord,
        engine: &mut CheckerEngine<'_, V>,
        records: &A,
    ) {
        if !side.is_first(old) {
            return;
        }
        let moved = !new.in_use
            || side.node(old) != side.node(new)
            || !side.is_first(new)
            || side.prev(old) != side.prev(new);
        if !moved {
            return;
        }
        if let Some(node) = side.node(old).get() {
            if records.changed_node(node).is_none() {
                engine.report(side.not_updated());
            }
        }
    }

    fn check_pointer_change<A: DiffRecordAccess + ?Sized>(
        &self,
        pointer: ChainPointer,
        old: &RelationshipRecord,
        new: &RelationshipRecord,
        engine: &mut CheckerEngine<'_, V>,
        records: &A,
    ) {
        if new.in_use && pointer.value(old) == pointer.value(new) {
            return;
        }
        if pointer.is_end_of_chain(old) {
            return;
        }
        if let Some(neighbour) = pointer.value(old).get() {
            if records.changed_relationship(neighbour).is_none() {
                engine.report(pointer.not_updated());
            }
        }
    }
}

impl RecordCheck<RelationshipRecord> for RelationshipRecordCheck {
    type Violation = V;

    fn check<'a, A: RecordAccess + ?Sized>(
        &'a self,
        record: &RelationshipRecord,
        engine: &mut CheckerEngine<'a, V>,
        records: &'a A,
    ) {
        if !record.in_use {
            return;
        }
        self.check_type(record, engine, records);
        self.check_node(NodeSide::Source, record, engine, records);
        self.check_node(NodeSide::Target, record, engine, records);
        for pointer in ChainPointer::ALL {
            self.check_pointer(pointer, record, engine, records);
        }
        check_property_head(record, engine, records);
    }

    fn check_change<'a, A: DiffRecordAccess + ?Sized>(
        &'a self,
        old: &RelationshipRecord,
        new: &RelationshipRecord,
        engine: &mut CheckerEngine<'a, V>,
        records: &'a A,
    ) {
        self.check(new, engine, records);
        if !old.in_use {
            return;
        }
        self.check_node_change(NodeSide::Source, old, new, engine, records);
        self.check_node_change(NodeSide::Target, old, new, engine, records);
        for pointer in ChainPointer::ALL {
            self.check_pointer_change(pointer, old, new, engine, records);
        }
        check_property_head_change(old, new, engine, records);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::testing::*;
    use crate::check::{run_check, run_check_change};
    use crate::record::{Record, RelationshipTypeTokenRecord};

    /// Source node 1, target node 2, type 4, linked to nothing.
    fn fixture() -> (Fixture, RelationshipRecord) {
        let mut store = Fixture::new();
        store.relationship_types(&[4]);
        store.node(NodeRecord::new(1, Ref::to(42), Ref::NONE));
        store.node(NodeRecord::new(2, Ref::to(42), Ref::NONE));
        (store, RelationshipRecord::new(42, 1, 2, 4))
    }

    fn check(store: &Fixture, record: &RelationshipRecord) -> Vec<V> {
        run_check(&RelationshipRecordCheck, record, store.access())
    }

    #[test]
    fn not_in_use_relationship_is_skipped() {
        let (store, mut record) = fixture();
        record.in_use = false;
        record.rel_type = Ref::NONE;

        assert!(check(&store, &record).is_empty());
    }

    #[test]
    fn consistent_relationship_reports_nothing() {
        let (store, record) = fixture();
        assert!(check(&store, &record).is_empty());
    }

    #[test]
    fn illegal_type_and_type_not_in_use() {
        let (store, mut record) = fixture();
        record.rel_type = Ref::NONE;
        assert_eq!(check(&store, &record), vec![V::IllegalRelationshipType]);

        record.rel_type = Ref::to(5);
        assert_eq!(
            check(&store, &record),
            vec![V::RelationshipTypeNotInUse(RelationshipTypeTokenRecord::absent(5))]
        );
    }

    #[test]
    fn illegal_endpoints() {
        let (store, mut record) = fixture();
        record.first_node = Ref::NONE;
        record.second_node = Ref(-3);

        assert_eq!(
            check(&store, &record),
            vec![V::IllegalSourceNode, V::IllegalTargetNode]
        );
    }

    #[test]
    fn corrupt_chain_pointers_are_illegal() {
        let (store, mut record) = fixture();
        record.first_next_rel = Ref(-7);
        record.second_next_rel = Ref(-2);
        record.first_in_second_chain = false;
        record.second_prev_rel = Ref(-4);
        record.next_prop = Ref(-3);

        assert_eq!(
            check(&store, &record),
            vec![
                V::IllegalSourceNext(Ref(-7)),
                V::IllegalTargetPrev(Ref(-4)),
                V::IllegalTargetNext(Ref(-2)),
                V::IllegalPropertyReference(Ref(-3)),
            ]
        );
    }

    #[test]
    fn corrupt_prev_of_a_chain_head_is_not_followed() {
        let (store, mut record) = fixture();
        record.first_prev_rel = Ref(-6);

        assert!(check(&store, &record).is_empty());
    }

    #[test]
    fn endpoint_not_in_use() {
        let (store, mut record) = fixture();
        record.second_node = Ref::to(3);

        assert_eq!(
            check(&store, &record),
            vec![V::TargetNodeNotInUse(NodeRecord::absent(3))]
        );
    }

    #[test]
    fn head_node_must_reference_back() {
        let (mut store, record) = fixture();
        let source = store.node(NodeRecord::new(1, Ref::to(7), Ref::NONE));

        assert_eq!(
            check(&store, &record),
            vec![V::SourceNodeDoesNotReferenceBack(source)]
        );
    }

    #[test]
    fn mid_chain_relationship_needs_a_non_empty_chain() {
        let (mut store, mut record) = fixture();
        let target = store.node(NodeRecord::new(2, Ref::NONE, Ref::NONE));
        store.relationship(chained(40, 1, 2, |neighbour| {
            neighbour.second_next_rel = Ref::to(42);
        }));
        record.first_in_second_chain = false;
        record.second_prev_rel = Ref::to(40);

        assert_eq!(
            check(&store, &record),
            vec![V::TargetNodeHasNoRelationships(target)]
        );
    }

    #[test]
    fn neighbour_not_in_use() {
        let (store, mut record) = fixture();
        record.first_next_rel = Ref::to(43);

        assert_eq!(
            check(&store, &record),
            vec![V::SourceNextNotInUse(RelationshipRecord::absent(43))]
        );
    }

    #[test]
    fn neighbour_for_other_nodes() {
        let (mut store, mut record) = fixture();
        let other = store.relationship(RelationshipRecord::new(43, 8, 9, 4));
        record.second_next_rel = Ref::to(43);

        assert_eq!(
            check(&store, &record),
            vec![V::TargetNextReferencesOtherNodes(other)]
        );
    }

    #[test]
    fn neighbour_must_point_back() {
        let (mut store, mut record) = fixture();
        let next = store.relationship(chained(43, 1, 5, |next| {
            next.first_in_first_chain = false;
            next.first_prev_rel = Ref::to(99);
        }));
        record.first_next_rel = Ref::to(43);

        assert_eq!(
            check(&store, &record),
            vec![V::SourceNextDoesNotReferenceBack(next)]
        );
    }

    #[test]
    fn neighbour_pointing_back_on_its_target_side_is_consistent() {
        let (mut store, mut record) = fixture();
        store.relationship(chained(43, 5, 1, |next| {
            next.first_in_second_chain = false;
            next.second_prev_rel = Ref::to(42);
        }));
        record.first_next_rel = Ref::to(43);

        assert!(check(&store, &record).is_empty());
    }

    #[test]
    fn prev_pointer_of_a_chain_head_is_not_followed() {
        let (store, mut record) = fixture();
        record.first_prev_rel = Ref::to(3);
        record.second_prev_rel = Ref::to(3);

        assert!(check(&store, &record).is_empty());
    }

    #[test]
    fn prev_pointer_must_point_back() {
        let (mut store, mut record) = fixture();
        store.node(NodeRecord::new(1, Ref::to(41), Ref::NONE));
        let prev = store.relationship(RelationshipRecord::new(41, 1, 6, 4));
        record.first_in_first_chain = false;
        record.first_prev_rel = Ref::to(41);

        assert_eq!(
            check(&store, &record),
            vec![V::SourcePrevDoesNotReferenceBack(prev)]
        );
    }

    #[test]
    fn self_loop_chain_is_consistent() {
        let mut store = Fixture::new();
        store.relationship_types(&[4]);
        store.node(NodeRecord::new(1, Ref::to(42), Ref::NONE));
        let mut looped = RelationshipRecord::new(42, 1, 1, 4);
        looped.first_next_rel = Ref::to(43);
        looped.second_next_rel = Ref::to(43);
        store.relationship(chained(43, 1, 7, |next| {
            next.first_in_first_chain = false;
            next.first_prev_rel = Ref::to(42);
        }));

        assert!(check(&store, &looped).is_empty());
    }

    #[test]
    fn property_head_not_in_use() {
        let (store, mut record) = fixture();
        record.next_prop = Ref::to(11);

        assert_eq!(
            check(&store, &record),
            vec![V::PropertyNotInUse(crate::record::PropertyRecord::absent(11))]
        );
    }

    #[test]
    fn deleting_a_head_requires_updating_node_and_neighbours() {
        let (mut base, mut old) = fixture();
        old.first_next_rel = Ref::to(43);
        base.relationship(chained(43, 1, 5, |next| {
            next.first_in_first_chain = false;
            next.first_prev_rel = Ref::to(42);
        }));
        base.relationship(old.clone());
        let mut diff = DiffFixture::over(base);
        diff.change_relationship(RelationshipRecord::absent(42));

        let violations = run_check_change(
            &RelationshipRecordCheck,
            &old,
            &RelationshipRecord::absent(42),
            diff.access(),
        );
        assert_same_violations(
            violations,
            vec![
                V::SourceNodeNotUpdated,
                V::TargetNodeNotUpdated,
                V::SourceNextNotUpdated,
            ],
        );
    }

    #[test]
    fn replaced_source_next_must_update_the_old_neighbour() {
        let (mut base, mut old) = fixture();
        old.first_next_rel = Ref::to(101);
        base.relationship(chained(101, 1, 5, |next| {
            next.first_in_first_chain = false;
            next.first_prev_rel = Ref::to(42);
        }));
        base.relationship(old.clone());
        let mut diff = DiffFixture::over(base);
        let mut new = old.clone();
        new.first_next_rel = Ref::to(201);
        diff.change_relationship(new.clone());
        diff.change_relationship(chained(201, 1, 6, |next| {
            next.first_in_first_chain = false;
            next.first_prev_rel = Ref::to(42);
        }));

        assert_eq!(
            run_check_change(&RelationshipRecordCheck, &old, &new, diff.access()),
            vec![V::SourceNextNotUpdated]
        );

        diff.change_relationship(RelationshipRecord::absent(101));
        assert!(run_check_change(&RelationshipRecordCheck, &old, &new, diff.access()).is_empty());
    }

    #[test]
    fn replaced_target_prev_must_update_the_old_neighbour() {
        let (mut base, mut old) = fixture();
        old.first_in_second_chain = false;
        old.second_prev_rel = Ref::to(100);
        base.relationship(chained(100, 7, 2, |prev| prev.second_next_rel = Ref::to(42)));
        base.relationship(old.clone());
        let mut diff = DiffFixture::over(base);
        let mut new = old.clone();
        new.second_prev_rel = Ref::to(200);
        diff.change_relationship(new.clone());
        diff.change_relationship(chained(200, 8, 2, |prev| prev.second_next_rel = Ref::to(42)));

        assert_eq!(
            run_check_change(&RelationshipRecordCheck, &old, &new, diff.access()),
            vec![V::TargetPrevNotUpdated]
        );
    }

    #[test]
    fn head_that_stops_being_first_must_update_its_node() {
        let (mut base, old) = fixture();
        base.relationship(old.clone());
        let mut diff = DiffFixture::over(base);
        let mut new = old.clone();
        new.first_in_first_chain = false;
        new.first_prev_rel = Ref::to(41);
        diff.change_relationship(new.clone());
        diff.change_relationship(chained(41, 1, 9, |prev| prev.first_next_rel = Ref::to(42)));

        assert_eq!(
            run_check_change(&RelationshipRecordCheck, &old, &new, diff.access()),
            vec![V::SourceNodeNotUpdated]
        );

        diff.change_node(NodeRecord::new(1, Ref::to(41), Ref::NONE));
        assert!(run_check_change(&RelationshipRecordCheck, &old, &new, diff.access()).is_empty());
    }

    #[test]
    fn head_moved_to_another_node_must_update_the_old_node() {
        let (mut base, old) = fixture();
        base.relationship(old.clone());
        let mut diff = DiffFixture::over(base);
        let mut new = old.clone();
        new.first_node = Ref::to(3);
        diff.change_relationship(new.clone());
        diff.change_node(NodeRecord::new(3, Ref::to(42), Ref::NONE));

        assert_eq!(
            run_check_change(&RelationshipRecordCheck, &old, &new, diff.access()),
            vec![V::SourceNodeNotUpdated]
        );
    }

    #[test]
    fn head_prev_count_change_must_update_its_node() {
        let (mut base, mut old) = fixture();
        old.second_prev_rel = Ref::to(1);
        base.relationship(old.clone());
        let mut diff = DiffFixture::over(base);
        let mut new = old.clone();
        new.second_prev_rel = Ref::to(2);
        diff.change_relationship(new.clone());

        assert_eq!(
            run_check_change(&RelationshipRecordCheck, &old, &new, diff.access()),
            vec![V::TargetNodeNotUpdated]
        );

        diff.change_node(NodeRecord::new(2, Ref::to(42), Ref::NONE));
        assert!(run_check_change(&RelationshipRecordCheck, &old, &new, diff.access()).is_empty());
    }

    #[test]
    fn deletion_with_every_dependant_updated_is_consistent() {
        let (mut base, old) = fixture();
        base.relationship(old.clone());
        let mut diff = DiffFixture::over(base);
        diff.change_relationship(RelationshipRecord::absent(42));
        diff.change_node(NodeRecord::new(1, Ref::NONE, Ref::NONE));
        diff.change_node(NodeRecord::new(2, Ref::NONE, Ref::NONE));

        let violations = run_check_change(
            &RelationshipRecordCheck,
            &old,
            &RelationshipRecord::absent(42),
            diff.access(),
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn creation_skips_transition_checks() {
        let (base, new) = fixture();
        let mut diff = DiffFixture::over(base);
        diff.change_relationship(new.clone());

        let violations = run_check_change(
            &RelationshipRecordCheck,
            &RelationshipRecord::absent(42),
            &new,
            diff.access(),
        );
        assert!(violations.is_empty());
    }
}
