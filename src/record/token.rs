use std::fmt;
use std::marker::PhantomData;

use crate::types::{RecordType, Ref};

use super::{DynamicStore, Record};

/// Marker describing one token store.
pub trait TokenKind: Copy + Clone + fmt::Debug + PartialEq + Eq + Default {
    /// Dynamic store holding this token kind's names.
    const NAME_STORE: DynamicStore;
    /// Record type of the token records themselves.
    const RECORD_TYPE: RecordType;
}

/// Label tokens.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Label;

/// Property key tokens.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct PropertyKey;

/// Relationship type tokens.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct RelationshipType;

impl TokenKind for Label {
    const NAME_STORE: DynamicStore = DynamicStore::LabelName;
    const RECORD_TYPE: RecordType = RecordType::LabelToken;
}

impl TokenKind for PropertyKey {
    const NAME_STORE: DynamicStore = DynamicStore::PropertyKeyName;
    const RECORD_TYPE: RecordType = RecordType::PropertyKeyToken;
}

impl TokenKind for RelationshipType {
    const NAME_STORE: DynamicStore = DynamicStore::RelationshipTypeName;
    const RECORD_TYPE: RecordType = RecordType::RelationshipTypeToken;
}

/// A token record: an id whose name lives in a dynamic chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenRecord<K: TokenKind> {
    /// Token id.
    pub id: u64,
    /// Whether the token is defined.
    pub in_use: bool,
    /// First block of the name chain.
    pub name_id: Ref,
    kind: PhantomData<K>,
}

/// A label token record.
pub type LabelTokenRecord = TokenRecord<Label>;
/// A property key token record.
pub type PropertyKeyTokenRecord = TokenRecord<PropertyKey>;
/// A relationship type token record.
pub type RelationshipTypeTokenRecord = TokenRecord<RelationshipType>;

impl<K: TokenKind> TokenRecord<K> {
    /// An in-use token without a name.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            in_use: true,
            name_id: Ref::NONE,
            kind: PhantomData,
        }
    }

    /// Points the token at its name chain.
    pub fn named(mut self, name_block: u64) -> Self {
        self.name_id = Ref::to(name_block);
        self
    }
}

impl<K: TokenKind> Record for TokenRecord<K> {
    fn id(&self) -> u64 {
        self.id
    }

    fn in_use(&self) -> bool {
        self.in_use
    }

    fn absent(id: u64) -> Self {
        Self {
            in_use: false,
            ..Self::new(id)
        }
    }
}
