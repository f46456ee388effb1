use crate::types::Ref;

use super::Record;

/// The entity a property chain hangs off.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyOwner {
    /// A node, by id.
    Node(u64),
    /// A relationship, by id.
    Relationship(u64),
    /// The graph-global record.
    Graph,
}

/// Value type tags understood by the property store.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PropertyType {
    /// `0` or `1`.
    Bool = 1,
    /// 8-bit signed.
    Byte = 2,
    /// 16-bit signed.
    Short = 3,
    /// A UTF-16 code unit.
    Char = 4,
    /// 32-bit signed.
    Int = 5,
    /// 64-bit signed.
    Long = 6,
    /// 32-bit float bits.
    Float = 7,
    /// 64-bit float bits.
    Double = 8,
    /// Value lives in the string store.
    String = 9,
    /// Value lives in the array store.
    Array = 10,
}

impl PropertyType {
    /// Parses a raw type tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Bool),
            2 => Some(Self::Byte),
            3 => Some(Self::Short),
            4 => Some(Self::Char),
            5 => Some(Self::Int),
            6 => Some(Self::Long),
            7 => Some(Self::Float),
            8 => Some(Self::Double),
            9 => Some(Self::String),
            10 => Some(Self::Array),
            _ => None,
        }
    }

    /// Raw tag for this type.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Whether the value is stored out of line in a dynamic chain.
    pub const fn is_dynamic(self) -> bool {
        matches!(self, Self::String | Self::Array)
    }

    /// Whether an inline payload is a legal encoding for this type.
    ///
    /// Dynamic types carry a record id and always pass.
    pub fn accepts_inline(self, value: u64) -> bool {
        match self {
            Self::Bool => value <= 1,
            Self::Byte => value <= u64::from(u8::MAX),
            Self::Short => value <= u64::from(u16::MAX),
            Self::Char => u32::try_from(value).ok().and_then(char::from_u32).is_some(),
            Self::Int | Self::Float => value <= u64::from(u32::MAX),
            Self::Long | Self::Double | Self::String | Self::Array => true,
        }
    }
}

/// One key/value slot of a property record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyBlock {
    /// Property key token.
    pub key: Ref,
    /// Raw type tag, see [`PropertyType`].
    pub type_tag: u8,
    /// Inline payload, or the first dynamic record id for string/array values.
    pub value: u64,
}

impl PropertyBlock {
    /// An inline scalar block.
    pub fn inline(key: u32, ty: PropertyType, value: u64) -> Self {
        Self {
            key: Ref::to(u64::from(key)),
            type_tag: ty.tag(),
            value,
        }
    }

    /// A block whose value is the string chain starting at `first_block`.
    pub fn string(key: u32, first_block: u64) -> Self {
        Self::inline(key, PropertyType::String, first_block)
    }

    /// A block whose value is the array chain starting at `first_block`.
    pub fn array(key: u32, first_block: u64) -> Self {
        Self::inline(key, PropertyType::Array, first_block)
    }

    /// Decoded type, `None` for unknown tags.
    pub fn kind(&self) -> Option<PropertyType> {
        PropertyType::from_tag(self.type_tag)
    }

    /// First dynamic record of a string or array value.
    pub fn value_record(&self) -> Option<u64> {
        self.kind().filter(|ty| ty.is_dynamic()).map(|_| self.value)
    }
}

/// A property store record: a run of blocks inside a singly-owned,
/// doubly-linked property chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyRecord {
    /// Property record id.
    pub id: u64,
    /// Whether the record is part of a chain.
    pub in_use: bool,
    /// Previous record of the chain.
    pub prev_prop: Ref,
    /// Next record of the chain.
    pub next_prop: Ref,
    /// Property values held by this record.
    pub blocks: Vec<PropertyBlock>,
    /// Owner stamped on the record by the writer of a change.
    pub owner: Option<PropertyOwner>,
}

impl PropertyRecord {
    /// An in-use, unlinked record with no blocks.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            in_use: true,
            prev_prop: Ref::NONE,
            next_prop: Ref::NONE,
            blocks: Vec::new(),
            owner: None,
        }
    }

    /// Appends a block.
    pub fn with_block(mut self, block: PropertyBlock) -> Self {
        self.blocks.push(block);
        self
    }

    /// Declares the owner of this record.
    pub fn owned_by(mut self, owner: PropertyOwner) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Finds the block for `key`.
    pub fn block(&self, key: Ref) -> Option<&PropertyBlock> {
        self.blocks.iter().find(|block| block.key == key)
    }
}

impl Record for PropertyRecord {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_ranges_follow_the_type() {
        assert!(PropertyType::Bool.accepts_inline(1));
        assert!(!PropertyType::Bool.accepts_inline(2));
        assert!(PropertyType::Short.accepts_inline(0xFFFF));
        assert!(!PropertyType::Short.accepts_inline(0x1_0000));
        assert!(!PropertyType::Char.accepts_inline(0xD800));
        assert!(PropertyType::Long.accepts_inline(u64::MAX));
    }

    #[test]
    fn only_dynamic_blocks_expose_a_value_record() {
        assert_eq!(PropertyBlock::string(1, 40).value_record(), Some(40));
        assert_eq!(
            PropertyBlock::inline(1, PropertyType::Int, 40).value_record(),
            None
        );
        let unknown = PropertyBlock {
            key: Ref::to(1),
            type_tag: 0x7F,
            value: 0,
        };
        assert_eq!(unknown.kind(), None);
        assert_eq!(unknown.value_record(), None);
    }
}
