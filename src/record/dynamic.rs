use serde::{Deserialize, Serialize};

use crate::types::{CheckError, RecordType, Ref, Result};

use super::Record;

/// The dynamic (overflow) stores.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DynamicStore {
    /// String property values.
    String,
    /// Array property values.
    Array,
    /// Node label arrays too large to inline.
    NodeLabels,
    /// Serialized schema rules.
    Schema,
    /// Label token names.
    LabelName,
    /// Property key token names.
    PropertyKeyName,
    /// Relationship type token names.
    RelationshipTypeName,
}

impl DynamicStore {
    /// Every dynamic store, in scan order.
    pub const ALL: [DynamicStore; 7] = [
        DynamicStore::String,
        DynamicStore::Array,
        DynamicStore::NodeLabels,
        DynamicStore::Schema,
        DynamicStore::LabelName,
        DynamicStore::PropertyKeyName,
        DynamicStore::RelationshipTypeName,
    ];

    /// Record type used when bucketing findings for blocks of this store.
    pub const fn record_type(self) -> RecordType {
        match self {
            DynamicStore::String => RecordType::StringProperty,
            DynamicStore::Array => RecordType::ArrayProperty,
            DynamicStore::NodeLabels => RecordType::NodeDynamicLabel,
            DynamicStore::Schema => RecordType::Schema,
            DynamicStore::LabelName => RecordType::LabelName,
            DynamicStore::PropertyKeyName => RecordType::PropertyKeyName,
            DynamicStore::RelationshipTypeName => RecordType::RelationshipTypeName,
        }
    }

    /// Short store name used in logs and errors.
    pub const fn name(self) -> &'static str {
        match self {
            DynamicStore::String => "string",
            DynamicStore::Array => "array",
            DynamicStore::NodeLabels => "node_labels",
            DynamicStore::Schema => "schema",
            DynamicStore::LabelName => "label_name",
            DynamicStore::PropertyKeyName => "property_key_name",
            DynamicStore::RelationshipTypeName => "relationship_type_name",
        }
    }
}

/// Physical record geometry of a store.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLayout {
    /// Bytes per record slot, header included.
    pub record_size: usize,
    /// Bytes of per-record header.
    pub header_size: usize,
}

impl StoreLayout {
    /// Creates a layout.
    pub const fn new(record_size: usize, header_size: usize) -> Self {
        Self {
            record_size,
            header_size,
        }
    }

    /// Payload capacity of one block; a block holding this many bytes is full.
    pub const fn data_size(&self) -> usize {
        self.record_size.saturating_sub(self.header_size)
    }

    /// Rejects layouts whose header leaves no payload room.
    pub fn validate(&self, store: &'static str) -> Result<()> {
        if self.header_size >= self.record_size {
            return Err(CheckError::InvalidLayout {
                store,
                record_size: self.record_size,
                header_size: self.header_size,
            });
        }
        Ok(())
    }
}

/// One block of a dynamic chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynamicRecord {
    /// Block id within its store.
    pub id: u64,
    /// Whether the block is allocated.
    pub in_use: bool,
    /// Whether this block starts a chain.
    pub start_record: bool,
    /// Declared payload length. Kept separate from `data` so corrupt lengths
    /// stay observable.
    pub length: i32,
    /// Raw payload bytes.
    pub data: Vec<u8>,
    /// Next block of the chain.
    pub next_block: Ref,
}

impl DynamicRecord {
    /// An in-use, chain-terminal start block holding `data`.
    pub fn with_data(id: u64, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        Self {
            id,
            in_use: true,
            start_record: true,
            length: i32::try_from(data.len()).unwrap_or(i32::MAX),
            data,
            next_block: Ref::NONE,
        }
    }

    /// Links this block to `next`.
    pub fn with_next(mut self, next: u64) -> Self {
        self.next_block = Ref::to(next);
        self
    }

    /// Payload bytes within the declared length.
    pub fn payload(&self) -> &[u8] {
        let len = usize::try_from(self.length).unwrap_or(0).min(self.data.len());
        &self.data[..len]
    }
}

impl Record for DynamicRecord {
    fn id(&self) -> u64 {
        self.id
    }

    fn in_use(&self) -> bool {
        self.in_use
    }

    fn absent(id: u64) -> Self {
        Self {
            in_use: false,
            start_record: false,
            ..Self::with_data(id, Vec::new())
        }
    }
}

/// Splits `bytes` into a chain of blocks with consecutive ids starting at
/// `first_id`, each holding at most `capacity` bytes.
///
/// An empty payload still yields a single (empty) start block.
pub fn allocate_chain(first_id: u64, bytes: &[u8], capacity: usize) -> Vec<DynamicRecord> {
    let capacity = capacity.max(1);
    if bytes.is_empty() {
        return vec![DynamicRecord::with_data(first_id, Vec::new())];
    }
    let chunks: Vec<&[u8]> = bytes.chunks(capacity).collect();
    let last = chunks.len() - 1;
    chunks
        .into_iter()
        .enumerate()
        .map(|(idx, chunk)| {
            let id = first_id + idx as u64;
            let mut record = DynamicRecord::with_data(id, chunk.to_vec());
            record.start_record = idx == 0;
            if idx < last {
                record.next_block = Ref::to(id + 1);
            }
            record
        })
        .collect()
}
