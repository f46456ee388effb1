#![forbid(unsafe_code)]

//! Plain snapshots of the fixed-layout records the checker validates.
//!
//! Records carry no behaviour beyond field access and the small codecs needed
//! to interpret variable-length payloads (label arrays and schema rules).
//! Every cross-record reference is a raw [`Ref`](crate::types::Ref) that has to
//! be resolved through a [`RecordAccess`](crate::access::RecordAccess).

mod dynamic;
mod neostore;
mod node;
mod property;
mod relationship;
mod schema;
mod token;

pub use dynamic::{allocate_chain, DynamicRecord, DynamicStore, StoreLayout};
pub use neostore::NeoStoreRecord;
pub use node::{decode_label_array, encode_label_array, LabelField, NodeRecord};
pub use property::{PropertyBlock, PropertyOwner, PropertyRecord, PropertyType};
pub use relationship::RelationshipRecord;
pub use schema::{RuleKind, SchemaRule, SchemaRuleAccess, SchemaRuleError, SchemaRuleKind};
pub use token::{
    Label, LabelTokenRecord, PropertyKey, PropertyKeyTokenRecord, RelationshipType,
    RelationshipTypeTokenRecord, TokenKind, TokenRecord,
};

/// Common surface of every stored record.
pub trait Record: Clone + std::fmt::Debug {
    /// Stable record id.
    fn id(&self) -> u64;

    /// Whether the slot holds a live record.
    fn in_use(&self) -> bool;

    /// The sentinel returned for a slot that holds nothing.
    fn absent(id: u64) -> Self;
}
