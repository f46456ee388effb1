#![forbid(unsafe_code)]

//! Shared identifiers, pointer encoding and error types.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::record::SchemaRuleError;

/// Raw record reference as stored in a pointer field.
///
/// Pointer fields are signed on disk: [`Ref::NONE`] marks an empty pointer and
/// no negative value ever addresses a record.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Ref(pub i64);

impl Ref {
    /// The empty pointer.
    pub const NONE: Ref = Ref(-1);

    /// Raw value standing in for ids a pointer field cannot hold.
    const UNREPRESENTABLE: i64 = i64::MIN;

    /// Builds a pointer addressing record `id`.
    ///
    /// Ids above `i64::MAX` do not fit a pointer field and yield a corrupt
    /// pointer, never [`Ref::NONE`].
    pub const fn to(id: u64) -> Self {
        if id > i64::MAX as u64 {
            Ref(Self::UNREPRESENTABLE)
        } else {
            Ref(id as i64)
        }
    }

    /// Returns the addressed id, or `None` when the pointer is negative.
    ///
    /// Corrupt values read as empty here; checks that follow a pointer use
    /// [`Ref::resolve`] instead.
    pub const fn get(self) -> Option<u64> {
        if self.0 < 0 {
            None
        } else {
            Some(self.0 as u64)
        }
    }

    /// Splits a pointer into empty (`Ok(None)`), an address
    /// (`Ok(Some(id))`) or a corrupt raw value (`Err(raw)`).
    pub const fn resolve(self) -> std::result::Result<Option<u64>, i64> {
        if self.0 >= 0 {
            Ok(Some(self.0 as u64))
        } else if self.is_none() {
            Ok(None)
        } else {
            Err(self.0)
        }
    }

    /// Whether this pointer is exactly the empty sentinel.
    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }

    /// Whether this pointer addresses record `id`.
    pub const fn points_to(self, id: u64) -> bool {
        self.0 >= 0 && self.0 as u64 == id
    }
}

impl Default for Ref {
    fn default() -> Self {
        Ref::NONE
    }
}

impl TryFrom<u64> for Ref {
    type Error = std::num::TryFromIntError;

    fn try_from(id: u64) -> std::result::Result<Self, Self::Error> {
        i64::try_from(id).map(Ref)
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("NONE")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// The record kinds a scan visits, used to bucket findings.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    /// Node store records.
    Node,
    /// Relationship store records.
    Relationship,
    /// Property store records.
    Property,
    /// Blocks of the string value store.
    StringProperty,
    /// Blocks of the array value store.
    ArrayProperty,
    /// Blocks of the dynamic node label store.
    NodeDynamicLabel,
    /// Schema rule chains.
    Schema,
    /// Label token records.
    LabelToken,
    /// Property key token records.
    PropertyKeyToken,
    /// Relationship type token records.
    RelationshipTypeToken,
    /// Blocks holding label token names.
    LabelName,
    /// Blocks holding property key token names.
    PropertyKeyName,
    /// Blocks holding relationship type token names.
    RelationshipTypeName,
    /// The graph-global record.
    NeoStore,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordType::Node => "node",
            RecordType::Relationship => "relationship",
            RecordType::Property => "property",
            RecordType::StringProperty => "string_property",
            RecordType::ArrayProperty => "array_property",
            RecordType::NodeDynamicLabel => "node_dynamic_label",
            RecordType::Schema => "schema",
            RecordType::LabelToken => "label_token",
            RecordType::PropertyKeyToken => "property_key_token",
            RecordType::RelationshipTypeToken => "relationship_type_token",
            RecordType::LabelName => "label_name",
            RecordType::PropertyKeyName => "property_key_name",
            RecordType::RelationshipTypeName => "relationship_type_name",
            RecordType::NeoStore => "neo_store",
        };
        f.write_str(name)
    }
}

/// Errors raised while setting up a check. Inconsistencies are never errors.
#[derive(Debug, Error)]
pub enum CheckError {
    /// Configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Configuration could not be parsed.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// File that was being parsed, `<inline>` for string input.
        path: PathBuf,
        /// Underlying TOML failure.
        #[source]
        source: toml::de::Error,
    },
    /// A store layout whose header leaves no room for data.
    #[error("invalid layout for {store}: header {header_size} >= record {record_size}")]
    InvalidLayout {
        /// Name of the offending store.
        store: &'static str,
        /// Configured record size.
        record_size: usize,
        /// Configured header size.
        header_size: usize,
    },
    /// A schema rule could not be decoded.
    #[error(transparent)]
    Schema(#[from] SchemaRuleError),
}

/// Result alias used by setup paths.
pub type Result<T> = std::result::Result<T, CheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_refs_address_nothing() {
        assert_eq!(Ref::NONE.get(), None);
        assert_eq!(Ref(-7).get(), None);
        assert!(!Ref(-7).is_none());
        assert_eq!(Ref::to(9).get(), Some(9));
        assert!(Ref::to(9).points_to(9));
        assert!(!Ref::NONE.points_to(0));
    }

    #[test]
    fn resolve_separates_empty_from_corrupt() {
        assert_eq!(Ref::NONE.resolve(), Ok(None));
        assert_eq!(Ref::to(0).resolve(), Ok(Some(0)));
        assert_eq!(Ref(-5).resolve(), Err(-5));
        assert_eq!(Ref(i64::MIN).resolve(), Err(i64::MIN));
    }

    #[test]
    fn ids_beyond_the_pointer_range_never_become_none() {
        assert!(!Ref::to(u64::MAX).is_none());
        assert!(Ref::to(u64::MAX).resolve().is_err());
        assert_eq!(Ref::to(i64::MAX as u64).get(), Some(i64::MAX as u64));
        assert!(Ref::try_from(u64::MAX).is_err());
        assert_eq!(Ref::try_from(7u64), Ok(Ref::to(7)));
    }

    #[test]
    fn ref_display_names_the_sentinel() {
        assert_eq!(Ref::NONE.to_string(), "NONE");
        assert_eq!(Ref::to(3).to_string(), "3");
    }
}
