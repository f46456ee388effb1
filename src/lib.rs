//! Record-level consistency checking for a property-graph record store.
//!
//! The [`check`] module holds one checker per record kind; [`full`] drives
//! them over a whole store or over a change set.

#![warn(missing_docs)]

pub mod access;
pub mod check;
pub mod full;
pub mod options;
pub mod record;
pub mod types;

pub use access::{DiffRecordAccess, DiffStore, RecordAccess, RecordChange, StoreAccess};
pub use full::{ConsistencySummary, FullCheck};
pub use options::CheckOptions;
pub use types::{CheckError, RecordType, Ref, Result};
