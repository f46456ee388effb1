#![forbid(unsafe_code)]

//! Scan configuration, loadable from TOML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::record::{DynamicStore, StoreLayout};
use crate::types::{CheckError, Result};

const DEFAULT_HEADER: usize = 8;
const DEFAULT_MAX_FINDINGS: usize = 32;

/// Record geometry of every dynamic store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreLayouts {
    /// String value blocks.
    pub string: StoreLayout,
    /// Array value blocks.
    pub array: StoreLayout,
    /// Dynamic node label blocks.
    pub node_labels: StoreLayout,
    /// Schema rule blocks.
    pub schema: StoreLayout,
    /// Token name blocks, shared by all three token stores.
    pub token_names: StoreLayout,
}

impl Default for StoreLayouts {
    fn default() -> Self {
        Self {
            string: StoreLayout::new(128, DEFAULT_HEADER),
            array: StoreLayout::new(128, DEFAULT_HEADER),
            node_labels: StoreLayout::new(64, DEFAULT_HEADER),
            schema: StoreLayout::new(64, DEFAULT_HEADER),
            token_names: StoreLayout::new(38, DEFAULT_HEADER),
        }
    }
}

impl StoreLayouts {
    /// Layout of `store`.
    pub fn get(&self, store: DynamicStore) -> StoreLayout {
        match store {
            DynamicStore::String => self.string,
            DynamicStore::Array => self.array,
            DynamicStore::NodeLabels => self.node_labels,
            DynamicStore::Schema => self.schema,
            DynamicStore::LabelName
            | DynamicStore::PropertyKeyName
            | DynamicStore::RelationshipTypeName => self.token_names,
        }
    }

    /// Validates every layout.
    pub fn validate(&self) -> Result<()> {
        self.string.validate("string")?;
        self.array.validate("array")?;
        self.node_labels.validate("node_labels")?;
        self.schema.validate("schema")?;
        self.token_names.validate("token_names")
    }
}

/// Options for a consistency scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckOptions {
    /// Whether to track property chain ownership across the scan.
    pub owner_check: bool,
    /// Number of findings kept verbatim in the summary.
    pub max_findings: usize,
    /// Record geometry of the dynamic stores, applied by
    /// [`StoreAccess::new`](crate::StoreAccess::new). Scans read capacity
    /// from the store itself and only warn when it differs.
    pub layouts: StoreLayouts,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            owner_check: true,
            max_findings: DEFAULT_MAX_FINDINGS,
            layouts: StoreLayouts::default(),
        }
    }
}

impl CheckOptions {
    /// Enables or disables the property ownership check.
    pub fn owner_check(mut self, enabled: bool) -> Self {
        self.owner_check = enabled;
        self
    }

    /// Sets how many findings the summary keeps.
    pub fn max_findings(mut self, max: usize) -> Self {
        self.max_findings = max;
        self
    }

    /// Replaces the store layouts.
    pub fn layouts(mut self, layouts: StoreLayouts) -> Self {
        self.layouts = layouts;
        self
    }

    /// Parses and validates options from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        parse(text, PathBuf::from("<inline>"))
    }

    /// Reads, parses and validates options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CheckError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&contents, path.to_path_buf())
    }
}

fn parse(text: &str, path: PathBuf) -> Result<CheckOptions> {
    let options: CheckOptions =
        toml::from_str(text).map_err(|source| CheckError::Parse { path, source })?;
    options.layouts.validate()?;
    Ok(options)
}
