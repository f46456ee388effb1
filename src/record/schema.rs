use thiserror::Error;

const KIND_INDEX: u8 = 1;
const KIND_CONSTRAINT_INDEX: u8 = 2;
const KIND_UNIQUENESS: u8 = 3;

const HEADER_LEN: usize = 1 + 4 + 4;
const REF_LEN: usize = 8;
const NO_OWNER: i64 = -1;

/// Errors raised while decoding schema rule bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaRuleError {
    /// The payload is truncated or carries trailing bytes.
    #[error("malformed schema rule: {0}")]
    Malformed(&'static str),
    /// The kind byte names no known rule kind.
    #[error("unsupported schema rule kind {0}")]
    UnsupportedKind(u8),
    /// The rule's dynamic chain loops back on itself.
    #[error("schema rule chain revisits block {0}")]
    ChainCycle(u64),
}

/// Rule kind without its payload, used to name an expected counterpart.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// A plain index.
    Index,
    /// An index backing a uniqueness constraint.
    ConstraintIndexRule,
    /// A uniqueness constraint.
    UniquenessConstraint,
}

/// Kind-specific payload of a schema rule.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SchemaRuleKind {
    /// A plain index.
    Index,
    /// An index created for a constraint.
    ConstraintIndex {
        /// Owning constraint rule, `None` when created standalone.
        owning_constraint: Option<u64>,
    },
    /// A uniqueness constraint.
    UniquenessConstraint {
        /// The index rule that backs it.
        owned_index: u64,
    },
}

impl SchemaRuleKind {
    /// Payload-free kind.
    pub fn rule_kind(&self) -> RuleKind {
        match self {
            SchemaRuleKind::Index => RuleKind::Index,
            SchemaRuleKind::ConstraintIndex { .. } => RuleKind::ConstraintIndexRule,
            SchemaRuleKind::UniquenessConstraint { .. } => RuleKind::UniquenessConstraint,
        }
    }

    /// Whether the rule is an index of either flavour.
    pub fn is_index(&self) -> bool {
        !matches!(self, SchemaRuleKind::UniquenessConstraint { .. })
    }
}

/// A decoded schema rule. `id` is the first block of its schema chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SchemaRule {
    /// First schema block of the rule.
    pub id: u64,
    /// Label token the rule applies to.
    pub label: u32,
    /// Property key token the rule applies to.
    pub property_key: u32,
    /// Kind and kind-specific payload.
    pub kind: SchemaRuleKind,
}

impl SchemaRule {
    /// A plain index on `(label, property_key)`.
    pub fn index(id: u64, label: u32, property_key: u32) -> Self {
        Self {
            id,
            label,
            property_key,
            kind: SchemaRuleKind::Index,
        }
    }

    /// An index owned by `owning_constraint`, or standalone when `None`.
    pub fn constraint_index(
        id: u64,
        label: u32,
        property_key: u32,
        owning_constraint: Option<u64>,
    ) -> Self {
        Self {
            id,
            label,
            property_key,
            kind: SchemaRuleKind::ConstraintIndex { owning_constraint },
        }
    }

    /// A uniqueness constraint backed by `owned_index`.
    pub fn uniqueness_constraint(id: u64, label: u32, property_key: u32, owned_index: u64) -> Self {
        Self {
            id,
            label,
            property_key,
            kind: SchemaRuleKind::UniquenessConstraint { owned_index },
        }
    }

    /// Serializes the rule body. The id is implied by where the bytes live.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + REF_LEN);
        let (tag, reference) = match self.kind {
            SchemaRuleKind::Index => (KIND_INDEX, None),
            SchemaRuleKind::ConstraintIndex { owning_constraint } => (
                KIND_CONSTRAINT_INDEX,
                Some(owning_constraint.map_or(NO_OWNER, |id| id as i64)),
            ),
            SchemaRuleKind::UniquenessConstraint { owned_index } => {
                (KIND_UNIQUENESS, Some(owned_index as i64))
            }
        };
        buf.push(tag);
        buf.extend_from_slice(&self.label.to_be_bytes());
        buf.extend_from_slice(&self.property_key.to_be_bytes());
        if let Some(reference) = reference {
            buf.extend_from_slice(&reference.to_be_bytes());
        }
        buf
    }

    /// Parses a rule body stored at chain `id`.
    pub fn decode(id: u64, bytes: &[u8]) -> Result<Self, SchemaRuleError> {
        if bytes.len() < HEADER_LEN {
            return Err(SchemaRuleError::Malformed("truncated header"));
        }
        let tag = bytes[0];
        let label = read_u32(&bytes[1..5]);
        let property_key = read_u32(&bytes[5..9]);
        let rest = &bytes[HEADER_LEN..];
        let kind = match tag {
            KIND_INDEX => {
                expect_len(rest, 0)?;
                SchemaRuleKind::Index
            }
            KIND_CONSTRAINT_INDEX => {
                expect_len(rest, REF_LEN)?;
                let owning_constraint = match read_i64(rest) {
                    NO_OWNER => None,
                    owner => Some(
                        u64::try_from(owner)
                            .map_err(|_| SchemaRuleError::Malformed("negative owning constraint"))?,
                    ),
                };
                SchemaRuleKind::ConstraintIndex { owning_constraint }
            }
            KIND_UNIQUENESS => {
                expect_len(rest, REF_LEN)?;
                let owned = u64::try_from(read_i64(rest))
                    .map_err(|_| SchemaRuleError::Malformed("negative owned index"))?;
                SchemaRuleKind::UniquenessConstraint { owned_index: owned }
            }
            other => return Err(SchemaRuleError::UnsupportedKind(other)),
        };
        Ok(Self {
            id,
            label,
            property_key,
            kind,
        })
    }
}

fn expect_len(rest: &[u8], len: usize) -> Result<(), SchemaRuleError> {
    match rest.len().cmp(&len) {
        std::cmp::Ordering::Less => Err(SchemaRuleError::Malformed("truncated body")),
        std::cmp::Ordering::Greater => Err(SchemaRuleError::Malformed("trailing bytes")),
        std::cmp::Ordering::Equal => Ok(()),
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut arr = [0u8; 4];
    arr.copy_from_slice(&bytes[..4]);
    u32::from_be_bytes(arr)
}

fn read_i64(bytes: &[u8]) -> i64 {
    let mut arr = [0u8; 8];
    arr.copy_from_slice(&bytes[..8]);
    i64::from_be_bytes(arr)
}

/// Loads schema rules by the id of their first schema block.
pub trait SchemaRuleAccess {
    /// Decodes the rule whose chain starts at `id`.
    fn load_rule(&self, id: u64) -> Result<SchemaRule, SchemaRuleError>;
}
