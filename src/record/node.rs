use smallvec::SmallVec;

use crate::types::Ref;

use super::Record;

const LABEL_WIDTH: usize = 8;

/// Where a node keeps its label ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LabelField {
    /// Small label sets stored in the node record itself.
    Inline(SmallVec<[u32; 4]>),
    /// Pointer to the first block of a chain in the node label store.
    Dynamic(Ref),
}

impl Default for LabelField {
    fn default() -> Self {
        LabelField::Inline(SmallVec::new())
    }
}

/// A node store record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeRecord {
    /// Node id.
    pub id: u64,
    /// Whether the node exists.
    pub in_use: bool,
    /// Head of the relationship chain.
    pub next_rel: Ref,
    /// Head of the property chain.
    pub next_prop: Ref,
    /// Labels, inline or in the label store.
    pub labels: LabelField,
}

impl NodeRecord {
    /// Creates an in-use node with the given chain heads and no labels.
    pub fn new(id: u64, next_rel: Ref, next_prop: Ref) -> Self {
        Self {
            id,
            in_use: true,
            next_rel,
            next_prop,
            labels: LabelField::default(),
        }
    }

    /// Replaces the label field with an inline set, kept in the given order.
    pub fn with_inline_labels(mut self, labels: &[u32]) -> Self {
        self.labels = LabelField::Inline(labels.iter().copied().collect());
        self
    }

    /// Points the label field at a dynamic label chain.
    pub fn with_dynamic_labels(mut self, first_block: u64) -> Self {
        self.labels = LabelField::Dynamic(Ref::to(first_block));
        self
    }
}

impl Record for NodeRecord {
    fn id(&self) -> u64 {
        self.id
    }

    fn in_use(&self) -> bool {
        self.in_use
    }

    fn absent(id: u64) -> Self {
        Self {
            in_use: false,
            ..Self::new(id, Ref::NONE, Ref::NONE)
        }
    }
}

/// Encodes label ids as the payload of a dynamic label chain.
pub fn encode_label_array(labels: &[u32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(labels.len() * LABEL_WIDTH);
    for label in labels {
        buf.extend_from_slice(&u64::from(*label).to_le_bytes());
    }
    buf
}

/// Decodes a dynamic label payload, `None` when it is not a whole number of
/// label slots or a slot overflows the label id space.
pub fn decode_label_array(bytes: &[u8]) -> Option<Vec<u32>> {
    if bytes.len() % LABEL_WIDTH != 0 {
        return None;
    }
    bytes
        .chunks_exact(LABEL_WIDTH)
        .map(|chunk| {
            let mut arr = [0u8; LABEL_WIDTH];
            arr.copy_from_slice(chunk);
            u32::try_from(u64::from_le_bytes(arr)).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_array_roundtrip_keeps_order() {
        let bytes = encode_label_array(&[7, 3, 9]);
        assert_eq!(bytes.len(), 24);
        assert_eq!(decode_label_array(&bytes), Some(vec![7, 3, 9]));
    }

    #[test]
    fn label_array_rejects_partial_slots() {
        let mut bytes = encode_label_array(&[1]);
        bytes.push(0);
        assert_eq!(decode_label_array(&bytes), None);
    }

    #[test]
    fn label_array_rejects_out_of_range_ids() {
        let bytes = (u64::from(u32::MAX) + 1).to_le_bytes();
        assert_eq!(decode_label_array(&bytes), None);
    }
}
