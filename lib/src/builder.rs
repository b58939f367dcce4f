use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::encoding::{encode_bytes, sha256};
use crate::ops::ProofOperator;
use crate::types::H256;

// Domain separation for tree nodes
const LEAF_PREFIX: u8 = 0x00;
const INNER_PREFIX: u8 = 0x01;

fn leaf_hash(data: &[u8]) -> H256 {
    let mut buf = Vec::with_capacity(1 + data.len());
    buf.push(LEAF_PREFIX);
    buf.extend_from_slice(data);
    sha256(&buf)
}

fn inner_hash(left: &H256, right: &H256) -> H256 {
    let mut buf = Vec::with_capacity(1 + 64);
    buf.push(INNER_PREFIX);
    buf.extend_from_slice(left);
    buf.extend_from_slice(right);
    sha256(&buf)
}

/// Largest power of two strictly less than `n`. Callers guarantee `n >= 2`.
fn split_point(n: usize) -> usize {
    let mut k = 1;
    while k * 2 < n {
        k *= 2;
    }
    k
}

/// Inclusion proof for a single leaf of a simple Merkle tree.
///
/// `aunts` holds the sibling hashes from the leaf level upward, the root's
/// immediate child last. `make_proof_ops` turns the proof into a program the
/// operator VM can run against the entry's value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleProof {
    pub total: usize,
    pub index: usize,
    pub leaf_hash: H256,
    pub aunts: Vec<H256>,
}

impl SimpleProof {
    /// Build the operator program proving this leaf.
    ///
    /// With a `key`, the program starts with the SimpleKVLeaf block that
    /// reconstructs the key-bound leaf preimage from the raw value. The rest
    /// is the leaf hash step, an assertion pinning the leaf digest, and one
    /// sibling-combine + hash pair per aunt.
    pub fn make_proof_ops(&self, key: Option<&[u8]>) -> Vec<ProofOperator> {
        let mut ops = Vec::with_capacity(8 + 2 * self.aunts.len());
        if let Some(key) = key {
            ops.push(ProofOperator::Sha256);
            ops.push(ProofOperator::PrependLength);
            ops.push(ProofOperator::LiftKey { key: key.to_vec() });
            ops.push(ProofOperator::PrependLength);
            ops.push(ProofOperator::Concat { begin: 0, end: 2 });
        }
        ops.push(ProofOperator::Append {
            prefix: vec![LEAF_PREFIX],
            suffix: Vec::new(),
        });
        ops.push(ProofOperator::Sha256);
        ops.push(ProofOperator::AssertValues {
            values: vec![self.leaf_hash.to_vec()],
        });
        climb_ops(self.index, self.total, &self.aunts, &mut ops);
        ops
    }
}

/// Emit the sibling-combine + hash pairs for one root-ward climb,
/// bottom level first.
fn climb_ops(index: usize, total: usize, aunts: &[H256], ops: &mut Vec<ProofOperator>) {
    if total <= 1 {
        return;
    }
    let Some((aunt, below)) = aunts.split_last() else {
        return;
    };
    let k = split_point(total);
    if index < k {
        climb_ops(index, k, below, ops);
        // sibling subtree on the right
        ops.push(ProofOperator::Append {
            prefix: vec![INNER_PREFIX],
            suffix: aunt.to_vec(),
        });
    } else {
        climb_ops(index - k, total - k, below, ops);
        // sibling subtree on the left
        let mut prefix = Vec::with_capacity(1 + aunt.len());
        prefix.push(INNER_PREFIX);
        prefix.extend_from_slice(aunt);
        ops.push(ProofOperator::Append {
            prefix,
            suffix: Vec::new(),
        });
    }
    ops.push(ProofOperator::Sha256);
}

/// Hash the tree over `items` and collect each leaf's aunts on the way up.
fn proofs_from_leaves(items: &[Vec<u8>]) -> (H256, Vec<Vec<H256>>) {
    match items.len() {
        0 => (sha256(&[]), Vec::new()),
        1 => (leaf_hash(&items[0]), vec![Vec::new()]),
        n => {
            let k = split_point(n);
            let (left_root, mut left_aunts) = proofs_from_leaves(&items[..k]);
            let (right_root, mut right_aunts) = proofs_from_leaves(&items[k..]);
            for aunts in &mut left_aunts {
                aunts.push(right_root);
            }
            for aunts in &mut right_aunts {
                aunts.push(left_root);
            }
            left_aunts.extend(right_aunts);
            (inner_hash(&left_root, &right_root), left_aunts)
        }
    }
}

fn proofs_from_leaf_bytes(items: &[Vec<u8>]) -> (H256, Vec<SimpleProof>) {
    let total = items.len();
    let (root, all_aunts) = proofs_from_leaves(items);
    let proofs = all_aunts
        .into_iter()
        .enumerate()
        .map(|(index, aunts)| SimpleProof {
            total,
            index,
            leaf_hash: leaf_hash(&items[index]),
            aunts,
        })
        .collect();
    (root, proofs)
}

/// Build a simple Merkle tree over raw byte slices, in order.
///
/// Returns the root and one proof per item; run the proof's operators
/// (`make_proof_ops(None)`) against the item to re-derive the root.
pub fn simple_proofs_from_byte_slices(items: &[Vec<u8>]) -> (H256, Vec<SimpleProof>) {
    proofs_from_leaf_bytes(items)
}

/// Build a simple Merkle tree over a map, keys in sorted order.
///
/// Each entry is leafed as `bytes(key) || bytes(sha256(value))`, the
/// preimage the SimpleKVLeaf operator block reconstructs. Proofs are keyed
/// by the entry's key; run `make_proof_ops(Some(key))` against the raw
/// value.
pub fn simple_proofs_from_map(
    map: &BTreeMap<String, Vec<u8>>,
) -> (H256, BTreeMap<String, SimpleProof>) {
    let leaves: Vec<Vec<u8>> = map
        .iter()
        .map(|(key, value)| {
            let mut leaf = encode_bytes(key.as_bytes());
            leaf.extend_from_slice(&encode_bytes(&sha256(value)));
            leaf
        })
        .collect();
    let (root, proofs) = proofs_from_leaf_bytes(&leaves);
    let proofs = map
        .keys()
        .cloned()
        .zip(proofs)
        .collect();
    (root, proofs)
}
