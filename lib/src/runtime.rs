use std::collections::HashMap;

use crate::encoding::{decode_bytes, decode_uvarint};
use crate::error::ProofError;
use crate::ops::{
    Arity, ProofOperator, OP_TYPE_APPEND, OP_TYPE_APPLY, OP_TYPE_ASSERT_VALUES, OP_TYPE_CONCAT,
    OP_TYPE_LIFT_KEY, OP_TYPE_PREPEND_LENGTH, OP_TYPE_SHA256,
};
use crate::types::{Proof, ProofOp};

/// Reconstructs an operator from its wire record. Decoders receive the
/// runtime so `apply` can decode its children recursively.
pub type OpDecoder = fn(&ProofRuntime, &ProofOp) -> Result<ProofOperator, ProofError>;

/// Registry mapping wire type tags to operator decoders.
///
/// A runtime is populated once and immutable afterwards; verifications may
/// share one runtime freely, and callers needing isolation can build their
/// own with [`ProofRuntime::new`].
pub struct ProofRuntime {
    decoders: HashMap<String, OpDecoder>,
}

impl ProofRuntime {
    /// An empty runtime with no registered decoders.
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    pub fn register(&mut self, op_type: &str, decoder: OpDecoder) {
        self.decoders.insert(op_type.to_string(), decoder);
    }

    /// Decode a single wire operator via the registry.
    pub fn decode(&self, op: &ProofOp) -> Result<ProofOperator, ProofError> {
        match self.decoders.get(&op.op_type) {
            Some(decoder) => decoder(self, op),
            None => Err(ProofError::UnknownOpType {
                op_type: op.op_type.clone(),
            }),
        }
    }

    /// Decode every operator in a wire proof, in order.
    pub fn decode_proof(&self, proof: &Proof) -> Result<Vec<ProofOperator>, ProofError> {
        proof.ops.iter().map(|op| self.decode(op)).collect()
    }
}

impl Default for ProofRuntime {
    /// The standard runtime: all seven operator types registered.
    fn default() -> Self {
        let mut prt = Self::new();
        prt.register(OP_TYPE_APPEND, decode_append);
        prt.register(OP_TYPE_SHA256, decode_sha256);
        prt.register(OP_TYPE_PREPEND_LENGTH, decode_prepend_length);
        prt.register(OP_TYPE_LIFT_KEY, decode_lift_key);
        prt.register(OP_TYPE_CONCAT, decode_concat);
        prt.register(OP_TYPE_ASSERT_VALUES, decode_assert_values);
        prt.register(OP_TYPE_APPLY, decode_apply);
        prt
    }
}

fn expect_consumed(op_type: &'static str, rest: &[u8]) -> Result<(), ProofError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(ProofError::malformed(op_type, "trailing bytes after payload"))
    }
}

fn decode_append(_prt: &ProofRuntime, op: &ProofOp) -> Result<ProofOperator, ProofError> {
    let bz = op.data.as_slice();
    let (prefix, n) =
        decode_bytes(bz).map_err(|e| ProofError::malformed(OP_TYPE_APPEND, e))?;
    let bz = &bz[n..];
    let (suffix, n) =
        decode_bytes(bz).map_err(|e| ProofError::malformed(OP_TYPE_APPEND, e))?;
    expect_consumed(OP_TYPE_APPEND, &bz[n..])?;
    Ok(ProofOperator::Append { prefix, suffix })
}

fn decode_sha256(_prt: &ProofRuntime, op: &ProofOp) -> Result<ProofOperator, ProofError> {
    expect_consumed(OP_TYPE_SHA256, &op.data)?;
    Ok(ProofOperator::Sha256)
}

fn decode_prepend_length(_prt: &ProofRuntime, op: &ProofOp) -> Result<ProofOperator, ProofError> {
    expect_consumed(OP_TYPE_PREPEND_LENGTH, &op.data)?;
    Ok(ProofOperator::PrependLength)
}

fn decode_lift_key(_prt: &ProofRuntime, op: &ProofOp) -> Result<ProofOperator, ProofError> {
    // the key travels in the wire key field, not the payload
    expect_consumed(OP_TYPE_LIFT_KEY, &op.data)?;
    Ok(ProofOperator::LiftKey {
        key: op.key.clone(),
    })
}

fn decode_concat(_prt: &ProofRuntime, op: &ProofOp) -> Result<ProofOperator, ProofError> {
    let bz = op.data.as_slice();
    let (begin, n) =
        decode_uvarint(bz).map_err(|e| ProofError::malformed(OP_TYPE_CONCAT, e))?;
    let bz = &bz[n..];
    let (end, n) =
        decode_uvarint(bz).map_err(|e| ProofError::malformed(OP_TYPE_CONCAT, e))?;
    expect_consumed(OP_TYPE_CONCAT, &bz[n..])?;
    if begin > end {
        return Err(ProofError::malformed(OP_TYPE_CONCAT, "begin exceeds end"));
    }
    Ok(ProofOperator::Concat {
        begin: begin as usize,
        end: end as usize,
    })
}

fn decode_assert_values(_prt: &ProofRuntime, op: &ProofOp) -> Result<ProofOperator, ProofError> {
    let mut bz = op.data.as_slice();
    let (count, n) =
        decode_uvarint(bz).map_err(|e| ProofError::malformed(OP_TYPE_ASSERT_VALUES, e))?;
    bz = &bz[n..];
    let mut values = Vec::new();
    for _ in 0..count {
        let (value, n) =
            decode_bytes(bz).map_err(|e| ProofError::malformed(OP_TYPE_ASSERT_VALUES, e))?;
        values.push(value);
        bz = &bz[n..];
    }
    expect_consumed(OP_TYPE_ASSERT_VALUES, bz)?;
    Ok(ProofOperator::AssertValues { values })
}

fn decode_apply(prt: &ProofRuntime, op: &ProofOp) -> Result<ProofOperator, ProofError> {
    let mut bz = op.data.as_slice();
    let (count, n) =
        decode_uvarint(bz).map_err(|e| ProofError::malformed(OP_TYPE_APPLY, e))?;
    bz = &bz[n..];
    let mut ops = Vec::new();
    for _ in 0..count {
        let (op_type, n) =
            decode_bytes(bz).map_err(|e| ProofError::malformed(OP_TYPE_APPLY, e))?;
        bz = &bz[n..];
        let (key, n) =
            decode_bytes(bz).map_err(|e| ProofError::malformed(OP_TYPE_APPLY, e))?;
        bz = &bz[n..];
        let (data, n) =
            decode_bytes(bz).map_err(|e| ProofError::malformed(OP_TYPE_APPLY, e))?;
        bz = &bz[n..];

        let op_type = String::from_utf8(op_type)
            .map_err(|_| ProofError::malformed(OP_TYPE_APPLY, "child type is not utf-8"))?;
        let child = prt.decode(&ProofOp { op_type, key, data })?;
        if child.argn() == Arity::Variable {
            return Err(ProofError::malformed(
                OP_TYPE_APPLY,
                "variable-arity child operator",
            ));
        }
        ops.push(child);
    }
    expect_consumed(OP_TYPE_APPLY, bz)?;
    Ok(ProofOperator::Apply { ops })
}
