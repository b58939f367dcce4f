use std::collections::HashSet;

use crate::encoding::{encode_bytes, sha256, write_bytes, write_uvarint};
use crate::error::ProofError;
use crate::types::ProofOp;

pub const OP_TYPE_APPEND: &str = "append";
pub const OP_TYPE_SHA256: &str = "sha256";
pub const OP_TYPE_PREPEND_LENGTH: &str = "prepend_length";
pub const OP_TYPE_LIFT_KEY: &str = "lift_key";
pub const OP_TYPE_CONCAT: &str = "concat";
pub const OP_TYPE_ASSERT_VALUES: &str = "assert_values";
pub const OP_TYPE_APPLY: &str = "apply";

/// Declared arity of a proof operator.
///
/// `Exact(n)` operators are handed exactly the top `n` stack elements;
/// `Variable` operators receive the whole stack and replace it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Variable,
}

/// A proof operator: a pure function over a stack of byte strings.
///
/// A program (an ordered sequence of operators) run against an input value
/// derives a candidate root hash; see [`run_ops`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProofOperator {
    /// Pop `v`, push `SHA256(v)`
    Sha256,
    /// Pop `v`, push `uvarint(len(v)) || v`
    PrependLength,
    /// Pop `v`, push `prefix || v || suffix`
    Append { prefix: Vec<u8>, suffix: Vec<u8> },
    /// Push `key` on top of the whole stack
    LiftKey { key: Vec<u8> },
    /// Join the stack elements in `begin..end` into a single element
    Concat { begin: usize, end: usize },
    /// Pass the stack through unchanged iff every element is accepted
    AssertValues { values: Vec<Vec<u8>> },
    /// Splice a sub-program, threading child arities over the stack
    Apply { ops: Vec<ProofOperator> },
}

impl ProofOperator {
    /// Stable type tag used in wire form and the grammar.
    pub fn op_type(&self) -> &'static str {
        match self {
            ProofOperator::Sha256 => OP_TYPE_SHA256,
            ProofOperator::PrependLength => OP_TYPE_PREPEND_LENGTH,
            ProofOperator::Append { .. } => OP_TYPE_APPEND,
            ProofOperator::LiftKey { .. } => OP_TYPE_LIFT_KEY,
            ProofOperator::Concat { .. } => OP_TYPE_CONCAT,
            ProofOperator::AssertValues { .. } => OP_TYPE_ASSERT_VALUES,
            ProofOperator::Apply { .. } => OP_TYPE_APPLY,
        }
    }

    pub fn argn(&self) -> Arity {
        match self {
            ProofOperator::Sha256 => Arity::Exact(1),
            ProofOperator::PrependLength => Arity::Exact(1),
            ProofOperator::Append { .. } => Arity::Exact(1),
            ProofOperator::LiftKey { .. } => Arity::Variable,
            ProofOperator::Concat { .. } => Arity::Variable,
            ProofOperator::AssertValues { .. } => Arity::Variable,
            ProofOperator::Apply { .. } => Arity::Variable,
        }
    }

    /// Associated key, if any. Only `lift_key` carries one; it travels in
    /// the wire record's `key` field rather than the payload.
    pub fn key(&self) -> Option<&[u8]> {
        match self {
            ProofOperator::LiftKey { key } => Some(key),
            _ => None,
        }
    }

    /// Operator-specific wire payload.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            ProofOperator::Sha256
            | ProofOperator::PrependLength
            | ProofOperator::LiftKey { .. } => Vec::new(),
            ProofOperator::Append { prefix, suffix } => {
                let mut buf = Vec::new();
                write_bytes(&mut buf, prefix);
                write_bytes(&mut buf, suffix);
                buf
            }
            ProofOperator::Concat { begin, end } => {
                let mut buf = Vec::new();
                write_uvarint(&mut buf, *begin as u64);
                write_uvarint(&mut buf, *end as u64);
                buf
            }
            ProofOperator::AssertValues { values } => {
                let mut buf = Vec::new();
                write_uvarint(&mut buf, values.len() as u64);
                for value in values {
                    write_bytes(&mut buf, value);
                }
                buf
            }
            ProofOperator::Apply { ops } => {
                let mut buf = Vec::new();
                write_uvarint(&mut buf, ops.len() as u64);
                for op in ops {
                    let wire = op.to_proof_op();
                    write_bytes(&mut buf, wire.op_type.as_bytes());
                    write_bytes(&mut buf, &wire.key);
                    write_bytes(&mut buf, &wire.data);
                }
                buf
            }
        }
    }

    /// Assemble the wire record `(type, key, data)` for this operator.
    pub fn to_proof_op(&self) -> ProofOp {
        ProofOp {
            op_type: self.op_type().to_string(),
            key: self.key().unwrap_or_default().to_vec(),
            data: self.encode(),
        }
    }

    /// Execute the operator over `values`.
    ///
    /// For `Exact(n)` operators the caller passes exactly the top `n`
    /// elements; for `Variable` operators it passes the full stack. The
    /// result replaces whatever was passed in.
    pub fn run(&self, values: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, ProofError> {
        if let Arity::Exact(needed) = self.argn() {
            if values.len() < needed {
                return Err(ProofError::StackUnderflow {
                    needed,
                    have: values.len(),
                });
            }
        }
        match self {
            ProofOperator::Sha256 => Ok(vec![sha256(&values[0]).to_vec()]),
            ProofOperator::PrependLength => Ok(vec![encode_bytes(&values[0])]),
            ProofOperator::Append { prefix, suffix } => {
                let mut joined = Vec::with_capacity(prefix.len() + values[0].len() + suffix.len());
                joined.extend_from_slice(prefix);
                joined.extend_from_slice(&values[0]);
                joined.extend_from_slice(suffix);
                Ok(vec![joined])
            }
            ProofOperator::LiftKey { key } => {
                let mut res = Vec::with_capacity(values.len() + 1);
                res.push(key.clone());
                res.extend(values);
                Ok(res)
            }
            ProofOperator::Concat { begin, end } => {
                let (begin, end) = (*begin, *end);
                if begin > end {
                    return Err(ProofError::malformed(
                        OP_TYPE_CONCAT,
                        "begin exceeds end",
                    ));
                }
                if values.len() < end {
                    return Err(ProofError::StackUnderflow {
                        needed: end,
                        have: values.len(),
                    });
                }
                let mut res = Vec::with_capacity(values.len() - (end - begin) + 1);
                let mut values = values;
                let tail = values.split_off(end);
                let joined = values.split_off(begin).concat();
                res.extend(values);
                res.push(joined);
                res.extend(tail);
                Ok(res)
            }
            ProofOperator::AssertValues { values: accepted } => {
                let accepted: HashSet<&[u8]> =
                    accepted.iter().map(|v| v.as_slice()).collect();
                for value in &values {
                    if !accepted.contains(value.as_slice()) {
                        return Err(ProofError::AssertViolation);
                    }
                }
                Ok(values)
            }
            ProofOperator::Apply { ops } => {
                let mut values = values;
                let mut res = Vec::new();
                for op in ops {
                    let needed = match op.argn() {
                        Arity::Exact(n) => n,
                        Arity::Variable => {
                            return Err(ProofError::VariableArityInApply {
                                op_type: op.op_type(),
                            })
                        }
                    };
                    if values.len() < needed {
                        return Err(ProofError::StackUnderflow {
                            needed,
                            have: values.len(),
                        });
                    }
                    let rest = values.split_off(needed);
                    res.extend(op.run(values)?);
                    values = rest;
                }
                Ok(res)
            }
        }
    }
}

/// Run one or more programs against an optional input value.
///
/// The stack is seeded with `input` when present. Each operator consumes its
/// declared prefix of the stack (or the whole stack for variable arity) and
/// pushes its results back. A well-formed program reduces the stack to a
/// single element, which is returned; anything else is a verification
/// failure.
pub fn run_ops(
    input: Option<&[u8]>,
    programs: &[&[ProofOperator]],
) -> Result<Vec<u8>, ProofError> {
    let mut values: Vec<Vec<u8>> = match input {
        Some(value) => vec![value.to_vec()],
        None => Vec::new(),
    };

    for ops in programs {
        for op in *ops {
            values = match op.argn() {
                Arity::Exact(needed) => {
                    if values.len() < needed {
                        return Err(ProofError::StackUnderflow {
                            needed,
                            have: values.len(),
                        });
                    }
                    let rest = values.split_off(needed);
                    let mut res = op.run(values)?;
                    res.extend(rest);
                    res
                }
                Arity::Variable => op.run(values)?,
            };
        }
    }

    let len = values.len();
    match values.pop() {
        Some(root) if len == 1 => Ok(root),
        _ => Err(ProofError::UnexpectedFinalStack { len }),
    }
}
