use crate::error::ProofError;
use crate::ops::{
    ProofOperator, OP_TYPE_APPEND, OP_TYPE_ASSERT_VALUES, OP_TYPE_CONCAT, OP_TYPE_LIFT_KEY,
    OP_TYPE_PREPEND_LENGTH, OP_TYPE_SHA256,
};

/// A grammar over operator sequences.
///
/// Each validator consumes a prefix of the input and yields the unconsumed
/// tail; a top-level run accepts a sequence iff it is consumed entirely.
#[derive(Clone, Debug)]
pub enum OpValidator {
    /// Accept a single operator with the given type tag
    OpType(&'static str),
    /// Thread the input through each sub-validator in order
    Sequence(Vec<OpValidator>),
    /// Attempt the sub-validator; on failure consume nothing
    Option(Box<OpValidator>),
    /// Greedily apply the sub-validator zero or more times
    Repeat(Box<OpValidator>),
}

/// Deepest mismatch seen while parsing, kept for error reporting.
#[derive(Clone, Debug)]
struct Mismatch {
    index: usize,
    expected: &'static str,
}

fn note(deepest: &mut Option<Mismatch>, index: usize, expected: &'static str) {
    if deepest.as_ref().map_or(true, |m| index > m.index) {
        *deepest = Some(Mismatch { index, expected });
    }
}

impl OpValidator {
    /// Consume a prefix of `ops`.
    ///
    /// `at` is the absolute index of `ops[0]` in the original sequence;
    /// failed attempts are recorded in `deepest` so the top-level error can
    /// point at the furthest operator any branch reached.
    fn consume<'a>(
        &self,
        ops: &'a [ProofOperator],
        at: usize,
        deepest: &mut Option<Mismatch>,
    ) -> Option<(&'a [ProofOperator], usize)> {
        match self {
            OpValidator::OpType(expected) => match ops.first() {
                Some(op) if op.op_type() == *expected => Some((&ops[1..], at + 1)),
                _ => {
                    note(deepest, at, expected);
                    None
                }
            },
            OpValidator::Sequence(validators) => {
                let mut rest = (ops, at);
                for validator in validators {
                    rest = validator.consume(rest.0, rest.1, deepest)?;
                }
                Some(rest)
            }
            OpValidator::Option(validator) => {
                Some(validator.consume(ops, at, deepest).unwrap_or((ops, at)))
            }
            OpValidator::Repeat(validator) => {
                let mut rest = (ops, at);
                while let Some(next) = validator.consume(rest.0, rest.1, deepest) {
                    if next.0.len() == rest.0.len() {
                        break;
                    }
                    rest = next;
                }
                Some(rest)
            }
        }
    }
}

/// Run `validator` over `ops`, succeeding iff the whole sequence is consumed.
pub fn validate_proof_operators(
    validator: &OpValidator,
    ops: &[ProofOperator],
) -> Result<(), ProofError> {
    let mut deepest = None;
    match validator.consume(ops, 0, &mut deepest) {
        Some((rest, _)) if rest.is_empty() => Ok(()),
        Some((_, at)) => {
            // a fully-matched prefix with leftovers: point at the first
            // unconsumed operator, unless some branch got further
            let (index, expected) = match deepest {
                Some(m) if m.index >= at => (m.index, m.expected.to_string()),
                _ => (at, "end of sequence".to_string()),
            };
            Err(ProofError::GrammarMismatch { index, expected })
        }
        None => {
            let (index, expected) = deepest
                .map(|m| (m.index, m.expected.to_string()))
                .unwrap_or((0, "end of sequence".to_string()));
            Err(ProofError::GrammarMismatch { index, expected })
        }
    }
}

/// Leaf grammar for proofs produced from a simple map: turns a raw value
/// into the canonical key-bound leaf preimage.
///
/// SimpleKVLeaf =
///   sha256
///   prepend_length
///   lift_key
///   prepend_length
///   concat
pub fn simple_kv_leaf_validator() -> OpValidator {
    OpValidator::Sequence(vec![
        OpValidator::OpType(OP_TYPE_SHA256),
        OpValidator::OpType(OP_TYPE_PREPEND_LENGTH),
        OpValidator::OpType(OP_TYPE_LIFT_KEY),
        OpValidator::OpType(OP_TYPE_PREPEND_LENGTH),
        OpValidator::OpType(OP_TYPE_CONCAT),
    ])
}

/// Full inclusion-proof grammar: optional leaf construction, the leaf hash
/// step, an assertion anchoring the leaf digest, then sibling-combine and
/// hash steps climbing to the root.
///
/// SimpleValue =
///   optional SimpleKVLeaf
///   append
///   sha256
///   assert_values
///   repeated {
///     append
///     sha256
///   }
pub fn simple_value_validator() -> OpValidator {
    OpValidator::Sequence(vec![
        OpValidator::Option(Box::new(simple_kv_leaf_validator())),
        OpValidator::OpType(OP_TYPE_APPEND),
        OpValidator::OpType(OP_TYPE_SHA256),
        OpValidator::OpType(OP_TYPE_ASSERT_VALUES),
        OpValidator::Repeat(Box::new(OpValidator::Sequence(vec![
            OpValidator::OpType(OP_TYPE_APPEND),
            OpValidator::OpType(OP_TYPE_SHA256),
        ]))),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn append() -> ProofOperator {
        ProofOperator::Append {
            prefix: vec![0x01],
            suffix: Vec::new(),
        }
    }

    fn assert_values() -> ProofOperator {
        ProofOperator::AssertValues { values: Vec::new() }
    }

    fn kv_leaf_ops() -> Vec<ProofOperator> {
        vec![
            ProofOperator::Sha256,
            ProofOperator::PrependLength,
            ProofOperator::LiftKey { key: b"k".to_vec() },
            ProofOperator::PrependLength,
            ProofOperator::Concat { begin: 0, end: 2 },
        ]
    }

    #[test]
    fn test_simple_value_accepts_bare_proof() {
        let ops = vec![append(), ProofOperator::Sha256, assert_values()];
        validate_proof_operators(&simple_value_validator(), &ops).unwrap();
    }

    #[test]
    fn test_simple_value_accepts_leaf_and_climb() {
        let mut ops = kv_leaf_ops();
        ops.extend([append(), ProofOperator::Sha256, assert_values()]);
        ops.extend([append(), ProofOperator::Sha256]);
        ops.extend([append(), ProofOperator::Sha256]);
        validate_proof_operators(&simple_value_validator(), &ops).unwrap();
    }

    #[test]
    fn test_simple_value_rejects_double_hash() {
        let ops = vec![ProofOperator::Sha256, ProofOperator::Sha256];
        let err = validate_proof_operators(&simple_value_validator(), &ops).unwrap_err();
        match err {
            ProofError::GrammarMismatch { index, .. } => assert_eq!(index, 1),
            other => panic!("expected grammar mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_validator_requires_full_consumption() {
        let mut ops = vec![append(), ProofOperator::Sha256, assert_values()];
        validate_proof_operators(&simple_value_validator(), &ops).unwrap();

        // a trailing operator no grammar rule covers must be rejected
        ops.push(ProofOperator::Concat { begin: 0, end: 1 });
        let err = validate_proof_operators(&simple_value_validator(), &ops).unwrap_err();
        match err {
            ProofError::GrammarMismatch { index, .. } => assert_eq!(index, 3),
            other => panic!("expected grammar mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_repeat_consumes_zero_copies() {
        let grammar = OpValidator::Sequence(vec![
            OpValidator::Repeat(Box::new(OpValidator::OpType(OP_TYPE_SHA256))),
            OpValidator::OpType(OP_TYPE_APPEND),
        ]);
        validate_proof_operators(&grammar, &[append()]).unwrap();
        validate_proof_operators(
            &grammar,
            &[ProofOperator::Sha256, ProofOperator::Sha256, append()],
        )
        .unwrap();
    }

    #[test]
    fn test_option_backtracks_without_consuming() {
        let grammar = OpValidator::Sequence(vec![
            OpValidator::Option(Box::new(OpValidator::OpType(OP_TYPE_SHA256))),
            OpValidator::OpType(OP_TYPE_APPEND),
        ]);
        validate_proof_operators(&grammar, &[append()]).unwrap();
        validate_proof_operators(&grammar, &[ProofOperator::Sha256, append()]).unwrap();
    }

    #[test]
    fn test_empty_sequence_needs_empty_input() {
        let grammar = OpValidator::OpType(OP_TYPE_SHA256);
        let err = validate_proof_operators(&grammar, &[]).unwrap_err();
        match err {
            ProofError::GrammarMismatch { index, expected } => {
                assert_eq!(index, 0);
                assert_eq!(expected, OP_TYPE_SHA256);
            }
            other => panic!("expected grammar mismatch, got {other:?}"),
        }
    }
}
