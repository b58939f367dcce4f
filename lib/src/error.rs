use thiserror::Error;

/// Error raised by the byte-string codec.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// Input ended inside a varint or a length-delimited payload
    #[error("unexpected end of input")]
    Truncated,
    /// Varint continued past 10 bytes
    #[error("varint exceeds 10 bytes")]
    Overlong,
    /// Varint does not fit in a u64
    #[error("varint overflows u64")]
    Overflow,
    /// Declared length runs past the remaining input
    #[error("length {len} exceeds remaining {remaining} bytes")]
    Length { len: u64, remaining: usize },
}

/// Error raised while decoding, validating, or running a proof.
///
/// Every failure is surfaced to the caller; the VM never panics on
/// adversarial input and never retries.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProofError {
    /// No decoder registered for a wire type tag
    #[error("unknown proof operator type {op_type:?}")]
    UnknownOpType { op_type: String },

    /// A decoder could not consume exactly the payload it was given
    #[error("malformed {op_type} payload: {reason}")]
    MalformedPayload { op_type: &'static str, reason: String },

    /// An operator required more stack elements than were available
    #[error("stack underflow: needed {needed} values, have {have}")]
    StackUnderflow { needed: usize, have: usize },

    /// `assert_values` saw a stack element outside its accepted set
    #[error("stack value not in accepted set")]
    AssertViolation,

    /// A grammar validator rejected the operator sequence
    #[error("grammar mismatch at operator {index}: expected {expected}")]
    GrammarMismatch { index: usize, expected: String },

    /// The program finished with other than exactly one stack element
    #[error("program left {len} values on the stack, expected 1")]
    UnexpectedFinalStack { len: usize },

    /// A variable-arity operator was nested inside `apply`
    #[error("variable-arity operator {op_type} cannot run inside apply")]
    VariableArityInApply { op_type: &'static str },
}

impl ProofError {
    pub(crate) fn malformed(op_type: &'static str, reason: impl ToString) -> Self {
        ProofError::MalformedPayload {
            op_type,
            reason: reason.to_string(),
        }
    }
}
