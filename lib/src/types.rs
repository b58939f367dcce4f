use serde::{Deserialize, Serialize};

/// 32-byte hash type
pub type H256 = [u8; 32];

/// Wire form of a single proof operator.
///
/// `op_type` selects a decoder in the runtime registry, `key` is carried
/// verbatim (only `lift_key` consumes it), `data` is the operator's encoded
/// payload and may be empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOp {
    #[serde(rename = "type")]
    pub op_type: String,
    pub key: Vec<u8>,
    pub data: Vec<u8>,
}

/// Wire form of a full proof: an ordered sequence of operators.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub ops: Vec<ProofOp>,
}
