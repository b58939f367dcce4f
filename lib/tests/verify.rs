//! End-to-end verification scenarios: produce proofs, ship them over the
//! wire, decode, validate the shape, run the VM, and compare roots.

use std::collections::BTreeMap;

use rand::Rng;

use pvm_lib::{
    run_ops, simple_proofs_from_byte_slices, simple_proofs_from_map, simple_value_validator,
    validate_proof_operators, Proof, ProofError, ProofOperator, ProofRuntime,
};

/// Full pipeline for map entries: operators are encoded to wire form and
/// decoded back through the default runtime before running.
#[test]
fn test_map_proofs_over_the_wire() {
    let map: BTreeMap<String, Vec<u8>> = [
        ("key1".to_string(), b"elem1".to_vec()),
        ("key2".to_string(), b"elem2".to_vec()),
        ("key3".to_string(), b"elem3".to_vec()),
    ]
    .into();

    let prt = ProofRuntime::default();
    let (root, proofs) = simple_proofs_from_map(&map);
    for (key, value) in &map {
        let ops = proofs[key].make_proof_ops(Some(key.as_bytes()));
        let wire = Proof {
            ops: ops.iter().map(|op| op.to_proof_op()).collect(),
        };

        let decoded = prt.decode_proof(&wire).unwrap();
        assert_eq!(decoded, ops);
        validate_proof_operators(&simple_value_validator(), &decoded).unwrap();
        assert_eq!(run_ops(Some(value), &[&decoded]).unwrap(), root.to_vec());
    }
}

#[test]
fn test_byte_slice_proofs_over_the_wire() {
    let items: Vec<Vec<u8>> = vec![b"elem1".to_vec(), b"elem2".to_vec(), b"elem3".to_vec()];

    let prt = ProofRuntime::default();
    let (root, proofs) = simple_proofs_from_byte_slices(&items);
    for (item, proof) in items.iter().zip(&proofs) {
        let ops = proof.make_proof_ops(None);
        let wire = Proof {
            ops: ops.iter().map(|op| op.to_proof_op()).collect(),
        };

        let decoded = prt.decode_proof(&wire).unwrap();
        validate_proof_operators(&simple_value_validator(), &decoded).unwrap();
        assert_eq!(run_ops(Some(item), &[&decoded]).unwrap(), root.to_vec());
    }
}

#[test]
fn test_proof_rejected_against_wrong_root() {
    let items: Vec<Vec<u8>> = (0..5).map(|i| format!("item{i}").into_bytes()).collect();
    let (root, proofs) = simple_proofs_from_byte_slices(&items);

    // a proof for one index must not reproduce the root for another value
    let ops = proofs[2].make_proof_ops(None);
    match run_ops(Some(&items[3]), &[&ops]) {
        Ok(candidate) => assert_ne!(candidate, root.to_vec()),
        Err(ProofError::AssertViolation) => {}
        Err(other) => panic!("unexpected failure: {other}"),
    }
}

#[test]
fn test_grammar_rejects_truncated_climb() {
    let items: Vec<Vec<u8>> = (0..4).map(|i| format!("item{i}").into_bytes()).collect();
    let (_root, proofs) = simple_proofs_from_byte_slices(&items);

    let mut ops = proofs[0].make_proof_ops(None);
    // dropping the final hash leaves a dangling append
    assert_eq!(ops.pop(), Some(ProofOperator::Sha256));
    let err = validate_proof_operators(&simple_value_validator(), &ops).unwrap_err();
    assert!(matches!(err, ProofError::GrammarMismatch { .. }));
}

fn random_operator(rng: &mut impl Rng) -> ProofOperator {
    fn random_bytes(rng: &mut impl Rng, len: usize) -> Vec<u8> {
        (0..len).map(|_| rng.gen()).collect()
    }

    match rng.gen_range(0..5) {
        0 => ProofOperator::Append {
            prefix: random_bytes(rng, 32),
            suffix: random_bytes(rng, 32),
        },
        1 => ProofOperator::Sha256,
        2 => ProofOperator::PrependLength,
        3 => ProofOperator::Concat { begin: 0, end: 0 },
        _ => ProofOperator::LiftKey {
            key: random_bytes(rng, 32),
        },
    }
}

#[test]
fn test_operators_encode_decode() {
    let prt = ProofRuntime::default();
    let mut rng = rand::thread_rng();
    for _ in 0..1000 {
        let op = random_operator(&mut rng);
        let decoded = prt
            .decode_proof(&Proof {
                ops: vec![op.to_proof_op()],
            })
            .unwrap();
        assert_eq!(decoded, vec![op]);
    }
}
