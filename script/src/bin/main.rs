//! Simple-map proof generation and verification driver.
//!
//! You can run this tool using the following command:
//! ```shell
//! cargo run --release -- --entry key1=elem1 --entry key2=elem2 --key key1
//! ```

use std::collections::BTreeMap;
use std::process::exit;

use clap::Parser;
use pvm_lib::{
    run_ops, simple_proofs_from_map, simple_value_validator, validate_proof_operators, Proof,
    ProofRuntime,
};

/// The arguments for the command.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Map entries to build the tree from, as key=value
    #[arg(long = "entry", value_name = "KEY=VALUE", required = true)]
    entries: Vec<String>,

    /// Key whose inclusion proof to generate and check
    #[arg(long)]
    key: String,

    /// Also dump the wire proof as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    // Parse the command line arguments.
    let args = Args::parse();

    let mut map: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    for entry in &args.entries {
        match entry.split_once('=') {
            Some((key, value)) => {
                map.insert(key.to_string(), value.as_bytes().to_vec());
            }
            None => {
                eprintln!("Error: entry {entry:?} is not of the form key=value");
                exit(1);
            }
        }
    }

    let Some(value) = map.get(&args.key).cloned() else {
        eprintln!("Error: key {:?} is not among the entries", args.key);
        exit(1);
    };

    // Build the tree and pick out the requested proof.
    let (root, proofs) = simple_proofs_from_map(&map);
    let ops = proofs[&args.key].make_proof_ops(Some(args.key.as_bytes()));

    println!("Simple-map tree:");
    println!("  Entries: {}", map.len());
    println!("  Root: {}", hex::encode(root));
    println!("  Key: {}", args.key);
    println!("  Proof operators: {}", ops.len());

    // Round-trip the proof through its wire form, as a verifier would see it.
    let wire = Proof {
        ops: ops.iter().map(|op| op.to_proof_op()).collect(),
    };
    if args.json {
        match serde_json::to_string_pretty(&wire) {
            Ok(json) => println!("\nWire proof:\n{json}"),
            Err(e) => {
                eprintln!("Error: failed to encode proof: {e}");
                exit(1);
            }
        }
    }

    let prt = ProofRuntime::default();
    let decoded = match prt.decode_proof(&wire) {
        Ok(decoded) => decoded,
        Err(e) => {
            eprintln!("Error: failed to decode proof: {e}");
            exit(1);
        }
    };

    if let Err(e) = validate_proof_operators(&simple_value_validator(), &decoded) {
        eprintln!("Error: proof shape rejected: {e}");
        exit(1);
    }

    let candidate = match run_ops(Some(&value), &[&decoded]) {
        Ok(candidate) => candidate,
        Err(e) => {
            eprintln!("Error: proof execution failed: {e}");
            exit(1);
        }
    };

    println!("\nVerification Result:");
    println!("  Derived root: {}", hex::encode(&candidate));
    if candidate == root.to_vec() {
        println!("  Verified: true");
    } else {
        println!("  Verified: false");
        exit(1);
    }
}
