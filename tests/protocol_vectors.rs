use duplex_transcript::{Keccak12, KeccakF1600, Permutation, Protocol};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Deserialize, Serialize)]
struct TestVector {
    #[serde(rename = "Domain")]
    domain: String,
    #[serde(rename = "Permutation")]
    permutation: String,
    #[serde(rename = "Operations")]
    operations: Vec<Operation>,
}

#[derive(Debug, Deserialize, Serialize)]
struct Operation {
    #[serde(rename = "type")]
    op_type: String,
    label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected: Option<String>,
}

impl Operation {
    fn data(&self) -> Vec<u8> {
        hex::decode(self.data.as_deref().unwrap_or_default()).unwrap()
    }
}

fn load_test_vectors() -> HashMap<String, TestVector> {
    let json_data = include_str!("./vectors/protocol_vectors.json");
    serde_json::from_str(json_data).expect("Failed to parse test vectors JSON")
}

fn replay<P: Permutation>(name: &str, test_vector: &TestVector) {
    let mut protocol = Protocol::<P>::with_permutation(&test_vector.domain);
    let mut replica = protocol.clone();

    for (i, operation) in test_vector.operations.iter().enumerate() {
        let label = operation.label.as_str();
        let output = match operation.op_type.as_str() {
            "mix" => {
                protocol.mix(label, &operation.data());
                None
            }
            "derive" => {
                let mut out = vec![0u8; operation.length.unwrap()];
                protocol.derive(label, &mut out);
                Some(out)
            }
            "encrypt" | "decrypt" | "mask" | "unmask" => {
                let mut buffer = operation.data();
                match operation.op_type.as_str() {
                    "encrypt" => protocol.encrypt(label, &mut buffer),
                    "decrypt" => protocol.decrypt(label, &mut buffer),
                    "mask" => protocol.mask(label, &mut buffer),
                    _ => protocol.unmask(label, &mut buffer),
                }
                Some(buffer)
            }
            "seal" => Some(protocol.seal(label, &operation.data())),
            "open" => Some(protocol.open(label, &operation.data()).unwrap()),
            "ratchet" => {
                protocol.ratchet(label);
                None
            }
            other => panic!("Unknown operation type: {other}"),
        };

        if let Some(output) = output {
            assert_eq!(
                hex::encode(output),
                *operation.expected.as_ref().unwrap(),
                "Test vector '{name}' failed at operation {i} ({})",
                operation.op_type
            );
        }

        // The serialized state carries the whole transcript.
        replica = Protocol::from_bytes(&protocol.to_bytes()).unwrap();
    }

    assert_eq!(replica, protocol);
}

fn run_test_vector(name: &str, test_vector: &TestVector) {
    match test_vector.permutation.as_str() {
        "Keccak-f[1600]" => replay::<KeccakF1600>(name, test_vector),
        "Keccak-p[1600,12]" => replay::<Keccak12>(name, test_vector),
        other => panic!("Unknown permutation: {other}"),
    }
}

#[test]
fn test_all_protocol_vectors() {
    let test_vectors = load_test_vectors();
    assert!(!test_vectors.is_empty());

    for (name, test_vector) in test_vectors {
        run_test_vector(&name, &test_vector);
    }
}

#[test]
fn test_spec_scenario_vector() {
    let test_vectors = load_test_vectors();
    let test_vector = test_vectors.get("spec_scenario").unwrap();
    run_test_vector("spec_scenario", test_vector);
}

#[test]
fn test_multi_block_vector() {
    let test_vectors = load_test_vectors();
    let test_vector = test_vectors.get("multi_block").unwrap();
    run_test_vector("multi_block", test_vector);
}

#[test]
fn test_empty_inputs_vector() {
    let test_vectors = load_test_vectors();
    let test_vector = test_vectors.get("empty_inputs").unwrap();
    run_test_vector("empty_inputs", test_vector);
}

#[test]
fn test_ratchet_vector() {
    let test_vectors = load_test_vectors();
    let test_vector = test_vectors.get("ratchet").unwrap();
    run_test_vector("ratchet", test_vector);
}

#[test]
fn test_receiver_vector() {
    let test_vectors = load_test_vectors();
    let test_vector = test_vectors.get("receiver").unwrap();
    run_test_vector("receiver", test_vector);
}
