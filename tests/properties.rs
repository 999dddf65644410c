use duplex_transcript::duplex::{CAPACITY, MAX_RATE, SERIALIZED_LEN};
use duplex_transcript::{Error, Protocol, TAG_LEN};
use proptest::prelude::*;
use proptest::sample::Index;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

#[derive(Clone, Debug)]
enum Op {
    Mix(String, Vec<u8>),
    Derive(String, usize),
    Mask(String, Vec<u8>),
    Seal(String, Vec<u8>),
}

fn label() -> impl Strategy<Value = String> {
    "[a-z]{0,12}"
}

fn data() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..400)
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (label(), data()).prop_map(|(l, d)| Op::Mix(l, d)),
        (label(), 0usize..300).prop_map(|(l, n)| Op::Derive(l, n)),
        (label(), data()).prop_map(|(l, d)| Op::Mask(l, d)),
        (label(), data()).prop_map(|(l, d)| Op::Seal(l, d)),
    ]
}

/// Applies `op` and returns whatever it outputs.
fn apply(protocol: &mut Protocol, op: &Op) -> Vec<u8> {
    match op {
        Op::Mix(label, input) => {
            protocol.mix(label, input);
            Vec::new()
        }
        Op::Derive(label, n) => {
            let mut out = vec![0u8; *n];
            protocol.derive(label, &mut out);
            out
        }
        Op::Mask(label, input) => {
            let mut buffer = input.clone();
            protocol.mask(label, &mut buffer);
            buffer
        }
        Op::Seal(label, input) => protocol.seal(label, input),
    }
}

proptest! {
    #[test]
    fn determinism(domain in "[a-z.]{0,20}", ops in prop::collection::vec(op(), 0..12)) {
        let mut a = Protocol::new(&domain);
        let mut b = Protocol::new(&domain);
        prop_assert!(a == b);
        for op in &ops {
            prop_assert_eq!(apply(&mut a, op), apply(&mut b, op));
            prop_assert!(a == b);
        }
    }

    #[test]
    fn reversibility(ops in prop::collection::vec(op(), 0..12)) {
        let mut sender = Protocol::new("com.example.reversibility");
        let mut receiver = Protocol::new("com.example.reversibility");

        for op in &ops {
            match op {
                Op::Mix(label, input) => {
                    sender.mix(label, input);
                    receiver.mix(label, input);
                }
                Op::Derive(label, n) => {
                    let mut a = vec![0u8; *n];
                    let mut b = vec![0u8; *n];
                    sender.derive(label, &mut a);
                    receiver.derive(label, &mut b);
                    prop_assert_eq!(a, b);
                }
                Op::Mask(label, input) => {
                    let mut buffer = input.clone();
                    sender.mask(label, &mut buffer);
                    receiver.unmask(label, &mut buffer);
                    prop_assert_eq!(&buffer, input);
                }
                Op::Seal(label, input) => {
                    let sealed = sender.seal(label, input);
                    prop_assert_eq!(receiver.open(label, &sealed), Ok(input.clone()));
                }
            }
            prop_assert!(sender == receiver);
        }
    }

    #[test]
    fn encrypt_round_trip(label in label(), message in data()) {
        let mut sender = Protocol::new("com.example.round-trip");
        let mut receiver = sender.clone();

        let mut buffer = message.clone();
        sender.encrypt(&label, &mut buffer);
        receiver.decrypt(&label, &mut buffer);
        prop_assert_eq!(&buffer, &message);

        let sealed = sender.seal(&label, &message);
        prop_assert_eq!(sealed.len(), message.len() + TAG_LEN);
        prop_assert_eq!(receiver.open(&label, &sealed), Ok(message));
        prop_assert!(sender == receiver);
    }

    #[test]
    fn non_malleability(
        message in prop::collection::vec(any::<u8>(), 0..64),
        index in any::<Index>(),
        bit in 0u8..8,
    ) {
        let mut sender = Protocol::new("com.example.malleability");
        let mut receiver = sender.clone();

        let mut sealed = sender.seal("message", &message);
        let i = index.index(sealed.len());
        sealed[i] ^= 1 << bit;
        prop_assert_eq!(receiver.open("message", &sealed), Err(Error::InvalidCiphertext));
    }

    #[test]
    fn serialization_round_trip(ops in prop::collection::vec(op(), 0..8)) {
        let mut protocol = Protocol::new("com.example.serialization");
        for op in &ops {
            apply(&mut protocol, op);
            let bytes = protocol.to_bytes();
            let restored: Protocol = Protocol::from_bytes(&bytes).unwrap();
            prop_assert!(restored == protocol);
        }
    }

    #[test]
    fn deserialization_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..300)) {
        let valid = bytes.len() == SERIALIZED_LEN
            && (bytes[0] as usize) < MAX_RATE
            && (bytes[1] as usize) < MAX_RATE
            && bytes[1] <= bytes[0];

        match Protocol::<duplex_transcript::KeccakF1600>::from_bytes(&bytes) {
            Ok(protocol) => {
                prop_assert!(valid);
                prop_assert_eq!(&protocol.to_bytes()[..], &bytes[..]);
            }
            Err(err) => {
                prop_assert!(!valid);
                prop_assert_eq!(err, Error::InvalidState);
            }
        }
    }

    #[test]
    fn ratchet_erases_capacity_window(ops in prop::collection::vec(op(), 0..6)) {
        let mut protocol = Protocol::new("com.example.ratchet");
        for op in &ops {
            apply(&mut protocol, op);
        }
        protocol.ratchet("ratchet");

        let bytes = protocol.to_bytes();
        prop_assert_eq!(bytes[0] as usize, CAPACITY);
        prop_assert!(bytes[2..2 + CAPACITY].iter().all(|&b| b == 0));
    }
}

/// Replays a long randomized operation sequence on two independently constructed protocols.
#[test]
fn divergence_freedom() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut a = Protocol::new("com.example.divergence");
    let mut b = Protocol::new("com.example.divergence");

    for step in 0..2000 {
        let label = format!("label-{}", rng.gen_range(0..8));
        let mut input = vec![0u8; rng.gen_range(0..512)];
        rng.fill_bytes(&mut input);

        let op = match rng.gen_range(0..4) {
            0 => Op::Mix(label, input),
            1 => Op::Derive(label, input.len()),
            2 => Op::Mask(label, input),
            _ => Op::Seal(label, input),
        };
        assert_eq!(apply(&mut a, &op), apply(&mut b, &op), "step {step}: {op:?}");
        assert!(a == b, "states diverged at step {step}");
    }
}

#[test]
fn empty_message_round_trip() {
    let mut sender = Protocol::new("com.example.empty");
    let mut receiver = sender.clone();

    let sealed = sender.seal("", b"");
    assert_eq!(sealed.len(), TAG_LEN);
    assert_eq!(receiver.open("", &sealed), Ok(Vec::new()));

    let mut empty = [0u8; 0];
    sender.encrypt("", &mut empty);
    receiver.decrypt("", &mut empty);
    assert!(sender == receiver);
}
