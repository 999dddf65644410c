//! ## Duplex transcripts
//!
//! This crate provides a single symmetric primitive, a duplex construction over the
//! Keccak-p\[1600\] permutation, and a transcript [`Protocol`] that composes every
//! higher-level symmetric scheme from a handful of canonical operations.
//!
//! - [`duplex`]: the [`Duplex`] state machine (absorb, squeeze, encrypt, decrypt, permute,
//!   frame, ratchet), its constant-time equality and serialized form.
//! - [`protocol`]: the [`Protocol`] operations (Init, Mix, Derive, Encrypt/Decrypt,
//!   Mask/Unmask, Seal/Open, Ratchet, Clone, Fork) with length-canonical framing.
//! - [`encoding`]: the left/right length encodings that make framing unambiguous.
//! - `stream` (feature `std`): `std::io` adapters for streaming Mix and Crypt operations.
//! - [`schemes`]: hashing, MACs, and AEAD built from protocol operations.
//!
//! ### Example
//!
//! ```
//! use duplex_transcript::Protocol;
//!
//! let mut alice = Protocol::new("com.example.doc");
//! alice.mix("key", b"a shared secret key");
//! alice.mix("nonce", b"a unique nonce");
//! let mut bob = alice.clone();
//!
//! let sealed = alice.seal("message", b"hello, bob");
//! assert_eq!(bob.open("message", &sealed).unwrap(), b"hello, bob");
//! ```

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod duplex;
pub mod encoding;
pub mod errors;
pub mod permutation;
pub mod protocol;
pub mod schemes;
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub mod stream;

pub use duplex::Duplex;
pub use errors::Error;
pub use permutation::{Keccak12, KeccakF1600, Permutation};
pub use protocol::{Direction, Protocol, TAG_LEN};
#[cfg(feature = "std")]
pub use stream::{CryptReader, CryptWriter, MixReader, MixWriter};
