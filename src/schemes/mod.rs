//! Symmetric schemes built from [`crate::Protocol`] operations.
//!
//! Each scheme is a fixed sequence of protocol operations under its own domain:
//! - [`hash`]: a 256-bit cryptographic hash,
//! - [`mac`]: a keyed message authentication code,
//! - [`aead`]: nonce-based authenticated encryption with associated data.

pub mod aead;
pub mod hash;
pub mod mac;

pub use aead::Aead;
pub use hash::{Hasher, hash};
pub use mac::Mac;
