//! # Error: Error Types for Duplex Transcripts.
//!
//! This module defines the [`Error`] enum, which enumerates the recoverable failure
//! modes a caller can observe when operating on untrusted input:
//! - an authenticated ciphertext (or tag) that does not verify,
//! - a serialized duplex state that is truncated or out of range.
//!
//! Misuse of the API against its documented preconditions is not an [`Error`]:
//! it is either unrepresentable in the type signatures or a documented panic.

/// Represents an error encountered while processing untrusted input.
///
/// None of the variants carry data derived from secret material.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The authentication tag did not verify. Any candidate plaintext has been zeroed.
    #[error("Invalid ciphertext.")]
    InvalidCiphertext,
    /// A serialized duplex state had the wrong length or out-of-range pointers.
    #[error("Invalid duplex state.")]
    InvalidState,
}
