//! Nonce-based authenticated encryption with associated data.
//!
//! The key is mixed once at construction. Each message then runs on a clone of that keyed
//! transcript:
//! `Mix("nonce", n); Mix("ad", a); Seal("message", p)`.
//!
//! A nonce must never be reused with the same key.

use alloc::vec::Vec;

use crate::errors::Error;
use crate::protocol::{Protocol, TAG_LEN};

/// Length of an AEAD key in bytes.
pub const KEY_LEN: usize = 32;

const DOMAIN: &str = "duplex-transcript.aead";

/// An AEAD instance bound to one key.
#[derive(Clone, Debug)]
pub struct Aead {
    keyed: Protocol,
}

impl Aead {
    /// Creates an AEAD instance for `key`.
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        let mut keyed = Protocol::new(DOMAIN);
        keyed.mix("key", key);
        Self { keyed }
    }

    fn session(&self, nonce: &[u8], ad: &[u8]) -> Protocol {
        let mut protocol = self.keyed.clone();
        protocol.mix("nonce", nonce);
        protocol.mix("ad", ad);
        protocol
    }

    /// Encrypts and authenticates `plaintext`, returning the ciphertext followed by a
    /// [`TAG_LEN`]-byte tag.
    pub fn seal(&self, nonce: &[u8], ad: &[u8], plaintext: &[u8]) -> Vec<u8> {
        self.session(nonce, ad).seal("message", plaintext)
    }

    /// Seals in place. `in_out` holds the plaintext followed by [`TAG_LEN`] spare bytes.
    ///
    /// # Panics
    /// If `in_out` is shorter than [`TAG_LEN`].
    pub fn seal_in_place(&self, nonce: &[u8], ad: &[u8], in_out: &mut [u8]) {
        self.session(nonce, ad).seal_in_place("message", in_out);
    }

    /// Verifies and decrypts the output of [`Aead::seal`].
    ///
    /// # Errors
    /// - [`Error::InvalidCiphertext`] if the ciphertext, nonce, or associated data were
    ///   altered, or the ciphertext is shorter than a tag.
    pub fn open(&self, nonce: &[u8], ad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
        self.session(nonce, ad).open("message", ciphertext)
    }

    /// Opens in place, returning the plaintext prefix of `in_out`.
    ///
    /// # Errors
    /// - [`Error::InvalidCiphertext`] as for [`Aead::open`]; `in_out` is zeroed on a tag
    ///   mismatch.
    pub fn open_in_place<'a>(
        &self,
        nonce: &[u8],
        ad: &[u8],
        in_out: &'a mut [u8],
    ) -> Result<&'a mut [u8], Error> {
        self.session(nonce, ad).open_in_place("message", in_out)
    }
}
