//! Transcript protocol over a [`Duplex`].
//!
//! This module defines [`Protocol`], which turns the four duplex primitives into a small
//! set of canonical, domain-separated operations:
//! - [`Protocol::mix`] folds data into the transcript,
//! - [`Protocol::derive`] produces pseudorandom output,
//! - [`Protocol::encrypt`] / [`Protocol::decrypt`] and [`Protocol::mask`] / [`Protocol::unmask`]
//!   provide unauthenticated confidentiality,
//! - [`Protocol::seal`] / [`Protocol::open`] provide authenticated encryption,
//! - [`Protocol::ratchet`] erases state for forward secrecy,
//! - [`Protocol::fork`] splits one transcript into independent, domain-separated children.
//!
//! Every operation starts a new duplex frame and absorbs a one-byte opcode, the
//! left-encoded bit length of its label, and the label itself. Variable-length bodies are
//! followed by their right-encoded bit length, so no two distinct sequences of operations
//! ever absorb the same byte string.
//!
//! # Usage
//! Two parties that construct a protocol with the same domain and apply the same sequence
//! of operations end up in identical states, and derive identical outputs.

use alloc::vec::Vec;
use core::array;

use subtle::{Choice, ConstantTimeEq};
use tracing::{debug, instrument};
use zeroize::Zeroize;

use crate::duplex::{Duplex, SERIALIZED_LEN};
use crate::encoding::{bit_len, left_encode, right_encode};
use crate::errors::Error;
use crate::permutation::{KeccakF1600, Permutation};

/// Length of the authentication tag appended by [`Protocol::seal`].
pub const TAG_LEN: usize = 16;

/// Opcodes absorbed at the start of every operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum OpCode {
    Init = 0x01,
    Mix = 0x02,
    Derive = 0x03,
    Crypt = 0x04,
    Mask = 0x05,
    AuthCrypt = 0x06,
    Ratchet = 0x07,
}

/// Whether a keyed body is being encrypted or decrypted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Plaintext in, ciphertext out.
    Encrypt,
    /// Ciphertext in, plaintext out.
    Decrypt,
}

impl Direction {
    #[cfg(feature = "std")]
    #[inline]
    pub(crate) fn apply<P: Permutation>(self, duplex: &mut Duplex<P>, in_out: &mut [u8]) {
        match self {
            Direction::Encrypt => duplex.encrypt(in_out),
            Direction::Decrypt => duplex.decrypt(in_out),
        }
    }
}

/// A duplex-based transcript protocol.
///
/// The only state is the underlying [`Duplex`]. Cloning a protocol yields an independent
/// copy whose future behavior is identical given identical inputs.
///
/// A protocol is not internally synchronized: share it across threads only behind a lock,
/// or [`Protocol::fork`] it and hand each child to its own thread.
#[derive(Clone, Debug)]
pub struct Protocol<P: Permutation = KeccakF1600> {
    duplex: Duplex<P>,
}

impl Protocol {
    /// Creates a new protocol over Keccak-f\[1600\], bound to the given domain.
    ///
    /// The domain should be a unique, fixed string identifying the application and the
    /// purpose of the protocol, e.g. `"com.example.file-encryption"`.
    pub fn new(domain: &str) -> Self {
        Self::with_permutation(domain)
    }
}

impl<P: Permutation> Protocol<P> {
    /// Creates a new protocol over the permutation `P`, bound to the given domain.
    #[instrument(level = "debug", name = "Protocol::init")]
    pub fn with_permutation(domain: &str) -> Self {
        let mut protocol = Self {
            duplex: Duplex::new(),
        };
        protocol.begin(OpCode::Init, domain);
        protocol.duplex.permute();
        protocol
    }

    fn begin(&mut self, op: OpCode, label: &str) {
        self.duplex.frame();
        self.duplex.absorb(&[op as u8]);
        self.duplex.absorb(left_encode(bit_len(label.len())).as_ref());
        self.duplex.absorb(label.as_bytes());
    }

    /// Runs `body` on the duplex between a Key and an Unkey step.
    ///
    /// Key permutes, binding the keystream to the whole transcript including this
    /// operation's header. Unkey absorbs the right-encoded length of the body.
    fn keyed<R>(
        &mut self,
        op: OpCode,
        label: &str,
        len: usize,
        body: impl FnOnce(&mut Duplex<P>) -> R,
    ) -> R {
        self.begin(op, label);
        self.duplex.permute();
        let result = body(&mut self.duplex);
        self.end(len as u64);
        result
    }

    pub(crate) fn begin_mix(&mut self, label: &str) {
        self.begin(OpCode::Mix, label);
    }

    #[cfg(feature = "std")]
    pub(crate) fn begin_crypt(&mut self, label: &str) {
        self.begin(OpCode::Crypt, label);
        self.duplex.permute();
    }

    pub(crate) fn absorb_chunk(&mut self, chunk: &[u8]) {
        self.duplex.absorb(chunk);
    }

    /// Closes a variable-length body of `len` bytes.
    pub(crate) fn end(&mut self, len: u64) {
        self.duplex.absorb(right_encode(u128::from(len) * 8).as_ref());
    }

    #[cfg(any(feature = "std", test))]
    pub(crate) fn duplex(&self) -> &Duplex<P> {
        &self.duplex
    }

    #[cfg(feature = "std")]
    pub(crate) fn duplex_mut(&mut self) -> &mut Duplex<P> {
        &mut self.duplex
    }

    /// Mixes `input` into the transcript under `label`.
    ///
    /// No permutation is performed: consecutive mixes share the cost of the next
    /// operation that needs one.
    #[instrument(level = "trace", skip(self, input), fields(len = input.len()))]
    pub fn mix(&mut self, label: &str, input: &[u8]) {
        self.begin_mix(label);
        self.duplex.absorb(input);
        self.end(input.len() as u64);
    }

    /// Fills `output` with pseudorandom bytes derived from the transcript.
    ///
    /// The output length is part of the transcript: deriving 16 bytes is not a prefix of
    /// deriving 32 bytes under the same label.
    #[instrument(level = "trace", skip(self, output), fields(len = output.len()))]
    pub fn derive(&mut self, label: &str, output: &mut [u8]) {
        self.begin(OpCode::Derive, label);
        self.duplex.absorb(right_encode(bit_len(output.len())).as_ref());
        self.duplex.permute();
        self.duplex.squeeze(output);
        self.duplex.permute();
    }

    /// Derives `N` pseudorandom bytes from the transcript.
    pub fn derive_array<const N: usize>(&mut self, label: &str) -> [u8; N] {
        let mut output = [0u8; N];
        self.derive(label, &mut output);
        output
    }

    /// Encrypts `in_out` in place, without authentication.
    ///
    /// The keystream depends on the entire prior transcript, which the caller must ensure
    /// is unique per encryption (e.g. by mixing a key and a nonce first).
    #[instrument(level = "trace", skip(self, in_out), fields(len = in_out.len()))]
    pub fn encrypt(&mut self, label: &str, in_out: &mut [u8]) {
        self.keyed(OpCode::Crypt, label, in_out.len(), |duplex| duplex.encrypt(in_out));
    }

    /// Decrypts `in_out` in place, reversing [`Protocol::encrypt`].
    #[instrument(level = "trace", skip(self, in_out), fields(len = in_out.len()))]
    pub fn decrypt(&mut self, label: &str, in_out: &mut [u8]) {
        self.keyed(OpCode::Crypt, label, in_out.len(), |duplex| duplex.decrypt(in_out));
    }

    /// Masks `in_out` in place.
    ///
    /// Masking is unauthenticated encryption for data the caller authenticates by other
    /// means, typically a later [`Protocol::seal`] or [`Protocol::derive`] on the same
    /// transcript.
    #[instrument(level = "trace", skip(self, in_out), fields(len = in_out.len()))]
    pub fn mask(&mut self, label: &str, in_out: &mut [u8]) {
        self.keyed(OpCode::Mask, label, in_out.len(), |duplex| duplex.encrypt(in_out));
    }

    /// Unmasks `in_out` in place, reversing [`Protocol::mask`].
    #[instrument(level = "trace", skip(self, in_out), fields(len = in_out.len()))]
    pub fn unmask(&mut self, label: &str, in_out: &mut [u8]) {
        self.keyed(OpCode::Mask, label, in_out.len(), |duplex| duplex.decrypt(in_out));
    }

    /// Seals a plaintext in place.
    ///
    /// `in_out` holds the plaintext followed by [`TAG_LEN`] bytes of space for the tag;
    /// on return it holds the ciphertext followed by the tag.
    ///
    /// # Panics
    /// If `in_out` is shorter than [`TAG_LEN`].
    #[instrument(level = "trace", skip(self, in_out), fields(len = in_out.len()))]
    pub fn seal_in_place(&mut self, label: &str, in_out: &mut [u8]) {
        assert!(
            in_out.len() >= TAG_LEN,
            "seal buffer must have room for a {TAG_LEN}-byte tag"
        );
        let (plaintext, tag) = in_out.split_at_mut(in_out.len() - TAG_LEN);
        let len = plaintext.len();
        self.keyed(OpCode::AuthCrypt, label, len, |duplex| duplex.encrypt(plaintext));
        self.duplex.permute();
        self.duplex.squeeze(tag);
        self.duplex.permute();
    }

    /// Seals `plaintext`, returning the ciphertext followed by a [`TAG_LEN`]-byte tag.
    pub fn seal(&mut self, label: &str, plaintext: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(plaintext.len() + TAG_LEN);
        out.extend_from_slice(plaintext);
        out.resize(plaintext.len() + TAG_LEN, 0);
        self.seal_in_place(label, &mut out);
        out
    }

    /// Opens a sealed message in place, returning the plaintext prefix of `in_out`.
    ///
    /// The transcript advances whether or not the tag verifies.
    ///
    /// # Errors
    /// - [`Error::InvalidCiphertext`] if `in_out` is shorter than [`TAG_LEN`] or the tag does
    ///   not verify. In the latter case the whole of `in_out` is zeroed.
    #[instrument(level = "trace", skip(self, in_out), fields(len = in_out.len()))]
    pub fn open_in_place<'a>(
        &mut self,
        label: &str,
        in_out: &'a mut [u8],
    ) -> Result<&'a mut [u8], Error> {
        let Some(len) = in_out.len().checked_sub(TAG_LEN) else {
            debug!("rejected sealed message shorter than the tag");
            return Err(Error::InvalidCiphertext);
        };

        let (ciphertext, tag) = in_out.split_at_mut(len);
        self.keyed(OpCode::AuthCrypt, label, len, |duplex| duplex.decrypt(ciphertext));
        self.duplex.permute();
        let mut expected = [0u8; TAG_LEN];
        self.duplex.squeeze(&mut expected);
        self.duplex.permute();

        let valid = expected.as_slice().ct_eq(tag);
        expected.zeroize();
        if !bool::from(valid) {
            in_out.zeroize();
            debug!("authentication failed");
            return Err(Error::InvalidCiphertext);
        }
        Ok(&mut in_out[..len])
    }

    /// Opens the output of [`Protocol::seal`], returning the plaintext.
    ///
    /// # Errors
    /// - [`Error::InvalidCiphertext`] if the message is too short or the tag does not verify.
    pub fn open(&mut self, label: &str, sealed: &[u8]) -> Result<Vec<u8>, Error> {
        let mut buffer = sealed.to_vec();
        let len = self.open_in_place(label, &mut buffer)?.len();
        buffer.truncate(len);
        Ok(buffer)
    }

    /// Irreversibly erases part of the state, so that a compromise of the protocol after
    /// this call does not reveal outputs produced before it.
    #[instrument(level = "trace", skip(self))]
    pub fn ratchet(&mut self, label: &str) {
        self.begin(OpCode::Ratchet, label);
        self.duplex.ratchet();
    }

    /// Forks the protocol into `N` children, mixing one variant value into each.
    ///
    /// Children share this protocol's past but nothing else: each owns its own duplex
    /// state. The parent is left unchanged.
    pub fn fork<const N: usize>(&self, label: &str, variants: [&[u8]; N]) -> [Self; N] {
        array::from_fn(|i| {
            let mut child = self.clone();
            child.mix(label, variants[i]);
            child
        })
    }

    /// Forks the protocol into one child per variant, for a number of variants only known
    /// at runtime.
    pub fn fork_many<I, V>(&self, label: &str, variants: I) -> Vec<Self>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[u8]>,
    {
        variants
            .into_iter()
            .map(|variant| {
                let mut child = self.clone();
                child.mix(label, variant.as_ref());
                child
            })
            .collect()
    }

    /// Serializes the protocol state. See [`Duplex::to_bytes`].
    pub fn to_bytes(&self) -> [u8; SERIALIZED_LEN] {
        self.duplex.to_bytes()
    }

    /// Restores a protocol serialized with [`Protocol::to_bytes`].
    ///
    /// # Errors
    /// - [`Error::InvalidState`] if `bytes` is not a valid serialized state.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            duplex: Duplex::from_bytes(bytes)?,
        })
    }
}

impl<P: Permutation> ConstantTimeEq for Protocol<P> {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.duplex.ct_eq(&other.duplex)
    }
}

impl<P: Permutation> PartialEq for Protocol<P> {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl<P: Permutation> Eq for Protocol<P> {}

impl<P: Permutation> Zeroize for Protocol<P> {
    fn zeroize(&mut self) {
        self.duplex.zeroize();
    }
}
