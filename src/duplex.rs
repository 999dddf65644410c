//! Duplex construction over a Keccak-p\[1600\] permutation
//!
//! This module implements [`Duplex`], the state machine every [`crate::Protocol`]
//! operation is built from. The permutation state is split into:
//! - a **rate** region, `state[..RATE]`, which absorb/squeeze/encrypt/decrypt touch
//!   (data in `state[..MAX_RATE]`, the last two bytes reserved for framing and padding),
//! - a **capacity** region, `state[RATE..]`, which only the permutation reads or writes.
//!
//! All byte-range operations are concatenation-invariant: calling one with `a` and then
//! with `b` is indistinguishable from calling it once with `a ‖ b`.

use core::fmt;
use core::marker::PhantomData;

use subtle::{Choice, ConstantTimeEq};
use tracing::debug;
use zeroize::Zeroize;

use crate::errors::Error;
use crate::permutation::{KeccakF1600, Permutation, State, WIDTH};

/// Size of the capacity region in bytes (256 bits).
pub const CAPACITY: usize = 32;

/// Size of the rate region in bytes.
pub const RATE: usize = WIDTH - CAPACITY;

/// Number of rate bytes available to data before a permutation is forced.
pub const MAX_RATE: usize = RATE - 2;

/// Length of the serialized form: `position ‖ frame ‖ state`.
pub const SERIALIZED_LEN: usize = WIDTH + 2;

const _: () = assert!(MAX_RATE < 256, "pointers must serialize as one byte");
const _: () = assert!(CAPACITY < MAX_RATE, "ratchet must fit in the rate");

const PAD_FIRST: u8 = 0x01;
const PAD_LAST: u8 = 0x80;

/// Duplex construction with framing, generic over the [`Permutation`].
///
/// Between calls, both `position` and `frame` are strictly below [`MAX_RATE`] and
/// `frame <= position`: a full rate window is permuted as soon as it fills.
#[derive(Clone, Default)]
pub struct Duplex<P: Permutation = KeccakF1600> {
    state: State,
    position: usize,
    frame: usize,
    _permutation: PhantomData<P>,
}

impl<P: Permutation> Duplex<P> {
    /// Creates a duplex with an all-zero state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current offset into the rate region.
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    fn advance(&mut self, n: usize) {
        self.position += n;
        if self.position == MAX_RATE {
            self.permute();
        }
    }

    #[inline]
    fn remaining(&self) -> usize {
        MAX_RATE - self.position
    }

    /// XORs `input` into the rate, permuting whenever the window fills.
    pub fn absorb(&mut self, mut input: &[u8]) {
        while !input.is_empty() {
            let chunk_size = usize::min(self.remaining(), input.len());
            let dest = &mut self.state.as_mut()[self.position..self.position + chunk_size];
            for (d, s) in dest.iter_mut().zip(&input[..chunk_size]) {
                *d ^= s;
            }
            self.advance(chunk_size);
            input = &input[chunk_size..];
        }
    }

    /// Copies bytes out of the rate into `output`, permuting when the window is exhausted.
    pub fn squeeze(&mut self, output: &mut [u8]) {
        let mut offset = 0;
        while offset < output.len() {
            let chunk_size = usize::min(self.remaining(), output.len() - offset);
            output[offset..offset + chunk_size]
                .copy_from_slice(&self.state.as_ref()[self.position..self.position + chunk_size]);
            self.advance(chunk_size);
            offset += chunk_size;
        }
    }

    /// Encrypts `in_out` in place: each byte is XORed with the rate, and the rate is
    /// overwritten with the resulting ciphertext.
    pub fn encrypt(&mut self, in_out: &mut [u8]) {
        let mut offset = 0;
        while offset < in_out.len() {
            let chunk_size = usize::min(self.remaining(), in_out.len() - offset);
            let rate = &mut self.state.as_mut()[self.position..self.position + chunk_size];
            for (r, b) in rate.iter_mut().zip(&mut in_out[offset..offset + chunk_size]) {
                *b ^= *r;
                *r = *b;
            }
            self.advance(chunk_size);
            offset += chunk_size;
        }
    }

    /// Decrypts `in_out` in place: each byte is XORed with the rate, and the rate is
    /// overwritten with the ciphertext byte read before it was replaced.
    pub fn decrypt(&mut self, in_out: &mut [u8]) {
        let mut offset = 0;
        while offset < in_out.len() {
            let chunk_size = usize::min(self.remaining(), in_out.len() - offset);
            let rate = &mut self.state.as_mut()[self.position..self.position + chunk_size];
            for (r, b) in rate.iter_mut().zip(&mut in_out[offset..offset + chunk_size]) {
                let ciphertext = *b;
                *b ^= *r;
                *r = ciphertext;
            }
            self.advance(chunk_size);
            offset += chunk_size;
        }
    }

    /// Pads the rate with the frame marker and `pad10*1`, applies the permutation, and
    /// resets both pointers.
    pub fn permute(&mut self) {
        let (position, frame) = (self.position, self.frame as u8);
        let state = self.state.as_mut();
        state[position] ^= frame;
        state[position + 1] ^= PAD_FIRST;
        state[RATE - 1] ^= PAD_LAST;
        P::permute(&mut self.state);
        self.position = 0;
        self.frame = 0;
    }

    /// Starts a new frame: absorbs the previous frame marker and records the current
    /// position as the start of this one.
    pub fn frame(&mut self) {
        let previous = self.frame as u8;
        self.absorb(&[previous]);
        self.frame = self.position;
    }

    /// Irreversibly erases [`CAPACITY`] bytes of state.
    ///
    /// Pending rate bytes are permuted first, then the first `CAPACITY` bytes of the rate
    /// are zeroed and skipped. Recovering the prior state requires guessing them.
    pub fn ratchet(&mut self) {
        if self.position > 0 {
            self.permute();
        }
        self.state.as_mut()[..CAPACITY].fill(0);
        self.position = CAPACITY;
    }

    /// Serializes the duplex as `position ‖ frame ‖ state`.
    pub fn to_bytes(&self) -> [u8; SERIALIZED_LEN] {
        let mut out = [0u8; SERIALIZED_LEN];
        out[0] = self.position as u8;
        out[1] = self.frame as u8;
        out[2..].copy_from_slice(self.state.as_ref());
        out
    }

    /// Deserializes a duplex produced by [`Duplex::to_bytes`].
    ///
    /// # Errors
    /// - [`Error::InvalidState`] if `bytes` is not [`SERIALIZED_LEN`] long, if either pointer
    ///   is at or beyond [`MAX_RATE`], or if the frame starts after the position.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != SERIALIZED_LEN {
            debug!(len = bytes.len(), "rejected duplex state: bad length");
            return Err(Error::InvalidState);
        }
        let (position, frame) = (bytes[0] as usize, bytes[1] as usize);
        if position >= MAX_RATE || frame >= MAX_RATE || frame > position {
            debug!(position, frame, "rejected duplex state: pointers out of range");
            return Err(Error::InvalidState);
        }

        let mut state = State::default();
        state.as_mut().copy_from_slice(&bytes[2..]);
        Ok(Self {
            state,
            position,
            frame,
            _permutation: PhantomData,
        })
    }
}

impl<P: Permutation> TryFrom<&[u8]> for Duplex<P> {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl<P: Permutation> ConstantTimeEq for Duplex<P> {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.state.as_ref().ct_eq(other.state.as_ref())
            & (self.position as u64).ct_eq(&(other.position as u64))
            & (self.frame as u64).ct_eq(&(other.frame as u64))
    }
}

impl<P: Permutation> PartialEq for Duplex<P> {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl<P: Permutation> Eq for Duplex<P> {}

impl<P: Permutation> Zeroize for Duplex<P> {
    fn zeroize(&mut self) {
        self.state.zeroize();
        self.position = 0;
        self.frame = 0;
    }
}

impl<P: Permutation> fmt::Debug for Duplex<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Duplex")
            .field("permutation", &P::default())
            .field("position", &self.position)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}
