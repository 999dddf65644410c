//! Keccak-p\[1600\] permutation backends
//!
//! This module defines the fixed-width [`State`] the duplex operates on and the
//! [`Permutation`] trait selecting the nonlinear core applied to it.
//!
//! Two backends are provided, both over the same 200-byte state:
//! - [`KeccakF1600`]: the full 24-round Keccak-f\[1600\] (the default).
//! - [`Keccak12`]: the 12-round Keccak-p\[1600, 12\] used by TurboSHAKE and KangarooTwelve.
//!
//! CPU-specific dispatch lives in the `keccak` crate: with the `asm` feature it probes
//! for the ARMv8 SHA-3 extensions once and falls back to the portable implementation.

use zerocopy::IntoBytes;
use zeroize::Zeroize;

/// Width of the permutation state in bytes.
pub const WIDTH: usize = 200;

const LANES: usize = WIDTH / 8;

/// Low-level Keccak-p\[1600\] state representation.
///
/// Lanes are stored little-endian so that the byte view is identical on every host.
#[derive(Clone, Default)]
pub struct State([u64; LANES]);

impl State {
    /// Applies `f` to the lanes in native byte order.
    #[inline]
    fn with_lanes(&mut self, f: impl FnOnce(&mut [u64; LANES])) {
        for lane in self.0.iter_mut() {
            *lane = u64::from_le(*lane);
        }
        f(&mut self.0);
        for lane in self.0.iter_mut() {
            *lane = lane.to_le();
        }
    }
}

impl Zeroize for State {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl AsRef<[u8]> for State {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl AsMut<[u8]> for State {
    fn as_mut(&mut self) -> &mut [u8] {
        self.0.as_mut_bytes()
    }
}

/// A fixed, keyless permutation over a [`State`].
///
/// Implementations must be deterministic and free of side effects, so that they may be
/// invoked concurrently on disjoint states.
pub trait Permutation: Clone + Copy + Default + core::fmt::Debug {
    /// Permutes the state in place.
    fn permute(state: &mut State);
}

/// The Keccak-f\[1600\] permutation (24 rounds).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeccakF1600;

impl Permutation for KeccakF1600 {
    #[inline]
    fn permute(state: &mut State) {
        state.with_lanes(keccak::f1600);
    }
}

/// The Keccak-p\[1600, 12\] permutation (the last 12 rounds of Keccak-f\[1600\]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Keccak12;

impl Permutation for Keccak12 {
    #[inline]
    fn permute(state: &mut State) {
        state.with_lanes(|lanes| keccak::p1600(lanes, 12));
    }
}
