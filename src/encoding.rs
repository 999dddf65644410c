//! Canonical length encodings.
//!
//! Every variable-length value absorbed by a [`crate::Protocol`] is framed by one of
//! the two encodings below, which makes the absorbed byte string uniquely decodable:
//! - [`left_encode`]: byte count `n`, then the `n` big-endian bytes of the value.
//! - [`right_encode`]: the `n` big-endian bytes of the value, then the byte count `n`.
//!
//! Zero is encoded with `n = 0`, i.e. as the single byte `0x00`.

/// Maximum encoded length: one count byte plus sixteen value bytes.
const MAX_LEN: usize = 1 + 16;

/// A length encoding held on the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Encoded {
    buf: [u8; MAX_LEN],
    len: usize,
}

impl AsRef<[u8]> for Encoded {
    fn as_ref(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// Returns the minimal big-endian representation of `value` and its length.
fn minimal_be(value: u128) -> ([u8; 16], usize) {
    let n = 16 - (value.leading_zeros() as usize / 8);
    (value.to_be_bytes(), n)
}

/// Encodes `value` as its byte count followed by its minimal big-endian bytes.
pub fn left_encode(value: u128) -> Encoded {
    let (be, n) = minimal_be(value);
    let mut buf = [0u8; MAX_LEN];
    buf[0] = n as u8;
    buf[1..=n].copy_from_slice(&be[16 - n..]);
    Encoded { buf, len: n + 1 }
}

/// Encodes `value` as its minimal big-endian bytes followed by their byte count.
pub fn right_encode(value: u128) -> Encoded {
    let (be, n) = minimal_be(value);
    let mut buf = [0u8; MAX_LEN];
    buf[..n].copy_from_slice(&be[16 - n..]);
    buf[n] = n as u8;
    Encoded { buf, len: n + 1 }
}

/// The length of a byte string in bits, as framed by the protocol.
#[inline]
pub(crate) fn bit_len(len: usize) -> u128 {
    len as u128 * 8
}
