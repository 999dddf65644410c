//! A 256-bit hash function.
//!
//! `hash(m) = Init("duplex-transcript.hash"); Mix("message", m); Derive("digest", 32)`.

use crate::protocol::Protocol;

/// Length of a digest in bytes.
pub const DIGEST_LEN: usize = 32;

const DOMAIN: &str = "duplex-transcript.hash";

/// Incremental hasher.
///
/// Feeding a message in any number of [`Hasher::update`] calls produces the same digest
/// as [`hash`] over their concatenation.
#[derive(Clone, Debug)]
pub struct Hasher {
    protocol: Protocol,
    len: u64,
}

impl Hasher {
    /// Creates a hasher for a new message.
    pub fn new() -> Self {
        let mut protocol = Protocol::new(DOMAIN);
        protocol.begin_mix("message");
        Self { protocol, len: 0 }
    }

    /// Appends `data` to the message.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.protocol.absorb_chunk(data);
        self.len += data.len() as u64;
        self
    }

    /// Returns the digest of the message.
    pub fn finalize(mut self) -> [u8; DIGEST_LEN] {
        self.protocol.end(self.len);
        self.protocol.derive_array("digest")
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl std::io::Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Hashes `data` in one call.
pub fn hash(data: &[u8]) -> [u8; DIGEST_LEN] {
    let mut protocol = Protocol::new(DOMAIN);
    protocol.mix("message", data);
    protocol.derive_array("digest")
}
