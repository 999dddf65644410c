//! A keyed message authentication code.
//!
//! ```text
//! mac(k, m) = Init("duplex-transcript.mac"); Mix("key", k); Mix("message", m); Derive("tag", 16)
//! ```

use subtle::ConstantTimeEq;
use tracing::debug;

use crate::errors::Error;
use crate::protocol::Protocol;

/// Length of a MAC tag in bytes.
pub const MAC_LEN: usize = 16;

const DOMAIN: &str = "duplex-transcript.mac";

/// Incremental MAC over a single message.
#[derive(Clone, Debug)]
pub struct Mac {
    protocol: Protocol,
    len: u64,
}

impl Mac {
    /// Creates a MAC keyed with `key`.
    pub fn new(key: &[u8]) -> Self {
        let mut protocol = Protocol::new(DOMAIN);
        protocol.mix("key", key);
        protocol.begin_mix("message");
        Self { protocol, len: 0 }
    }

    /// Appends `data` to the message.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.protocol.absorb_chunk(data);
        self.len += data.len() as u64;
        self
    }

    /// Returns the tag of the message.
    pub fn finalize(mut self) -> [u8; MAC_LEN] {
        self.protocol.end(self.len);
        self.protocol.derive_array("tag")
    }

    /// Checks `tag` against the tag of the message in constant time.
    ///
    /// # Errors
    /// - [`Error::InvalidCiphertext`] if the tag does not match.
    pub fn verify(self, tag: &[u8]) -> Result<(), Error> {
        let expected = self.finalize();
        if bool::from(expected.as_slice().ct_eq(tag)) {
            Ok(())
        } else {
            debug!("mac verification failed");
            Err(Error::InvalidCiphertext)
        }
    }
}
