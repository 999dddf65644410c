//! Streaming adapters over `std::io`.
//!
//! Each adapter borrows a [`Protocol`] exclusively for the duration of one Mix or Crypt
//! operation, forwards bytes to or from a wrapped sink/source, and folds them into the
//! transcript as the I/O calls report them delivered.
//!
//! The length trailer of the operation is absorbed when the adapter is closed, either
//! explicitly with `close()` or implicitly when it is dropped. Either way it happens on
//! every exit path, including early returns on I/O errors.
//!
//! A streamed operation leaves the transcript in exactly the state the equivalent one-shot
//! [`Protocol::mix`], [`Protocol::encrypt`] or [`Protocol::decrypt`] would.

use std::io::{self, Read, Write};
use std::vec::Vec;

use tracing::debug;
use zeroize::Zeroize;

use crate::permutation::{KeccakF1600, Permutation};
use crate::protocol::{Direction, Protocol};

/// Writes to an inner sink while mixing every written byte into a transcript.
#[derive(Debug)]
pub struct MixWriter<'a, W: Write, P: Permutation = KeccakF1600> {
    protocol: &'a mut Protocol<P>,
    inner: W,
    count: u64,
    closed: bool,
}

impl<W: Write, P: Permutation> MixWriter<'_, W, P> {
    /// Returns a reference to the inner sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Number of bytes mixed so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Ends the Mix operation.
    pub fn close(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if !self.closed {
            self.closed = true;
            self.protocol.end(self.count);
            debug!(count = self.count, "closed mix writer");
        }
    }
}

impl<W: Write, P: Permutation> Write for MixWriter<'_, W, P> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.protocol.absorb_chunk(&buf[..n]);
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write, P: Permutation> Drop for MixWriter<'_, W, P> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Reads from an inner source while mixing every read byte into a transcript.
#[derive(Debug)]
pub struct MixReader<'a, R: Read, P: Permutation = KeccakF1600> {
    protocol: &'a mut Protocol<P>,
    inner: R,
    count: u64,
    closed: bool,
}

impl<R: Read, P: Permutation> MixReader<'_, R, P> {
    /// Returns a reference to the inner source.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Number of bytes mixed so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Ends the Mix operation.
    pub fn close(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if !self.closed {
            self.closed = true;
            self.protocol.end(self.count);
            debug!(count = self.count, "closed mix reader");
        }
    }
}

impl<R: Read, P: Permutation> Read for MixReader<'_, R, P> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.protocol.absorb_chunk(&buf[..n]);
        self.count += n as u64;
        Ok(n)
    }
}

impl<R: Read, P: Permutation> Drop for MixReader<'_, R, P> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Encrypts or decrypts bytes on their way to an inner sink.
///
/// Each write is transformed on a scratch copy of the duplex; only the bytes the sink
/// accepts are then applied to the transcript, so partial writes and errors never advance
/// it past what was delivered.
#[derive(Debug)]
pub struct CryptWriter<'a, W: Write, P: Permutation = KeccakF1600> {
    protocol: &'a mut Protocol<P>,
    inner: W,
    direction: Direction,
    scratch: Vec<u8>,
    count: u64,
    closed: bool,
}

impl<W: Write, P: Permutation> CryptWriter<'_, W, P> {
    /// Returns a reference to the inner sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Number of bytes transformed so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Ends the Crypt operation.
    pub fn close(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if !self.closed {
            self.closed = true;
            self.scratch.zeroize();
            self.protocol.end(self.count);
            debug!(count = self.count, direction = ?self.direction, "closed crypt writer");
        }
    }
}

impl<W: Write, P: Permutation> Write for CryptWriter<'_, W, P> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.scratch.clear();
        self.scratch.extend_from_slice(buf);
        let mut probe = self.protocol.duplex().clone();
        self.direction.apply(&mut probe, &mut self.scratch);

        let n = self.inner.write(&self.scratch)?;
        if n == buf.len() {
            *self.protocol.duplex_mut() = probe;
        } else {
            probe.zeroize();
            self.scratch.clear();
            self.scratch.extend_from_slice(&buf[..n]);
            self.direction.apply(self.protocol.duplex_mut(), &mut self.scratch);
        }
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write, P: Permutation> Drop for CryptWriter<'_, W, P> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Encrypts or decrypts bytes read from an inner source.
#[derive(Debug)]
pub struct CryptReader<'a, R: Read, P: Permutation = KeccakF1600> {
    protocol: &'a mut Protocol<P>,
    inner: R,
    direction: Direction,
    count: u64,
    closed: bool,
}

impl<R: Read, P: Permutation> CryptReader<'_, R, P> {
    /// Returns a reference to the inner source.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Number of bytes transformed so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Ends the Crypt operation.
    pub fn close(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if !self.closed {
            self.closed = true;
            self.protocol.end(self.count);
            debug!(count = self.count, direction = ?self.direction, "closed crypt reader");
        }
    }
}

impl<R: Read, P: Permutation> Read for CryptReader<'_, R, P> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.direction.apply(self.protocol.duplex_mut(), &mut buf[..n]);
        self.count += n as u64;
        Ok(n)
    }
}

impl<R: Read, P: Permutation> Drop for CryptReader<'_, R, P> {
    fn drop(&mut self) {
        self.finish();
    }
}

impl<P: Permutation> Protocol<P> {
    /// Begins a streaming Mix operation whose input is everything written to the returned
    /// writer, which forwards it to `sink`.
    pub fn mix_writer<W: Write>(&mut self, label: &str, sink: W) -> MixWriter<'_, W, P> {
        self.begin_mix(label);
        MixWriter {
            protocol: self,
            inner: sink,
            count: 0,
            closed: false,
        }
    }

    /// Begins a streaming Mix operation whose input is everything read through the
    /// returned reader from `source`.
    pub fn mix_reader<R: Read>(&mut self, label: &str, source: R) -> MixReader<'_, R, P> {
        self.begin_mix(label);
        MixReader {
            protocol: self,
            inner: source,
            count: 0,
            closed: false,
        }
    }

    /// Begins a streaming Crypt operation that transforms bytes written to the returned
    /// writer before forwarding them to `sink`.
    pub fn crypt_writer<W: Write>(
        &mut self,
        label: &str,
        direction: Direction,
        sink: W,
    ) -> CryptWriter<'_, W, P> {
        self.begin_crypt(label);
        CryptWriter {
            protocol: self,
            inner: sink,
            direction,
            scratch: Vec::new(),
            count: 0,
            closed: false,
        }
    }

    /// Begins a streaming Crypt operation that transforms bytes read from `source`.
    pub fn crypt_reader<R: Read>(
        &mut self,
        label: &str,
        direction: Direction,
        source: R,
    ) -> CryptReader<'_, R, P> {
        self.begin_crypt(label);
        CryptReader {
            protocol: self,
            inner: source,
            direction,
            count: 0,
            closed: false,
        }
    }

    /// Runs `body` with a [`MixWriter`] and closes it afterwards, whatever `body` returns.
    ///
    /// # Errors
    /// Returns the error produced by `body`, unchanged.
    pub fn with_mix_writer<W, T, F>(&mut self, label: &str, sink: W, body: F) -> io::Result<T>
    where
        W: Write,
        F: FnOnce(&mut MixWriter<'_, W, P>) -> io::Result<T>,
    {
        let mut writer = self.mix_writer(label, sink);
        let result = body(&mut writer);
        writer.close();
        result
    }

    /// Runs `body` with a [`MixReader`] and closes it afterwards, whatever `body` returns.
    ///
    /// # Errors
    /// Returns the error produced by `body`, unchanged.
    pub fn with_mix_reader<R, T, F>(&mut self, label: &str, source: R, body: F) -> io::Result<T>
    where
        R: Read,
        F: FnOnce(&mut MixReader<'_, R, P>) -> io::Result<T>,
    {
        let mut reader = self.mix_reader(label, source);
        let result = body(&mut reader);
        reader.close();
        result
    }

    /// Runs `body` with a [`CryptWriter`] and closes it afterwards, whatever `body` returns.
    ///
    /// # Errors
    /// Returns the error produced by `body`, unchanged.
    pub fn with_crypt_writer<W, T, F>(
        &mut self,
        label: &str,
        direction: Direction,
        sink: W,
        body: F,
    ) -> io::Result<T>
    where
        W: Write,
        F: FnOnce(&mut CryptWriter<'_, W, P>) -> io::Result<T>,
    {
        let mut writer = self.crypt_writer(label, direction, sink);
        let result = body(&mut writer);
        writer.close();
        result
    }

    /// Runs `body` with a [`CryptReader`] and closes it afterwards, whatever `body` returns.
    ///
    /// # Errors
    /// Returns the error produced by `body`, unchanged.
    pub fn with_crypt_reader<R, T, F>(
        &mut self,
        label: &str,
        direction: Direction,
        source: R,
        body: F,
    ) -> io::Result<T>
    where
        R: Read,
        F: FnOnce(&mut CryptReader<'_, R, P>) -> io::Result<T>,
    {
        let mut reader = self.crypt_reader(label, direction, source);
        let result = body(&mut reader);
        reader.close();
        result
    }
}
