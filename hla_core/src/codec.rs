// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Length-prefixed big-endian framing shared by every artifact.
//!
//! Each artifact is a flat concatenation of fields, where variable-length
//! fields are prefixed by their byte length as a `u32` big-endian word. There
//! are no magic numbers and no version bytes; the only self-description on
//! the wire is the lengths themselves.

pub use crate::errors::CodecError;

use crate::field;
use num_bigint::BigUint;

/// Incremental writer for the wire format, backed by a byte vector.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append a `u32` in big-endian byte order.
    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Append raw bytes with no length prefix.
    pub fn put_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a length-prefixed byte block: `u32 len || bytes`.
    pub fn put_block(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.len() <= u32::MAX as usize);
        self.put_u32(bytes.len() as u32);
        self.put_raw(bytes);
    }

    /// Append a length-prefixed big integer in its minimum-byte big-endian
    /// encoding. Zero is written as a bare zero-length prefix.
    pub fn put_uint(&mut self, x: &BigUint) {
        let width = field::min_encoded_size(x);
        self.put_u32(width as u32);
        self.put_raw(&field::encode(x, width));
    }

    /// Consume the writer and return the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a byte slice for parsing the wire format. Every read checks
/// the remaining length and fails with [`CodecError::Truncated`] rather than
/// running off the end.
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Wrap a byte slice for reading from its start.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::Truncated {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Read a big-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        let bytes = self.take(4)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(bytes);
        Ok(u32::from_be_bytes(word))
    }

    /// Read exactly `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        self.take(n)
    }

    /// Read a length-prefixed byte block.
    pub fn read_block(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }

    /// Read a length-prefixed big integer.
    pub fn read_uint(&mut self) -> Result<BigUint, CodecError> {
        Ok(field::decode(self.read_block()?))
    }
}

/// Deterministic binary serialization implemented by every artifact.
pub trait Wire: Sized {
    /// Append this artifact's wire form to `writer`.
    fn write_into(&self, writer: &mut ByteWriter) -> Result<(), CodecError>;

    /// Parse one artifact from the reader, consuming exactly its bytes.
    fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, CodecError>;

    /// Serialize to a fresh byte vector.
    fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = ByteWriter::new();
        self.write_into(&mut writer)?;
        Ok(writer.into_bytes())
    }

    /// Parse an artifact occupying the whole input. Trailing bytes are an
    /// error so that `to_bytes` and `from_bytes` are exact inverses.
    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = ByteReader::new(bytes);
        let parsed = Self::read_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(CodecError::TrailingBytes(reader.remaining()));
        }
        Ok(parsed)
    }
}
