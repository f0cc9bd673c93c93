// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! A sector-granular view over any seekable byte source.
//!
//! The engine never touches files directly; it sees a source as a grid of
//! `s`-byte *sectors* grouped into chunks of `c` sectors each. Anything
//! implementing [`std::io::Read`] + [`std::io::Seek`] qualifies: a
//! [`std::fs::File`], a [`std::io::Cursor`] over in-memory bytes, or a
//! caller-provided adapter.

use num_bigint::BigUint;
use std::io::{Read, Seek, SeekFrom};

/// Overlay viewing a byte source as `chunk_count x sectors_per_chunk`
/// sectors of `sector_size` bytes each.
#[derive(Debug)]
pub struct SectorView<R> {
    source: R,
    sector_size: u32,
    sectors_per_chunk: u32,
    len: u64,
}

impl<R: Read + Seek> SectorView<R> {
    /// Wrap `source`, measuring its length with a seek to the end.
    pub fn new(mut source: R, sector_size: u32, sectors_per_chunk: u32) -> std::io::Result<Self> {
        debug_assert!(sector_size > 0 && sectors_per_chunk > 0);
        let len = source.seek(SeekFrom::End(0))?;
        Ok(Self {
            source,
            sector_size,
            sectors_per_chunk,
            len,
        })
    }

    /// Total length of the underlying source in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the underlying source is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `ceil(len / (sector_size * sectors_per_chunk))`: the number of chunks,
    /// counting a trailing partial chunk as a whole one.
    pub fn chunk_count(&self) -> u64 {
        let chunk_size = self.sector_size as u64 * self.sectors_per_chunk as u64;
        self.len.div_ceil(chunk_size)
    }

    /// Read sector `(chunk, sector)` as a big-endian integer in
    /// `[0, 2^(8 * sector_size))`.
    ///
    /// A read that runs past end-of-file (including one that starts there)
    /// is right-padded with zero bytes to the full sector width; the padding
    /// is part of the protocol contract, not a convenience.
    pub fn sector(&mut self, chunk: u32, sector: u32) -> std::io::Result<BigUint> {
        let offset = chunk as u64 * self.sector_size as u64 * self.sectors_per_chunk as u64
            + sector as u64 * self.sector_size as u64;
        let mut buf = vec![0u8; self.sector_size as usize];
        if offset < self.len {
            self.source.seek(SeekFrom::Start(offset))?;
            let mut filled = 0;
            while filled < buf.len() {
                let read = self.source.read(&mut buf[filled..])?;
                if read == 0 {
                    break;
                }
                filled += read;
            }
        }
        Ok(BigUint::from_bytes_be(&buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn chunk_count_rounds_up() {
        let view = |len: usize| {
            SectorView::new(Cursor::new(vec![0u8; len]), 2, 10)
                .unwrap()
                .chunk_count()
        };
        assert_eq!(view(0), 0);
        assert_eq!(view(1), 1);
        assert_eq!(view(20), 1);
        assert_eq!(view(21), 2);
        assert_eq!(view(40), 2);
    }

    #[test]
    fn sectors_read_big_endian() {
        let mut view = SectorView::new(Cursor::new(vec![1, 2, 3, 4, 5, 6]), 2, 3).unwrap();
        assert_eq!(view.sector(0, 0).unwrap(), BigUint::from(0x0102u16));
        assert_eq!(view.sector(0, 1).unwrap(), BigUint::from(0x0304u16));
        assert_eq!(view.sector(0, 2).unwrap(), BigUint::from(0x0506u16));
    }

    #[test]
    fn short_tail_is_right_padded_with_zeros() {
        // 5 bytes with 2-byte sectors: the last sector is [5, 0].
        let mut view = SectorView::new(Cursor::new(vec![1, 2, 3, 4, 5]), 2, 3).unwrap();
        assert_eq!(view.sector(0, 2).unwrap(), BigUint::from(0x0500u16));
    }

    #[test]
    fn reads_past_the_end_are_zero() {
        let mut view = SectorView::new(Cursor::new(vec![1, 2]), 2, 3).unwrap();
        assert_eq!(view.sector(0, 1).unwrap(), BigUint::from(0u8));
        assert_eq!(view.sector(7, 0).unwrap(), BigUint::from(0u8));
    }
}
