// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The artifact value types exchanged between the verifier and the storage
//! server:
//!
//! 1. [`Tag`] — per-chunk authenticators, stored at the server
//! 2. [`Challenge`] — a compact sampling specification, verifier → server
//! 3. [`Proof`] — the aggregated response, server → verifier
//!
//! The verifier state lives in [`crate::state`] since it additionally carries
//! the sealing envelope.

use crate::codec::{ByteReader, ByteWriter, CodecError, Wire};
use crate::prf::Prf;
use num_bigint::BigUint;

/// The file tag: one field-element authenticator per chunk, in chunk order.
/// Produced by the encoding step, shipped to the server alongside the file,
/// and consumed when generating proofs. The tag is public data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    /// The authenticators `sigma[0..n)`, where `n` is the chunk count of the
    /// encoded file.
    pub sigma: Vec<BigUint>,
}

impl Tag {
    /// Number of chunks this tag authenticates.
    pub fn chunk_count(&self) -> usize {
        self.sigma.len()
    }
}

impl Wire for Tag {
    fn write_into(&self, writer: &mut ByteWriter) -> Result<(), CodecError> {
        debug_assert!(self.sigma.len() <= u32::MAX as usize);
        writer.put_u32(self.sigma.len() as u32);
        for sigma_i in &self.sigma {
            writer.put_uint(sigma_i);
        }
        Ok(())
    }

    fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let count = reader.read_u32()?;
        let mut sigma = Vec::with_capacity(count as usize);
        for _ in 0..count {
            sigma.push(reader.read_uint()?);
        }
        Ok(Self { sigma })
    }
}

/// A challenge posed to the server: sample `l` chunks and aggregate them
/// under pseudorandom coefficients.
///
/// Only `(l, key, coefficient_limit)` travel on the wire. The coefficient
/// stream is `PRF(key, coefficient_limit)`; the index stream re-uses the
/// *same key* under a different limit — the chunk count — which each peer
/// binds from its own view at use time (the prover from the file it holds,
/// the verifier from the state). The two streams are distinguished only by
/// their reductions; peers using a domain-separated variant of this format
/// are incompatible and must not be mixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    chunks: u32,
    key: Vec<u8>,
    coefficient_limit: BigUint,
}

impl Challenge {
    /// Assemble a challenge from its parts: the number of sampled chunks
    /// `l`, the PRF key, and the exclusive coefficient bound `B`.
    pub fn new(chunks: u32, key: impl Into<Vec<u8>>, coefficient_limit: BigUint) -> Self {
        Self {
            chunks,
            key: key.into(),
            coefficient_limit,
        }
    }

    /// `l`: how many chunk samples the server must aggregate.
    pub fn chunks(&self) -> u32 {
        self.chunks
    }

    /// The challenge PRF key shared by the coefficient and index streams.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// `B`: the exclusive upper bound of the coefficient stream.
    pub fn coefficient_limit(&self) -> &BigUint {
        &self.coefficient_limit
    }

    /// The coefficient stream `v = PRF(key, B)`.
    pub fn coefficient_prf(&self) -> Prf {
        Prf::new(self.key.clone(), self.coefficient_limit.clone())
    }

    /// The index stream `PRF(key, chunk_count)`, bound to the caller's own
    /// view of the chunk count.
    pub fn index_prf(&self, chunk_count: u32) -> Prf {
        Prf::new(self.key.clone(), BigUint::from(chunk_count))
    }
}

impl Wire for Challenge {
    fn write_into(&self, writer: &mut ByteWriter) -> Result<(), CodecError> {
        writer.put_u32(self.chunks);
        writer.put_block(&self.key);
        writer.put_uint(&self.coefficient_limit);
        Ok(())
    }

    fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let chunks = reader.read_u32()?;
        let key = reader.read_block()?.to_vec();
        let coefficient_limit = reader.read_uint()?;
        Ok(Self {
            chunks,
            key,
            coefficient_limit,
        })
    }
}

/// The server's response to a [`Challenge`]: one aggregate per sector
/// position plus the aggregate authenticator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Proof {
    /// Per-sector aggregates `mu[0..c)`.
    pub mu: Vec<BigUint>,
    /// The aggregate authenticator `sigma`.
    pub sigma: BigUint,
}

impl Wire for Proof {
    fn write_into(&self, writer: &mut ByteWriter) -> Result<(), CodecError> {
        debug_assert!(self.mu.len() <= u32::MAX as usize);
        writer.put_u32(self.mu.len() as u32);
        for mu_j in &self.mu {
            writer.put_uint(mu_j);
        }
        writer.put_uint(&self.sigma);
        Ok(())
    }

    fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let count = reader.read_u32()?;
        let mut mu = Vec::with_capacity(count as usize);
        for _ in 0..count {
            mu.push(reader.read_uint()?);
        }
        let sigma = reader.read_uint()?;
        Ok(Self { mu, sigma })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;

    #[test]
    fn tag_wire_form_is_byte_exact() {
        let tag = Tag {
            sigma: vec![BigUint::from(5u8), BigUint::zero(), BigUint::from(0x0203u16)],
        };
        let bytes = tag.to_bytes().unwrap();
        assert_eq!(
            bytes,
            vec![
                0, 0, 0, 3, // n = 3
                0, 0, 0, 1, 5, // sigma_0 = 5
                0, 0, 0, 0, // sigma_1 = 0, zero bytes
                0, 0, 0, 2, 2, 3, // sigma_2 = 0x0203
            ]
        );
        assert_eq!(hex::encode(&bytes), "00000003000000010500000000000000020203");
        assert_eq!(Tag::from_bytes(&bytes).unwrap(), tag);
    }

    #[test]
    fn challenge_round_trips() {
        let challenge = Challenge::new(41, vec![0xab; 32], BigUint::from(1_000_003u32));
        let bytes = challenge.to_bytes().unwrap();
        // u32 l || u32 k_len || key || u32 B_len || B
        assert_eq!(bytes.len(), 4 + 4 + 32 + 4 + 3);
        assert_eq!(Challenge::from_bytes(&bytes).unwrap(), challenge);
    }

    #[test]
    fn proof_round_trips_with_zero_elements() {
        let proof = Proof {
            mu: vec![BigUint::zero(), BigUint::from(77u8)],
            sigma: BigUint::zero(),
        };
        let bytes = proof.to_bytes().unwrap();
        assert_eq!(Proof::from_bytes(&bytes).unwrap(), proof);
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let tag = Tag {
            sigma: vec![BigUint::from(1u8)],
        };
        let mut bytes = tag.to_bytes().unwrap();
        bytes.push(0);
        assert!(matches!(
            Tag::from_bytes(&bytes),
            Err(CodecError::TrailingBytes(1))
        ));
    }

    #[test]
    fn challenge_streams_share_the_key() {
        let challenge = Challenge::new(8, vec![0x11; 32], BigUint::from(257u16));
        assert_eq!(challenge.coefficient_prf().key(), challenge.key());
        assert_eq!(challenge.index_prf(8).key(), challenge.key());
        assert_eq!(
            challenge.index_prf(8).limit(),
            &BigUint::from(8u8)
        );
    }
}
