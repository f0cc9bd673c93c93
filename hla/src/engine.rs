// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Implementation of the proof-of-storage engine.
//!
//! An [`Engine`] bundles the scheme parameters `(p, c, s)` with, on the
//! verifier side, the two secret keys sealing the verifier state. The
//! protocol is driven entirely through its methods:
//!
//! - the client runs [`Engine::encode`] over a file and ships the resulting
//!   tag and sealed state to the server, together with the engine's
//!   [public view](Engine::public_view);
//! - to audit, the client runs [`Engine::gen_challenge`] against the sealed
//!   state fetched back from the server and ships the challenge;
//! - the server answers with [`Engine::prove`] — which needs no secrets —
//!   over the file, the challenge, and the stored tag;
//! - the client accepts or rejects via [`Engine::verify`].

use crate::errors::HlaError;
use crate::sector::SectorView;
use hla_core::codec::{ByteReader, ByteWriter, CodecError};
use hla_core::errors::StateError;
use hla_core::prf::Prf;
use hla_core::{field, Challenge, OpenState, Proof, State, Tag, KEY_SIZE};
use log::debug;
use num_bigint::{BigUint, RandPrime};
use num_traits::{ToPrimitive, Zero};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use std::io::{Read, Seek};
use zeroize::Zeroize;

/// Default byte width of the prime parameter (128 bits).
pub const DEFAULT_PRIME_SIZE_BYTES: usize = 16;
/// Default number of sectors per chunk. More sectors shrink the tag the
/// server must store but grow every proof by one field element.
pub const DEFAULT_SECTORS_PER_CHUNK: u32 = 10;

/// The pair of secrets a verifier-side engine carries: the state encryption
/// key and the state MAC key. Zeroized on drop.
struct SecretKeys {
    k_enc: [u8; KEY_SIZE],
    k_mac: [u8; KEY_SIZE],
}

impl Drop for SecretKeys {
    fn drop(&mut self) {
        self.k_enc.zeroize();
        self.k_mac.zeroize();
    }
}

impl Clone for SecretKeys {
    fn clone(&self) -> Self {
        Self {
            k_enc: self.k_enc,
            k_mac: self.k_mac,
        }
    }
}

impl PartialEq for SecretKeys {
    fn eq(&self, other: &Self) -> bool {
        self.k_enc == other.k_enc && self.k_mac == other.k_mac
    }
}

impl Eq for SecretKeys {}

impl core::fmt::Debug for SecretKeys {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SecretKeys(..)")
    }
}

/// The proof-of-storage engine; see the [module docs](self) for the protocol
/// walkthrough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Engine {
    secrets: Option<SecretKeys>,
    prime: BigUint,
    sectors_per_chunk: u32,
    sector_size: u32,
}

impl Engine {
    /// Generate a fresh engine with the default parameters and the system
    /// RNG.
    pub fn generate_default() -> Result<Self, HlaError> {
        Self::generate(DEFAULT_PRIME_SIZE_BYTES, DEFAULT_SECTORS_PER_CHUNK)
    }

    /// Generate a fresh engine: two 32-byte secrets and a random prime of
    /// `prime_size_bytes` bytes, using the system RNG.
    pub fn generate(prime_size_bytes: usize, sectors_per_chunk: u32) -> Result<Self, HlaError> {
        Self::generate_with_rng(&mut OsRng, prime_size_bytes, sectors_per_chunk)
    }

    /// Generate a fresh engine drawing all randomness from `rng`.
    pub fn generate_with_rng<R: RngCore + CryptoRng>(
        rng: &mut R,
        prime_size_bytes: usize,
        sectors_per_chunk: u32,
    ) -> Result<Self, HlaError> {
        if sectors_per_chunk == 0 {
            return Err(HlaError::Parameter(
                "sectors_per_chunk must be nonzero".to_string(),
            ));
        }
        // The sector width is an eighth of the prime width; anything below
        // 8 prime bytes would leave zero-byte sectors.
        if prime_size_bytes < 8 {
            return Err(HlaError::Parameter(format!(
                "prime_size_bytes must be at least 8, got {prime_size_bytes}"
            )));
        }

        let mut k_enc = [0u8; KEY_SIZE];
        let mut k_mac = [0u8; KEY_SIZE];
        rng.fill_bytes(&mut k_enc);
        rng.fill_bytes(&mut k_mac);

        let prime = rng.gen_prime(prime_size_bytes * 8);
        // A sector must stay well below the prime, otherwise a malicious
        // server could store sectors reduced modulo p without detection.
        let sector_size = (field::min_encoded_size(&prime) / 8) as u32;
        debug!(
            "generated engine: {}-bit prime, {sectors_per_chunk} sectors of {sector_size} bytes",
            prime.bits()
        );

        Ok(Self {
            secrets: Some(SecretKeys { k_enc, k_mac }),
            prime,
            sectors_per_chunk,
            sector_size,
        })
    }

    /// The engine stripped of its secrets, safe to hand to the server. The
    /// public view can [prove](Engine::prove) but cannot encode, challenge,
    /// or verify.
    pub fn public_view(&self) -> Self {
        Self {
            secrets: None,
            prime: self.prime.clone(),
            sectors_per_chunk: self.sectors_per_chunk,
            sector_size: self.sector_size,
        }
    }

    /// Whether this engine is a public view (no secret keys).
    pub fn is_public(&self) -> bool {
        self.secrets.is_none()
    }

    /// The prime parameter defining the field.
    pub fn prime(&self) -> &BigUint {
        &self.prime
    }

    /// The number of sectors per chunk, `c`.
    pub fn sectors_per_chunk(&self) -> u32 {
        self.sectors_per_chunk
    }

    /// The sector width in bytes, `s`.
    pub fn sector_size(&self) -> u32 {
        self.sector_size
    }

    fn secret_keys(&self, op: &'static str) -> Result<&SecretKeys, HlaError> {
        self.secrets.as_ref().ok_or(HlaError::SecretsRequired(op))
    }

    /// Open a state with this engine's keys; an already-open state passes
    /// through unchanged.
    fn open_state(&self, op: &'static str, state: &State) -> Result<OpenState, HlaError> {
        let keys = self.secret_keys(op)?;
        match state {
            State::Open(open) => Ok(open.clone()),
            State::Sealed(sealed) => Ok(sealed.open(&keys.k_enc, &keys.k_mac)?),
        }
    }

    /// Tag `file` for later auditing, using the system RNG.
    ///
    /// Returns the tag and the sealed verifier state; both are meant to be
    /// shipped to the server (neither reveals anything useful to it).
    pub fn encode<F: Read + Seek>(&self, file: F) -> Result<(Tag, State), HlaError> {
        self.encode_with_rng(&mut OsRng, file)
    }

    /// Tag `file`, drawing the state keys and the sealing IV from `rng`.
    pub fn encode_with_rng<R: RngCore + CryptoRng, F: Read + Seek>(
        &self,
        rng: &mut R,
        file: F,
    ) -> Result<(Tag, State), HlaError> {
        let secrets = self.secret_keys("encode")?;
        let mut view = SectorView::new(file, self.sector_size, self.sectors_per_chunk)?;
        let chunk_count: u32 = view.chunk_count().try_into().map_err(|_| {
            HlaError::Parameter("file exceeds the PRF domain of 2^32 chunks".to_string())
        })?;
        debug!(
            "encoding {chunk_count} chunks of {} sectors",
            self.sectors_per_chunk
        );

        let open = OpenState::random(rng, chunk_count);
        let mask = open.mask_prf(&self.prime);
        let coefficients = open.coefficient_prf(&self.prime);

        let mut sigma = Vec::with_capacity(chunk_count as usize);
        for i in 0..chunk_count {
            let mut acc = mask.eval(i);
            for j in 0..self.sectors_per_chunk {
                acc = (acc + coefficients.eval(j) * view.sector(i, j)?) % &self.prime;
            }
            sigma.push(acc);
        }

        let sealed = open.seal_with_rng(rng, &secrets.k_enc, &secrets.k_mac)?;
        Ok((Tag { sigma }, State::Sealed(sealed)))
    }

    /// Generate a challenge covering every chunk (`l = n`, `B = p`), using
    /// the system RNG.
    ///
    /// The state is authenticated before anything is derived from it; a
    /// tampered or foreign state fails with
    /// [`StateError::Authentication`](hla_core::errors::StateError).
    pub fn gen_challenge(&self, state: &State) -> Result<Challenge, HlaError> {
        self.gen_challenge_with_rng(&mut OsRng, state)
    }

    /// [`Engine::gen_challenge`] with a caller-supplied RNG.
    pub fn gen_challenge_with_rng<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        state: &State,
    ) -> Result<Challenge, HlaError> {
        let opened = self.open_state("gen_challenge", state)?;
        Ok(fresh_challenge(
            rng,
            opened.chunk_count(),
            self.prime.clone(),
        ))
    }

    /// Generate a challenge with an explicit sample count `l` and
    /// coefficient bound `B`. Sampling is with replacement, so `l < n` does
    /// not guarantee distinct chunks and `l > n` is permitted.
    pub fn gen_challenge_bounded(
        &self,
        state: &State,
        chunks: u32,
        coefficient_limit: BigUint,
    ) -> Result<Challenge, HlaError> {
        self.gen_challenge_bounded_with_rng(&mut OsRng, state, chunks, coefficient_limit)
    }

    /// [`Engine::gen_challenge_bounded`] with a caller-supplied RNG.
    pub fn gen_challenge_bounded_with_rng<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        state: &State,
        chunks: u32,
        coefficient_limit: BigUint,
    ) -> Result<Challenge, HlaError> {
        // Even though the challenge itself only needs fresh randomness, a
        // state that does not authenticate must not yield a challenge.
        let _ = self.open_state("gen_challenge", state)?;
        Ok(fresh_challenge(rng, chunks, coefficient_limit))
    }

    /// Answer `challenge` for `file` under `tag`. Needs no secrets; the
    /// server runs this on the public view.
    ///
    /// The index stream is bound to the chunk count of the file *as the
    /// server holds it*. If that disagrees with the verifier's recorded
    /// count (say, a truncated file), the proof simply fails verification.
    pub fn prove<F: Read + Seek>(
        &self,
        file: F,
        challenge: &Challenge,
        tag: &Tag,
    ) -> Result<Proof, HlaError> {
        let mut view = SectorView::new(file, self.sector_size, self.sectors_per_chunk)?;
        let chunk_count: u32 = view.chunk_count().try_into().map_err(|_| {
            HlaError::Parameter("file exceeds the PRF domain of 2^32 chunks".to_string())
        })?;
        let samples = challenge.chunks();
        if samples > 0 {
            if chunk_count == 0 {
                return Err(HlaError::ChallengeOutOfRange(
                    "cannot sample chunks from an empty source".to_string(),
                ));
            }
            if challenge.coefficient_limit().is_zero() {
                return Err(HlaError::ChallengeOutOfRange(
                    "coefficient limit is zero".to_string(),
                ));
            }
        }
        debug!("proving {samples} chunk samples over {chunk_count} chunks");

        let coefficients = challenge.coefficient_prf();
        let index = challenge.index_prf(chunk_count);

        let mut mu = Vec::with_capacity(self.sectors_per_chunk as usize);
        for j in 0..self.sectors_per_chunk {
            let mut acc = BigUint::zero();
            for i in 0..samples {
                let chunk = sample_index(&index, i)?;
                acc = (acc + coefficients.eval(i) * view.sector(chunk, j)?) % &self.prime;
            }
            mu.push(acc);
        }

        let mut sigma = BigUint::zero();
        for i in 0..samples {
            let chunk = sample_index(&index, i)?;
            let tag_sigma = tag.sigma.get(chunk as usize).ok_or_else(|| {
                HlaError::ChallengeOutOfRange(format!(
                    "chunk {chunk} falls outside the tag ({} entries)",
                    tag.sigma.len()
                ))
            })?;
            sigma = (sigma + coefficients.eval(i) * tag_sigma) % &self.prime;
        }

        Ok(Proof { mu, sigma })
    }

    /// Check `proof` against `challenge` and the verifier `state`.
    ///
    /// A state that fails authentication makes the proof invalid
    /// (`Ok(false)`) rather than raising; every other error — notably
    /// invoking this on a public engine — still surfaces.
    pub fn verify(
        &self,
        proof: &Proof,
        challenge: &Challenge,
        state: &State,
    ) -> Result<bool, HlaError> {
        let opened = match self.open_state("verify", state) {
            Ok(opened) => opened,
            Err(HlaError::State(StateError::Authentication)) => {
                debug!("verification failed: state did not authenticate");
                return Ok(false);
            }
            Err(error) => return Err(error),
        };
        Ok(self.check_proof(proof, challenge, &opened))
    }

    fn check_proof(&self, proof: &Proof, challenge: &Challenge, opened: &OpenState) -> bool {
        if proof.mu.len() != self.sectors_per_chunk as usize {
            return false;
        }
        let chunk_count = opened.chunk_count();
        let samples = challenge.chunks();
        if samples > 0 && (chunk_count == 0 || challenge.coefficient_limit().is_zero()) {
            return false;
        }

        let coefficients = challenge.coefficient_prf();
        let index = challenge.index_prf(chunk_count);
        let mask = opened.mask_prf(&self.prime);
        let alpha = opened.coefficient_prf(&self.prime);

        let mut rhs = BigUint::zero();
        for i in 0..samples {
            let chunk = match index.eval(i).to_u32() {
                Some(chunk) => chunk,
                None => return false,
            };
            rhs = (rhs + coefficients.eval(i) * mask.eval(chunk)) % &self.prime;
        }
        for (j, mu_j) in proof.mu.iter().enumerate() {
            rhs = (rhs + alpha.eval(j as u32) * mu_j) % &self.prime;
        }

        field::ct_eq(&proof.sigma, &rhs, &self.prime)
    }

    fn write_params(&self, writer: &mut ByteWriter) {
        writer.put_u32(self.sectors_per_chunk);
        writer.put_u32(self.sector_size);
        writer.put_uint(&self.prime);
    }

    fn read_params(
        reader: &mut ByteReader<'_>,
        secrets: Option<SecretKeys>,
    ) -> Result<Self, HlaError> {
        let sectors_per_chunk = reader.read_u32()?;
        let sector_size = reader.read_u32()?;
        let prime = reader.read_uint()?;
        if sectors_per_chunk == 0 || sector_size == 0 {
            return Err(HlaError::Parameter(
                "engine carries zero-sized sectors or chunks".to_string(),
            ));
        }
        if prime.bits() < 2 {
            return Err(HlaError::Parameter(
                "engine carries a degenerate prime".to_string(),
            ));
        }
        Ok(Self {
            secrets,
            prime,
            sectors_per_chunk,
            sector_size,
        })
    }

    /// Serialize the engine in its secret form:
    /// `u32 32 || k_enc || u32 32 || k_mac || u32 c || u32 s || u32 p_len || p`.
    /// Fails on a public view; use [`Engine::public_to_bytes`] for that side.
    pub fn to_bytes(&self) -> Result<Vec<u8>, HlaError> {
        let secrets = self.secret_keys("engine serialization")?;
        let mut writer = ByteWriter::new();
        writer.put_block(&secrets.k_enc);
        writer.put_block(&secrets.k_mac);
        self.write_params(&mut writer);
        Ok(writer.into_bytes())
    }

    /// Parse an engine from its secret wire form. A key block of any length
    /// other than 32 is rejected with [`HlaError::IncompatibleKey`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HlaError> {
        let mut reader = ByteReader::new(bytes);
        let k_enc = read_key_block(&mut reader)?;
        let k_mac = read_key_block(&mut reader)?;
        let engine = Self::read_params(&mut reader, Some(SecretKeys { k_enc, k_mac }))?;
        if reader.remaining() != 0 {
            return Err(CodecError::TrailingBytes(reader.remaining()).into());
        }
        Ok(engine)
    }

    /// Serialize the public form, which omits the key blocks:
    /// `u32 c || u32 s || u32 p_len || p`.
    pub fn public_to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.write_params(&mut writer);
        writer.into_bytes()
    }

    /// Parse an engine from its public wire form.
    ///
    /// The two forms carry no discriminator, so the caller picks the parser
    /// matching its protocol role; this is the server-side one.
    pub fn public_from_bytes(bytes: &[u8]) -> Result<Self, HlaError> {
        let mut reader = ByteReader::new(bytes);
        let engine = Self::read_params(&mut reader, None)?;
        if reader.remaining() != 0 {
            return Err(CodecError::TrailingBytes(reader.remaining()).into());
        }
        Ok(engine)
    }
}

fn read_key_block(reader: &mut ByteReader<'_>) -> Result<[u8; KEY_SIZE], HlaError> {
    let len = reader.read_u32()?;
    if len as usize != KEY_SIZE {
        return Err(HlaError::IncompatibleKey {
            expected: KEY_SIZE as u32,
            got: len,
        });
    }
    let bytes = reader.read_bytes(KEY_SIZE)?;
    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(bytes);
    Ok(key)
}

fn fresh_challenge<R: RngCore + CryptoRng>(
    rng: &mut R,
    chunks: u32,
    coefficient_limit: BigUint,
) -> Challenge {
    let mut key = vec![0u8; KEY_SIZE];
    rng.fill_bytes(&mut key);
    debug!("generated challenge sampling {chunks} chunks");
    Challenge::new(chunks, key, coefficient_limit)
}

fn sample_index(index: &Prf, i: u32) -> Result<u32, HlaError> {
    index.eval(i).to_u32().ok_or_else(|| {
        HlaError::ChallengeOutOfRange("index stream produced an oversized chunk index".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_engine(seed: u64) -> Engine {
        let mut rng = StdRng::seed_from_u64(seed);
        Engine::generate_with_rng(&mut rng, 16, 10).unwrap()
    }

    #[test]
    fn keygen_rejects_unusable_parameters() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            Engine::generate_with_rng(&mut rng, 16, 0),
            Err(HlaError::Parameter(_))
        ));
        assert!(matches!(
            Engine::generate_with_rng(&mut rng, 4, 10),
            Err(HlaError::Parameter(_))
        ));
    }

    #[test]
    fn sectors_always_inject_into_the_field() {
        for seed in 0..4 {
            let engine = test_engine(seed);
            assert!(8 * (engine.sector_size() as usize) < engine.prime().bits());
        }
    }

    #[test]
    fn secret_form_round_trips() {
        let engine = test_engine(1);
        let bytes = engine.to_bytes().unwrap();
        // 2 key blocks + c + s + p with its length prefix.
        assert_eq!(bytes.len(), (4 + 32) * 2 + 4 + 4 + 4 + 16);
        let parsed = Engine::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, engine);
    }

    #[test]
    fn public_form_round_trips() {
        let engine = test_engine(2).public_view();
        let bytes = engine.public_to_bytes();
        assert_eq!(bytes.len(), 4 + 4 + 4 + 16);
        let parsed = Engine::public_from_bytes(&bytes).unwrap();
        assert_eq!(parsed, engine);
        assert!(parsed.is_public());
    }

    #[test]
    fn nonstandard_key_blocks_are_incompatible() {
        let mut writer = ByteWriter::new();
        writer.put_block(&[0u8; 16]);
        let bytes = writer.into_bytes();
        assert!(matches!(
            Engine::from_bytes(&bytes),
            Err(HlaError::IncompatibleKey {
                expected: 32,
                got: 16
            })
        ));
    }

    #[test]
    fn public_views_refuse_secret_operations() {
        let engine = test_engine(3);
        let public = engine.public_view();
        assert!(matches!(
            public.encode(std::io::Cursor::new(b"data".to_vec())),
            Err(HlaError::SecretsRequired("encode"))
        ));
        assert!(matches!(
            public.to_bytes(),
            Err(HlaError::SecretsRequired(_))
        ));
    }
}
