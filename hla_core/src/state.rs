// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The verifier state and its authenticated envelope.
//!
//! The state is what the verifier must persist between encoding a file and
//! challenging the server: the chunk count `n` and the two PRF keys behind
//! the chunk masks and sector coefficients. Since the server customarily
//! stores the state alongside the file, the key material is sealed with
//! encrypt-then-MAC before it ever leaves the verifier:
//!
//! ```text
//! sealed   := u32 sig_len || sig_body || u32 mac_len || mac
//! sig_body := u32 n || u32 iv_len || iv || u32 enc_len || enc_body
//! enc_body := AES256-CFB_{k_enc, iv}( u32 kf_len || kf || u32 ka_len || ka )
//! mac      := HMAC-SHA256_{k_mac}( sig_body )
//! ```
//!
//! The MAC scope covers everything in the buffer except the MAC itself, so
//! the cleartext header `n` is authenticated too. Sealing draws a fresh IV
//! and is therefore nondeterministic; opening is deterministic and fails
//! closed on any parse, length, or MAC mismatch.

use crate::codec::{ByteReader, ByteWriter, CodecError, Wire};
use crate::errors::StateError;
use crate::prf::Prf;
use crate::KEY_SIZE;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use hmac::{Hmac, Mac};
use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, Zeroizing};

type HmacSha256 = Hmac<sha2::Sha256>;
type Aes256CfbEnc = cfb_mode::Encryptor<aes::Aes256>;
type Aes256CfbDec = cfb_mode::Decryptor<aes::Aes256>;

/// AES block length; the envelope always carries a full-block IV.
const IV_SIZE: usize = 16;
/// HMAC-SHA256 digest length; anything else in the `mac` slot is rejected.
const MAC_SIZE: usize = 32;

fn check_key(key: &[u8]) -> Result<(), StateError> {
    if key.len() != KEY_SIZE {
        return Err(StateError::InvalidKeyLength(key.len()));
    }
    Ok(())
}

/// Collapse any failure inside `open` into the single authentication error;
/// the envelope deliberately reports nothing finer-grained.
fn auth<E>(_: E) -> StateError {
    StateError::Authentication
}

/// The verifier state with its fields in the clear. Holds raw PRF keys, so
/// it never serializes; seal it first. Key material is zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct OpenState {
    chunk_count: u32,
    mask_key: Vec<u8>,
    coefficient_key: Vec<u8>,
}

impl Drop for OpenState {
    fn drop(&mut self) {
        self.mask_key.zeroize();
        self.coefficient_key.zeroize();
    }
}

impl core::fmt::Debug for OpenState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Key material is deliberately not printed.
        f.debug_struct("OpenState")
            .field("chunk_count", &self.chunk_count)
            .finish_non_exhaustive()
    }
}

impl OpenState {
    /// Assemble an open state from a chunk count and the two PRF keys.
    pub fn new(
        chunk_count: u32,
        mask_key: impl Into<Vec<u8>>,
        coefficient_key: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            chunk_count,
            mask_key: mask_key.into(),
            coefficient_key: coefficient_key.into(),
        }
    }

    /// Draw fresh PRF keys from `rng` for a file of `chunk_count` chunks.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R, chunk_count: u32) -> Self {
        let mut mask_key = vec![0u8; KEY_SIZE];
        let mut coefficient_key = vec![0u8; KEY_SIZE];
        rng.fill_bytes(&mut mask_key);
        rng.fill_bytes(&mut coefficient_key);
        Self {
            chunk_count,
            mask_key,
            coefficient_key,
        }
    }

    /// The number of chunks in the encoded file.
    pub fn chunk_count(&self) -> u32 {
        self.chunk_count
    }

    /// The chunk-mask stream `f = PRF(k_f, limit)`.
    pub fn mask_prf(&self, limit: &BigUint) -> Prf {
        Prf::new(self.mask_key.clone(), limit.clone())
    }

    /// The sector-coefficient stream `alpha = PRF(k_alpha, limit)`.
    pub fn coefficient_prf(&self, limit: &BigUint) -> Prf {
        Prf::new(self.coefficient_key.clone(), limit.clone())
    }

    /// Seal this state under `(k_enc, k_mac)` with an IV from the system RNG.
    pub fn seal(&self, k_enc: &[u8], k_mac: &[u8]) -> Result<SealedState, StateError> {
        self.seal_with_rng(&mut OsRng, k_enc, k_mac)
    }

    /// Seal this state under `(k_enc, k_mac)` drawing the IV from `rng`.
    pub fn seal_with_rng<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        k_enc: &[u8],
        k_mac: &[u8],
    ) -> Result<SealedState, StateError> {
        check_key(k_enc)?;
        check_key(k_mac)?;

        let mut iv = [0u8; IV_SIZE];
        rng.fill_bytes(&mut iv);

        let mut secret = ByteWriter::new();
        secret.put_block(&self.mask_key);
        secret.put_block(&self.coefficient_key);
        let mut enc_body = Zeroizing::new(secret.into_bytes());
        Aes256CfbEnc::new_from_slices(k_enc, &iv)
            .map_err(|_| StateError::InvalidKeyLength(k_enc.len()))?
            .encrypt(&mut enc_body);

        let mut sig = ByteWriter::new();
        sig.put_u32(self.chunk_count);
        sig.put_block(&iv);
        sig.put_block(&enc_body);
        let sig_body = sig.into_bytes();

        let mut mac = HmacSha256::new_from_slice(k_mac)
            .map_err(|_| StateError::InvalidKeyLength(k_mac.len()))?;
        mac.update(&sig_body);
        let digest = mac.finalize().into_bytes();

        let mut raw = ByteWriter::new();
        raw.put_block(&sig_body);
        raw.put_block(&digest);
        Ok(SealedState {
            raw: raw.into_bytes(),
        })
    }
}

/// The verifier state as an opaque authenticated-encrypted buffer, the only
/// form that serializes and the form the server stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedState {
    raw: Vec<u8>,
}

impl SealedState {
    /// The sealed buffer, exactly as it appears on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Authenticate and decrypt this buffer back into an [`OpenState`].
    ///
    /// Fails closed: any parse error, length mismatch, or MAC mismatch is
    /// reported as [`StateError::Authentication`] with nothing recovered.
    /// The MAC comparison is constant-time.
    pub fn open(&self, k_enc: &[u8], k_mac: &[u8]) -> Result<OpenState, StateError> {
        check_key(k_enc)?;
        check_key(k_mac)?;

        let mut reader = ByteReader::new(&self.raw);
        let sig_body = reader.read_block().map_err(auth)?;
        let mac = reader.read_block().map_err(auth)?;
        if reader.remaining() != 0 || mac.len() != MAC_SIZE {
            return Err(StateError::Authentication);
        }

        let mut hmac = HmacSha256::new_from_slice(k_mac).map_err(auth)?;
        hmac.update(sig_body);
        hmac.verify_slice(mac)
            .map_err(|_| StateError::Authentication)?;

        let mut sig = ByteReader::new(sig_body);
        let chunk_count = sig.read_u32().map_err(auth)?;
        let iv = sig.read_block().map_err(auth)?;
        if iv.len() != IV_SIZE {
            return Err(StateError::Authentication);
        }
        let enc_body = sig.read_block().map_err(auth)?;

        let mut plain = Zeroizing::new(enc_body.to_vec());
        Aes256CfbDec::new_from_slices(k_enc, iv)
            .map_err(auth)?
            .decrypt(&mut plain);

        let mut secret = ByteReader::new(&plain);
        let mask_key = secret.read_block().map_err(auth)?.to_vec();
        let coefficient_key = secret.read_block().map_err(auth)?.to_vec();

        Ok(OpenState {
            chunk_count,
            mask_key,
            coefficient_key,
        })
    }

    /// Read the cleartext chunk count out of the header *without* checking
    /// the MAC. Useful when a caller needs `n` before deciding to open, but
    /// the result must never be treated as authenticated.
    pub fn peek_chunk_count(&self) -> Result<u32, CodecError> {
        let mut reader = ByteReader::new(&self.raw);
        let _sig_len = reader.read_u32()?;
        reader.read_u32()
    }
}

impl Wire for SealedState {
    fn write_into(&self, writer: &mut ByteWriter) -> Result<(), CodecError> {
        writer.put_raw(&self.raw);
        Ok(())
    }

    fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        // The buffer is self-delimiting: a signed block followed by a MAC
        // block. Re-assembling from the parsed blocks reproduces it exactly.
        let sig_body = reader.read_block()?;
        let mac = reader.read_block()?;
        let mut writer = ByteWriter::new();
        writer.put_block(sig_body);
        writer.put_block(mac);
        Ok(Self {
            raw: writer.into_bytes(),
        })
    }
}

/// The verifier state in either of its two representations.
///
/// `Open` holds raw key material and cannot serialize;
/// `Sealed` is the opaque authenticated buffer. The transitions are
/// [`State::encrypt`] and [`State::decrypt`] (no-ops when the state is
/// already in the target representation, so a freshly received state can be
/// decrypted unconditionally).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    /// Fields populated, not safe to serialize.
    Open(OpenState),
    /// Authenticated-encrypted buffer, safe to serialize and store remotely.
    Sealed(SealedState),
}

impl State {
    /// The byte length required of the encryption and MAC keys.
    pub fn key_size() -> usize {
        KEY_SIZE
    }

    /// Whether this state is in its sealed representation.
    pub fn is_sealed(&self) -> bool {
        matches!(self, State::Sealed(_))
    }

    /// The chunk count: read directly from an open state, or peeked
    /// (unauthenticated) from a sealed one.
    pub fn chunk_count(&self) -> Result<u32, CodecError> {
        match self {
            State::Open(open) => Ok(open.chunk_count()),
            State::Sealed(sealed) => sealed.peek_chunk_count(),
        }
    }

    /// Seal an open state in place under `(k_enc, k_mac)`; a no-op when
    /// already sealed. The `convergent` flag is reserved and currently
    /// equivalent to `false`.
    pub fn encrypt(
        &mut self,
        k_enc: &[u8],
        k_mac: &[u8],
        convergent: bool,
    ) -> Result<(), StateError> {
        let _ = convergent;
        match self {
            State::Sealed(_) => Ok(()),
            State::Open(open) => {
                *self = State::Sealed(open.seal(k_enc, k_mac)?);
                Ok(())
            }
        }
    }

    /// Open a sealed state in place, verifying its MAC; a no-op when already
    /// open.
    pub fn decrypt(&mut self, k_enc: &[u8], k_mac: &[u8]) -> Result<(), StateError> {
        match self {
            State::Open(_) => Ok(()),
            State::Sealed(sealed) => {
                *self = State::Open(sealed.open(k_enc, k_mac)?);
                Ok(())
            }
        }
    }
}

impl Wire for State {
    fn write_into(&self, writer: &mut ByteWriter) -> Result<(), CodecError> {
        match self {
            State::Open(_) => Err(CodecError::SerializeRequiresSealed),
            State::Sealed(sealed) => sealed.write_into(writer),
        }
    }

    fn read_from(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        Ok(State::Sealed(SealedState::read_from(reader)?))
    }
}
