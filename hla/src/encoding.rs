// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Optional text wrapper over the binary artifact forms.
//!
//! Some transports want artifacts as printable text; every artifact can be
//! carried as standard Base64 of its binary form. The wrapper never alters
//! the underlying bytes — decoding the Base64 yields exactly the binary
//! serialization.

use crate::errors::HlaError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use core::fmt;
use hla_core::codec::Wire;

/// How an artifact is rendered for transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// The raw binary wire form.
    #[default]
    Binary,
    /// Standard Base64 over the binary wire form.
    Base64,
}

/// Malformed Base64 was handed to [`Encoding::decode_bytes`].
#[derive(Debug)]
pub struct Base64Error(base64::DecodeError);

impl fmt::Display for Base64Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid base64 wrapper: {}", self.0)
    }
}

impl std::error::Error for Base64Error {}

impl From<Base64Error> for HlaError {
    fn from(error: Base64Error) -> Self {
        HlaError::Parameter(error.to_string())
    }
}

impl Encoding {
    /// Wrap already-serialized artifact bytes in this encoding.
    pub fn encode_bytes(&self, bytes: &[u8]) -> Vec<u8> {
        match self {
            Encoding::Binary => bytes.to_vec(),
            Encoding::Base64 => STANDARD.encode(bytes).into_bytes(),
        }
    }

    /// Unwrap transport bytes back to the binary artifact form.
    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, Base64Error> {
        match self {
            Encoding::Binary => Ok(bytes.to_vec()),
            Encoding::Base64 => STANDARD.decode(bytes).map_err(Base64Error),
        }
    }

    /// Serialize an artifact straight into this encoding.
    pub fn encode<T: Wire>(&self, artifact: &T) -> Result<Vec<u8>, HlaError> {
        Ok(self.encode_bytes(&artifact.to_bytes()?))
    }

    /// Parse an artifact out of this encoding.
    pub fn decode<T: Wire>(&self, bytes: &[u8]) -> Result<T, HlaError> {
        let binary = self.decode_bytes(bytes)?;
        Ok(T::from_bytes(&binary)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hla_core::Tag;
    use num_bigint::BigUint;

    fn sample_tag() -> Tag {
        Tag {
            sigma: vec![BigUint::from(0xbeefu32), BigUint::from(0u8)],
        }
    }

    #[test]
    fn base64_wraps_the_binary_form_exactly() {
        let tag = sample_tag();
        let binary = Encoding::Binary.encode(&tag).unwrap();
        let text = Encoding::Base64.encode(&tag).unwrap();
        assert_eq!(
            Encoding::Base64.decode_bytes(&text).unwrap(),
            binary,
            "base64 must not alter the bytes underneath"
        );
        assert_eq!(Encoding::Base64.decode::<Tag>(&text).unwrap(), tag);
    }

    #[test]
    fn malformed_base64_is_rejected() {
        assert!(Encoding::Base64.decode::<Tag>(b"!!! not base64 !!!").is_err());
    }
}
