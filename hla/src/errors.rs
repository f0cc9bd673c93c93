// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Errors for the engine operations.

use core::fmt;
use hla_core::errors::{CodecError, StateError};

/// Symbolizes an error thrown by an engine operation.
#[derive(Debug)]
pub enum HlaError {
    /// Error propagation from the wire codec.
    Codec(CodecError),
    /// Error propagation from the state envelope. Opening a sealed state
    /// with the wrong keys or a tampered buffer surfaces here as
    /// [`StateError::Authentication`].
    State(StateError),
    /// The caller-supplied byte source failed.
    Io(std::io::Error),
    /// Engine deserialization encountered a key block of the wrong length.
    IncompatibleKey {
        /// The only supported key length.
        expected: u32,
        /// The length found on the wire.
        got: u32,
    },
    /// An operation that needs the secret keys was invoked on a public
    /// engine; the string names the operation.
    SecretsRequired(&'static str),
    /// A challenge cannot be answered or checked against the data at hand,
    /// e.g. sampling a non-empty set of chunks from an empty file, or an
    /// index falling outside the tag.
    ChallengeOutOfRange(String),
    /// An engine was configured with unusable parameters.
    Parameter(String),
}

impl From<CodecError> for HlaError {
    fn from(error: CodecError) -> Self {
        Self::Codec(error)
    }
}

impl From<StateError> for HlaError {
    fn from(error: StateError) -> Self {
        Self::State(error)
    }
}

impl From<std::io::Error> for HlaError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl fmt::Display for HlaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(error) => write!(f, "codec error: {error}"),
            Self::State(error) => write!(f, "state error: {error}"),
            Self::Io(error) => write!(f, "byte source error: {error}"),
            Self::IncompatibleKey { expected, got } => {
                write!(f, "incompatible key size: expected {expected}, got {got}")
            }
            Self::SecretsRequired(op) => {
                write!(f, "{op} requires the secret keys, which a public engine does not carry")
            }
            Self::ChallengeOutOfRange(msg) => {
                write!(f, "challenge out of range: {msg}")
            }
            Self::Parameter(msg) => write!(f, "invalid parameter: {msg}"),
        }
    }
}

impl std::error::Error for HlaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(error) => Some(error),
            Self::State(error) => Some(error),
            Self::Io(error) => Some(error),
            _ => None,
        }
    }
}
