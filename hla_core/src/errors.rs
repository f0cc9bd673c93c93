// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Errors for the serialization framing and the sealed-state envelope.

use core::fmt;

/// An error raised while reading or writing the length-prefixed wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A read ran off the end of its input.
    Truncated {
        /// How many bytes the parser needed.
        needed: usize,
        /// How many bytes were left in the input.
        remaining: usize,
    },
    /// A top-level parse finished with input left over.
    TrailingBytes(usize),
    /// Attempted to serialize a state that has not been sealed. Open states
    /// contain raw PRF keys and must never hit a wire or a disk.
    SerializeRequiresSealed,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { needed, remaining } => {
                write!(
                    f,
                    "input truncated: needed {needed} more bytes, {remaining} remaining"
                )
            }
            Self::TrailingBytes(count) => {
                write!(f, "parse finished with {count} trailing bytes")
            }
            Self::SerializeRequiresSealed => {
                write!(f, "state must be sealed prior to serialization")
            }
        }
    }
}

impl std::error::Error for CodecError {}

/// An error raised while sealing or opening the verifier state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The sealed buffer failed authentication: a MAC mismatch, a length
    /// mismatch, or a parse/decryption failure. Deliberately carries no
    /// detail about which check failed.
    Authentication,
    /// A sealing key had the wrong length; all keys are [`crate::KEY_SIZE`]
    /// bytes.
    InvalidKeyLength(usize),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => {
                write!(f, "sealed state failed authentication")
            }
            Self::InvalidKeyLength(len) => {
                write!(
                    f,
                    "key must be {} bytes in length, got {len}",
                    crate::KEY_SIZE
                )
            }
        }
    }
}

impl std::error::Error for StateError {}
