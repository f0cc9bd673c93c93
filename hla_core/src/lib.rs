// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Core utilities for the `hla` private proof-of-storage crate. Mainly contains
//! (1) the artifact value types exchanged between client and server, (2) the
//! keyed PRF streams and field codec underlying them, and (3) the authenticated
//! envelope protecting the verifier state at rest.
//!
//! # The scheme in one paragraph
//!
//! A client tags a file chunk by chunk with homomorphic linear authenticators:
//! chunk `i` of `c` sectors receives
//! `sigma[i] = f(i) + sum_j alpha(j) * sector(i, j)  (mod p)`,
//! where `f` and `alpha` are lazy keyed PRF streams over the prime field. The
//! tag is stored at the server together with a sealed copy of the verifier
//! state (the PRF keys and the chunk count, encrypted-then-MACed). Because the
//! authenticators combine linearly, the server can later answer a challenge
//! with a constant-size proof which only the key holder can check.
//!
//! # Artifacts
//!
//! Every artifact ([`Tag`], [`Challenge`], [`Proof`], [`State`]) carries a
//! deterministic binary form built from `u32` big-endian length framing (see
//! [`codec`]) and minimum-byte big-endian integers (see [`field`]). The byte
//! streams are part of the protocol contract: two peers must reproduce them
//! bit for bit.

#![warn(missing_docs)]

pub mod codec;
pub mod errors;
pub mod field;
pub mod prf;
pub mod state;

pub mod types;
pub use state::{OpenState, SealedState, State};
pub use types::*;

/// The byte length of every symmetric key in the scheme: PRF keys, the state
/// encryption key and the state MAC key. Using a non-standard key size on the
/// sealing operations is rejected, see [`errors::StateError::InvalidKeyLength`].
pub const KEY_SIZE: usize = 32;
