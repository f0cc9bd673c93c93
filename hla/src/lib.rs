// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Private-verifier proof of storage via Shacham–Waters homomorphic linear
//! authenticators.
//!
//! A client who owns a file delegates its storage to an untrusted server,
//! keeps only a short secret, and can later challenge the server repeatedly
//! to prove it still holds the file in full — without ever transferring the
//! file back. The scheme is *private*: challenges can only be issued, and
//! responses only be checked, by the holder of the secret keys.
//!
//! # Protocol walkthrough
//!
//! ```no_run
//! use hla::Engine;
//! use std::io::Cursor;
//!
//! # fn main() -> Result<(), hla::HlaError> {
//! let file = b"the bytes worth keeping".to_vec();
//!
//! // Client side: generate an engine, tag the file, ship the tag and the
//! // sealed state (plus the public engine) to the server.
//! let engine = Engine::generate_default()?;
//! let (tag, state) = engine.encode(Cursor::new(&file))?;
//! let server_engine = engine.public_view();
//!
//! // Audit time: the client builds a challenge from the state it fetched
//! // back, the server answers from the file and tag it stores.
//! let challenge = engine.gen_challenge(&state)?;
//! let proof = server_engine.prove(Cursor::new(&file), &challenge, &tag)?;
//! assert!(engine.verify(&proof, &challenge, &state)?);
//! # Ok(())
//! # }
//! ```
//!
//! Every artifact crossing the wire ([`Tag`], [`State`], [`Challenge`],
//! [`Proof`], and the engine itself) has a deterministic binary form — see
//! [`Wire`] and [`encoding`] for the optional Base64 wrapper.

#![warn(missing_docs)]

pub mod encoding;
pub mod engine;
pub mod errors;
pub mod sector;

pub use encoding::Encoding;
pub use engine::Engine;
pub use errors::HlaError;

pub use hla_core::codec::Wire;
pub use hla_core::{Challenge, OpenState, Proof, SealedState, State, Tag, KEY_SIZE};

#[cfg(test)]
mod tests;
