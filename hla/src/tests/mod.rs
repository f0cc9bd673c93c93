// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! End-to-end tests driving the full client/server protocol in memory.

use crate::engine::Engine;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};


/// A deterministic engine for reproducible protocol runs.
pub(crate) fn seeded_engine(seed: u64, prime_size_bytes: usize, sectors: u32) -> Engine {
    let mut rng = StdRng::seed_from_u64(seed);
    Engine::generate_with_rng(&mut rng, prime_size_bytes, sectors)
        .expect("test parameters are valid")
}

/// Deterministic pseudo-file contents.
pub(crate) fn random_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    data
}
