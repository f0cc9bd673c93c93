// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

#[macro_use]
extern crate criterion;

use criterion::Criterion;
use hla::Engine;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::io::Cursor;

const FILE_SIZE: usize = 64 * 1024;

fn protocol_round(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let engine = Engine::generate_with_rng(&mut rng, 16, 10).unwrap();
    let server = engine.public_view();

    let mut file = vec![0u8; FILE_SIZE];
    rng.fill_bytes(&mut file);

    let id = format!("Encode ({} KiB file)", FILE_SIZE / 1024);
    c.bench_function(&id, |b| {
        b.iter(|| engine.encode(Cursor::new(&file)).unwrap());
    });

    let (tag, state) = engine.encode(Cursor::new(&file)).unwrap();
    let challenge = engine.gen_challenge(&state).unwrap();

    let id = format!("Prove ({} KiB file)", FILE_SIZE / 1024);
    c.bench_function(&id, |b| {
        b.iter(|| server.prove(Cursor::new(&file), &challenge, &tag).unwrap());
    });

    let proof = server.prove(Cursor::new(&file), &challenge, &tag).unwrap();
    let id = format!("Verify ({} KiB file)", FILE_SIZE / 1024);
    c.bench_function(&id, |b| {
        b.iter(|| assert!(engine.verify(&proof, &challenge, &state).unwrap()));
    });
}

criterion_group!(benches, protocol_round);
criterion_main!(benches);
