// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Keyed pseudorandom function producing bounded field elements.
//!
//! The scheme consumes randomness as *streams* indexed by a 32-bit position:
//! the chunk masks `f(i)`, the sector coefficients `alpha(j)`, the challenge
//! coefficients `v(i)` and the challenge indices. All of them are instances
//! of one construction, evaluated lazily — no coefficient array is ever
//! materialized.
//!
//! For a key `k` and an upper limit `L`, position `i` evaluates to
//!
//! ```text
//! PRF_k(i) = BE( HMAC-SHA256_k(be32(i) || be32(0)) ||
//!                HMAC-SHA256_k(be32(i) || be32(1)) || ... )  mod L
//! ```
//!
//! where the concatenated output is truncated to `byte_count(L) + 8` bytes
//! before the reduction. The eight surplus bytes make the modular bias
//! cryptographically negligible.

use crate::field;
use hmac::{Hmac, Mac};
use num_bigint::BigUint;
use num_traits::Zero;
use sha2::Sha256;
use zeroize::Zeroize;

type HmacSha256 = Hmac<Sha256>;

/// How many bytes beyond the limit's width are drawn from the HMAC stream
/// before reducing, to flatten the modular bias.
const BIAS_MARGIN: usize = 8;

/// A keyed PRF stream with outputs in `[0, limit)`.
///
/// Only `(key, limit)` define the function; the position is supplied at each
/// evaluation. The wire formats transmit the key (and for the challenge
/// coefficient stream, the limit); the index stream of a challenge re-uses
/// the same key under a different limit bound by each peer at use time.
#[derive(Clone)]
pub struct Prf {
    key: Vec<u8>,
    limit: BigUint,
}

impl Drop for Prf {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl Prf {
    /// Build a PRF from a key and an exclusive upper limit.
    ///
    /// A zero limit describes an empty output range; such a PRF may be
    /// constructed (e.g. while deserializing untrusted data) but must not be
    /// evaluated. Protocol operations guard for this before evaluating.
    pub fn new(key: impl Into<Vec<u8>>, limit: BigUint) -> Self {
        Self {
            key: key.into(),
            limit,
        }
    }

    /// The PRF key.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The exclusive upper limit of the output range.
    pub fn limit(&self) -> &BigUint {
        &self.limit
    }

    /// Evaluate the stream at position `i`, yielding a value in
    /// `[0, limit)`.
    ///
    /// # Panics
    ///
    /// Panics if the limit is zero; see [`Prf::new`].
    pub fn eval(&self, i: u32) -> BigUint {
        assert!(
            !self.limit.is_zero(),
            "PRF evaluated with an empty output range"
        );
        let width = field::min_encoded_size(&self.limit) + BIAS_MARGIN;
        let mut stream = Vec::with_capacity(width + 31);
        let mut block: u32 = 0;
        while stream.len() < width {
            let mut mac = HmacSha256::new_from_slice(&self.key)
                .expect("HMAC accepts keys of any length");
            mac.update(&i.to_be_bytes());
            mac.update(&block.to_be_bytes());
            stream.extend_from_slice(&mac.finalize().into_bytes());
            block += 1;
        }
        stream.truncate(width);
        field::decode(&stream) % &self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::{One, Zero};

    fn limit_128() -> BigUint {
        // 2^127 + 1, a convenient 16-byte limit.
        (BigUint::one() << 127) + BigUint::one()
    }

    #[test]
    fn outputs_stay_below_the_limit() {
        let prf = Prf::new(vec![7u8; 32], BigUint::from(1000u32));
        for i in 0..512 {
            assert!(prf.eval(i) < BigUint::from(1000u32));
        }
    }

    #[test]
    fn evaluation_is_deterministic() {
        let a = Prf::new(vec![1u8; 32], limit_128());
        let b = Prf::new(vec![1u8; 32], limit_128());
        for i in [0, 1, 17, u32::MAX] {
            assert_eq!(a.eval(i), b.eval(i));
        }
    }

    #[test]
    fn distinct_keys_disagree() {
        let a = Prf::new(vec![1u8; 32], limit_128());
        let b = Prf::new(vec![2u8; 32], limit_128());
        // 64 agreeing evaluations of a 128-bit PRF would be astronomical.
        assert!((0..64).any(|i| a.eval(i) != b.eval(i)));
    }

    #[test]
    fn distinct_limits_disagree_under_one_key() {
        // The challenge index stream re-uses the coefficient key with a
        // different limit; the reductions must actually diverge.
        let v = Prf::new(vec![3u8; 32], limit_128());
        let index = Prf::new(vec![3u8; 32], BigUint::from(97u32));
        assert!((0..64).any(|i| v.eval(i) % BigUint::from(97u32) != index.eval(i)));
    }

    #[test]
    fn unit_limit_is_constantly_zero() {
        let prf = Prf::new(vec![9u8; 32], BigUint::one());
        for i in 0..32 {
            assert!(prf.eval(i).is_zero());
        }
    }
}
