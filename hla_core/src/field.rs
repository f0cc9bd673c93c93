// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Arithmetic helpers and the minimum-byte big-endian codec for elements of
//! the prime field.
//!
//! The wire format encodes every big integer with the fewest big-endian bytes
//! that represent it without a leading zero; in particular zero encodes to
//! zero bytes. All parties must agree on this convention since the length
//! prefixes in the framing layer are derived from it.

use num_bigint::BigUint;
use num_traits::Zero;
use subtle::ConstantTimeEq;

/// The fewest big-endian bytes needed to represent `x` without a leading
/// zero byte. Zero occupies zero bytes.
pub fn min_encoded_size(x: &BigUint) -> usize {
    if x.is_zero() {
        0
    } else {
        (x.bits() + 7) / 8
    }
}

/// Encode `x` as exactly `width` big-endian bytes, left-padded with zeros.
///
/// If `x` does not fit in `width` bytes only the low-order bytes are kept;
/// callers are expected to size `width` from [`min_encoded_size`].
pub fn encode(x: &BigUint, width: usize) -> Vec<u8> {
    let mut out = vec![0u8; width];
    if !x.is_zero() {
        let raw = x.to_bytes_be();
        if raw.len() >= width {
            out.copy_from_slice(&raw[raw.len() - width..]);
        } else {
            out[width - raw.len()..].copy_from_slice(&raw);
        }
    }
    out
}

/// Decode a big-endian byte string into an integer. The empty string decodes
/// to zero.
pub fn decode(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// `(a + b) mod m`
pub fn add_mod(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    (a + b) % m
}

/// `(a * b) mod m`
pub fn mul_mod(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    (a * b) % m
}

/// Constant-time equality of two field elements with respect to the modulus
/// `m`: both sides are encoded to the byte width of `m` and compared with
/// [`subtle::ConstantTimeEq`]. An operand wider than `m` can never equal a
/// reduced one and is rejected up front.
pub fn ct_eq(a: &BigUint, b: &BigUint, m: &BigUint) -> bool {
    let width = min_encoded_size(m);
    if min_encoded_size(a) > width || min_encoded_size(b) > width {
        return false;
    }
    encode(a, width).ct_eq(&encode(b, width)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_encodes_to_zero_bytes() {
        let zero = BigUint::zero();
        assert_eq!(min_encoded_size(&zero), 0);
        assert_eq!(encode(&zero, 0), Vec::<u8>::new());
        assert_eq!(decode(&[]), zero);
    }

    #[test]
    fn min_encoded_size_boundaries() {
        assert_eq!(min_encoded_size(&BigUint::from(1u8)), 1);
        assert_eq!(min_encoded_size(&BigUint::from(255u8)), 1);
        assert_eq!(min_encoded_size(&BigUint::from(256u16)), 2);
        assert_eq!(min_encoded_size(&BigUint::from(u64::MAX)), 8);
    }

    #[test]
    fn encode_left_pads() {
        let x = BigUint::from(0x0102u16);
        assert_eq!(encode(&x, 4), vec![0, 0, 1, 2]);
        assert_eq!(encode(&x, 2), vec![1, 2]);
    }

    #[test]
    fn modular_helpers() {
        let m = BigUint::from(97u8);
        let a = BigUint::from(90u8);
        let b = BigUint::from(15u8);
        assert_eq!(add_mod(&a, &b, &m), BigUint::from(8u8));
        assert_eq!(mul_mod(&a, &b, &m), BigUint::from(1350u16 % 97));
    }

    #[test]
    fn ct_eq_rejects_unreduced_operands() {
        let m = BigUint::from(251u8);
        let a = BigUint::from(10u8);
        let unreduced = &a + BigUint::from(65536u32);
        assert!(ct_eq(&a, &a, &m));
        assert!(!ct_eq(&a, &unreduced, &m));
    }

    proptest! {
        #[test]
        fn round_trip_min_width(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let x = decode(&bytes);
            let w = min_encoded_size(&x);
            prop_assert!(w <= bytes.len());
            prop_assert_eq!(decode(&encode(&x, w)), x);
        }
    }
}
