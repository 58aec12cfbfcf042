//! Modular polynomial arithmetic in `R_q = Z_q[X] / (X^N + 1)`.
//!
//! Coefficients are arbitrary-precision, since products of `Z_q` elements can overflow any fixed
//! machine width during convolution (accumulation can reach `N * (q-1)^2`). This is the leaf
//! layer of the engine: it knows nothing about ciphertexts, keys, or plaintext modulus beyond the
//! values passed in.

use derive_more::{Deref, DerefMut};
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Zero};

/// A polynomial in `R_q`: exactly `N` coefficients, each conventionally kept in `[0, q)`.
///
/// Operations in this module take `q` explicitly rather than storing it, so a `Poly` by itself
/// makes no claim about which ring it belongs to; callers are responsible for only combining
/// polynomials that share the same `N` and `q`.
#[derive(Clone, Debug, Eq, PartialEq, Deref, DerefMut)]
pub struct Poly(Vec<BigUint>);

impl Poly {
    /// The all-zero polynomial of degree `< n`.
    pub fn zero(n: usize) -> Self {
        Poly(vec![BigUint::zero(); n])
    }

    /// Wraps an existing coefficient vector. The caller is responsible for the length and range
    /// invariants; constructors in this crate that call this directly have already established
    /// them.
    pub fn from_coeffs(coeffs: Vec<BigUint>) -> Self {
        Poly(coeffs)
    }

    /// The coefficients, constant term first.
    pub fn coeffs(&self) -> &[BigUint] {
        &self.0
    }

    /// The ring degree this polynomial was built for.
    pub fn degree(&self) -> usize {
        self.0.len()
    }
}

/// Componentwise addition, reduced into `[0, q)`.
pub fn add(a: &Poly, b: &Poly, q: &BigUint) -> Poly {
    debug_assert_eq!(a.degree(), b.degree());
    Poly(a.iter().zip(b.iter()).map(|(x, y)| (x + y) % q).collect())
}

/// Componentwise subtraction, reduced into `[0, q)`.
pub fn sub(a: &Poly, b: &Poly, q: &BigUint) -> Poly {
    debug_assert_eq!(a.degree(), b.degree());
    Poly(
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| if x >= y { x - y } else { q - (y - x) })
            .collect(),
    )
}

/// Componentwise negation, reduced into `[0, q)`.
pub fn neg(a: &Poly, q: &BigUint) -> Poly {
    Poly(
        a.iter()
            .map(|x| if x.is_zero() { BigUint::zero() } else { q - x })
            .collect(),
    )
}

/// Scalar multiplication, promoted to arbitrary precision before reduction mod `q`.
pub fn mul_scalar(a: &Poly, k: &BigUint, q: &BigUint) -> Poly {
    Poly(a.iter().map(|x| (x * k) % q).collect())
}

/// For `v` in `[0, q)`, the centered representative: `v` if `v <= floor(q/2)`, else `v - q`.
pub fn reduce_center(v: &BigUint, q: &BigUint) -> BigInt {
    let half = q / 2u32;
    if *v <= half {
        BigInt::from(v.clone())
    } else {
        BigInt::from(v.clone()) - BigInt::from(q.clone())
    }
}

/// The raw negacyclic tensor `a (x) b`: a 2N-1 term convolution over the integers, folded by
/// `X^N = -1`, with **no** reduction mod `q`. Used by multiplication (the raw tensor is defined
/// "over the integers" before rescaling); ordinary ring multiplication ([`mul`]) additionally
/// reduces the result of this function mod `q`.
///
/// TODO: this is a schoolbook O(N^2) convolution; a Karatsuba or NTT-based kernel would be
/// faster for large N, at the cost of matching this function's output exactly.
pub fn mul_raw(a: &Poly, b: &Poly, n: usize) -> Vec<BigInt> {
    debug_assert_eq!(a.degree(), n);
    debug_assert_eq!(b.degree(), n);

    let mut conv = vec![BigInt::zero(); 2 * n - 1];
    for (i, ai) in a.iter().enumerate() {
        if ai.is_zero() {
            continue;
        }
        let ai = BigInt::from(ai.clone());
        for (j, bj) in b.iter().enumerate() {
            if bj.is_zero() {
                continue;
            }
            conv[i + j] += &ai * BigInt::from(bj.clone());
        }
    }

    let mut folded: Vec<BigInt> = conv[..n].to_vec();
    for (offset, c) in conv[n..].iter().enumerate() {
        folded[offset] -= c;
    }
    folded
}

/// Standard ring multiplication: the raw tensor ([`mul_raw`]), reduced mod `q` into canonical
/// form.
pub fn mul(a: &Poly, b: &Poly, n: usize, q: &BigUint) -> Poly {
    let q_signed = BigInt::from(q.clone());
    let raw = mul_raw(a, b, n);
    Poly(
        raw.iter()
            .map(|v| {
                v.mod_floor(&q_signed)
                    .to_biguint()
                    .expect("mod_floor against a positive modulus is always nonnegative")
            })
            .collect(),
    )
}

/// Rescales a single raw (signed, possibly large-magnitude) accumulator `v` by `t/q`:
/// `((v * t + floor(q/2)) div_floor q) mod q`.
///
/// This is the fold-then-rescale formula from the multiplication step (see `DESIGN.md` for the
/// grounding of why floor division, not truncating division, is required here): the accumulator
/// has already been folded by [`mul_raw`] and is not yet reduced mod `q`, so it may be negative.
pub fn rescale_coeff(v: &BigInt, t: u64, q: &BigUint) -> BigUint {
    let q_signed = BigInt::from(q.clone());
    let half_q = &q_signed / 2;
    let numerator = v * BigInt::from(t) + half_q;
    numerator
        .div_floor(&q_signed)
        .mod_floor(&q_signed)
        .to_biguint()
        .expect("mod_floor against a positive modulus is always nonnegative")
}

/// Folds a signed value into the canonical `[0, q)` representative.
pub fn fold_into_ring(v: &BigInt, q: &BigUint) -> BigUint {
    let q_signed = BigInt::from(q.clone());
    v.mod_floor(&q_signed)
        .to_biguint()
        .expect("mod_floor against a positive modulus is always nonnegative")
}

/// `2^exponent`, as a `BigUint`. A small helper shared by the parameter selector (delta, T) and
/// the encoder.
pub fn pow2(exponent: u32) -> BigUint {
    BigUint::one() << exponent
}

#[cfg(test)]
mod test {
    use super::*;

    fn small_q() -> BigUint {
        BigUint::from(97u32)
    }

    #[test]
    fn add_wraps_into_range() {
        let q = small_q();
        let a = Poly::from_coeffs(vec![BigUint::from(90u32), BigUint::from(5u32)]);
        let b = Poly::from_coeffs(vec![BigUint::from(10u32), BigUint::from(3u32)]);
        let c = add(&a, &b, &q);
        assert_eq!(c.coeffs(), &[BigUint::from(3u32), BigUint::from(8u32)]);
    }

    #[test]
    fn sub_handles_underflow() {
        let q = small_q();
        let a = Poly::from_coeffs(vec![BigUint::from(5u32)]);
        let b = Poly::from_coeffs(vec![BigUint::from(10u32)]);
        let c = sub(&a, &b, &q);
        assert_eq!(c.coeffs(), &[BigUint::from(92u32)]);
    }

    #[test]
    fn reduce_center_splits_at_half() {
        let q = BigUint::from(11u32);
        assert_eq!(reduce_center(&BigUint::from(5u32), &q), BigInt::from(5));
        assert_eq!(reduce_center(&BigUint::from(6u32), &q), BigInt::from(-5));
    }

    #[test]
    fn mul_raw_negates_high_terms() {
        // In R_q with N=2, X^2 = -1, so (1 + X)*(1 + X) = 1 + 2X + X^2 = 0 + 2X.
        let n = 2;
        let a = Poly::from_coeffs(vec![BigUint::from(1u32), BigUint::from(1u32)]);
        let raw = mul_raw(&a, &a, n);
        assert_eq!(raw, vec![BigInt::from(0), BigInt::from(2)]);
    }

    #[test]
    fn rescale_coeff_handles_negative_accumulators() {
        // t=2, q=97: a negative raw value should round-trip through floor semantics without
        // panicking and land back in [0, q).
        let q = small_q();
        let v = BigInt::from(-150);
        let rescaled = rescale_coeff(&v, 2, &q);
        assert!(rescaled < q);
    }
}
