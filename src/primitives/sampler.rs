//! Coefficient samplers: uniform, ternary, and bounded discrete Gaussian.
//!
//! Every distribution here draws from a caller-supplied RNG rather than a hidden global one, so
//! that the engine's `seeded(seed)` constructor can make every sample reproducible.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::Error;
use crate::primitives::ring::Poly;

/// Uniform sampling in `[0, q)`, by rejection over the byte width of `q`.
pub fn sample_uniform(n: usize, q: &BigUint, rng: &mut impl Rng) -> Poly {
    Poly::from_coeffs((0..n).map(|_| sample_uniform_coeff(q, rng)).collect())
}

fn sample_uniform_coeff(q: &BigUint, rng: &mut impl Rng) -> BigUint {
    let byte_len = q.to_bytes_le().len().max(1);
    let mut bytes = vec![0u8; byte_len];
    loop {
        rng.fill(bytes.as_mut_slice());
        let candidate = BigUint::from_bytes_le(&bytes);
        if &candidate < q {
            return candidate;
        }
    }
}

/// Ternary sampling: each coefficient is independently `-1`, `0`, or `1`, represented in `[0, q)`
/// as `q-1`, `0`, or `1` respectively.
pub fn sample_ternary(n: usize, q: &BigUint, rng: &mut impl Rng) -> Poly {
    Poly::from_coeffs(
        (0..n)
            .map(|_| match rng.gen_range(0u8..3) {
                0 => BigUint::zero(),
                1 => BigUint::one(),
                _ => q - BigUint::one(),
            })
            .collect(),
    )
}

/// Bounded discrete Gaussian sampling: draw from `Normal(0, sigma)`, round to the nearest
/// integer, then clip to `[-B, B]` with `B = ceil(6*sigma)`. The clip is a deliberate worst-case
/// noise bound and must not be relaxed by callers.
///
/// Fails only on invalid distribution parameters (`sigma <= 0`); otherwise infallible.
pub fn sample_gaussian(n: usize, sigma: f64, q: &BigUint, rng: &mut impl Rng) -> Result<Poly, Error> {
    if !(sigma > 0.0) {
        return Err(Error::SamplerError(format!(
            "gaussian sampler requires sigma > 0, got {sigma}"
        )));
    }
    let bound = (6.0 * sigma).ceil() as i64;
    let normal =
        Normal::new(0.0, sigma).map_err(|e| Error::SamplerError(format!("invalid sigma: {e}")))?;

    let coeffs = (0..n)
        .map(|_| {
            let sample: f64 = normal.sample(rng);
            let clipped = (sample.round() as i64).clamp(-bound, bound);
            if clipped >= 0 {
                BigUint::from(clipped as u64)
            } else {
                q - BigUint::from((-clipped) as u64)
            }
        })
        .collect();
    Ok(Poly::from_coeffs(coeffs))
}

#[cfg(test)]
mod test {
    use super::*;
    use num_bigint::BigInt;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn gaussian_rejects_nonpositive_sigma() {
        let q = BigUint::from(97u32);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample_gaussian(4, 0.0, &q, &mut rng).is_err());
        assert!(sample_gaussian(4, -1.0, &q, &mut rng).is_err());
    }

    #[test]
    fn gaussian_samples_are_bounded() {
        let q = BigUint::from(100_003u32);
        let sigma = 3.2;
        let bound = (6.0 * sigma).ceil() as i64;
        let mut rng = StdRng::seed_from_u64(42);
        let poly = sample_gaussian(256, sigma, &q, &mut rng).unwrap();
        for coeff in poly.coeffs() {
            let centered: i64 = crate::primitives::ring::reduce_center(coeff, &q)
                .try_into()
                .expect("bounded sample fits in i64");
            assert!(
                centered.abs() <= bound,
                "sample {centered} exceeded bound {bound}"
            );
        }
    }

    #[test]
    fn ternary_samples_are_in_range() {
        let q = BigUint::from(97u32);
        let mut rng = StdRng::seed_from_u64(7);
        let poly = sample_ternary(64, &q, &mut rng);
        for coeff in poly.coeffs() {
            let centered = crate::primitives::ring::reduce_center(coeff, &q);
            assert!(centered == BigInt::from(-1) || centered == BigInt::from(0) || centered == BigInt::from(1));
        }
    }
}
