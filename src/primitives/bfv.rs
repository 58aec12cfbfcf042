//! The BFV scheme algorithms: key generation, encryption, decryption, homomorphic addition and
//! subtraction, tensoring multiplication with rescaling, and relinearization.
//!
//! Everything here is a pure function of its arguments: the `Parameters`, a source of randomness
//! where needed, and plain `Poly` vectors representing ciphertext/key parts. The [`crate::engine`]
//! and [`crate::ciphertext`] modules are the architecture on top of this (validation, the
//! `KeyMaterial` bundle, fingerprint checks); this module just implements the ring-level BFV
//! equations directly.

use itertools::izip;
use num_bigint::BigUint;
use num_integer::Integer;
use rand::Rng;

use crate::keys::{PublicKey, RelinKeyPart, RelinearizationKey, SecretKey};
use crate::params::Parameters;
use crate::plaintext::Plaintext;
use crate::primitives::ring::{self, Poly};
use crate::primitives::sampler;

/// Draws an "encryption of a known polynomial `m` under `s`": fresh `a'`, `e'`, returning
/// `(-(a'*s + e') + m mod q, a')`. Used to build both halves of the relinearization key.
fn encrypt_known(params: &Parameters, sk: &SecretKey, m: &Poly, rng: &mut impl Rng) -> (Poly, Poly) {
    let n = params.n();
    let q = params.q();
    let a = sampler::sample_uniform(n, q, rng);
    let e = sampler::sample_gaussian(n, params.sigma(), q, rng)
        .expect("sigma was validated when Parameters were built");
    let a_s = ring::mul(&a, &sk.s, n, q);
    let b = ring::add(&ring::sub(&ring::neg(&a_s, q), &e, q), m, q);
    (b, a)
}

/// Samples `s` ternary.
pub fn generate_secret_key(params: &Parameters, rng: &mut impl Rng) -> SecretKey {
    SecretKey {
        s: sampler::sample_ternary(params.n(), params.q(), rng),
    }
}

/// Samples `a` uniform, `e` bounded-Gaussian, and computes `b = -(a*s + e) mod q`.
pub fn generate_public_key(params: &Parameters, sk: &SecretKey, rng: &mut impl Rng) -> PublicKey {
    let n = params.n();
    let q = params.q();
    let a = sampler::sample_uniform(n, q, rng);
    let e = sampler::sample_gaussian(n, params.sigma(), q, rng)
        .expect("sigma was validated when Parameters were built");
    let a_s = ring::mul(&a, &sk.s, n, q);
    let b = ring::sub(&ring::neg(&a_s, q), &e, q);
    PublicKey { b, a }
}

/// Computes `s^2`, then forms `k0 = encrypt_known(s^2)` and `k1 = encrypt_known(T * s^2)`.
pub fn generate_relin_key(params: &Parameters, sk: &SecretKey, rng: &mut impl Rng) -> RelinearizationKey {
    let n = params.n();
    let q = params.q();
    let s2 = ring::mul(&sk.s, &sk.s, n, q);
    let t_s2 = ring::mul_scalar(&s2, params.big_t(), q);

    let (b0, a0) = encrypt_known(params, sk, &s2, rng);
    let (b1, a1) = encrypt_known(params, sk, &t_s2, rng);

    RelinearizationKey {
        k0: RelinKeyPart { b: b0, a: a0 },
        k1: RelinKeyPart { b: b1, a: a1 },
    }
}

/// Encrypts a plaintext under `pk`, producing a size-2 ciphertext `(c0, c1)`:
/// `c0 = pk.b*u + e1 + delta*m`, `c1 = pk.a*u + e2`.
pub fn encrypt(params: &Parameters, pk: &PublicKey, pt: &Plaintext, rng: &mut impl Rng) -> Vec<Poly> {
    let n = params.n();
    let q = params.q();

    let u = sampler::sample_ternary(n, q, rng);
    let e1 = sampler::sample_gaussian(n, params.sigma(), q, rng)
        .expect("sigma was validated when Parameters were built");
    let e2 = sampler::sample_gaussian(n, params.sigma(), q, rng)
        .expect("sigma was validated when Parameters were built");

    let delta_m = ring::mul_scalar(&pt.poly, params.delta(), q);
    let c0 = ring::add(&ring::add(&ring::mul(&pk.b, &u, n, q), &e1, q), &delta_m, q);
    let c1 = ring::add(&ring::mul(&pk.a, &u, n, q), &e2, q);

    vec![c0, c1]
}

/// Decrypts a size-2 or size-3 ciphertext under `sk`, computing `nu = c0 + c1*s (+ c2*s^2)` and
/// then scaling `((v*t + floor(q/2)) / q) mod t` per coefficient.
///
/// Both ciphertext sizes are supported directly (the size-3 path computes `s^2` on demand).
/// Relinearizing first remains the recommended path for noise efficiency, but is never required
/// before decryption. See `DESIGN.md`.
pub fn decrypt(params: &Parameters, sk: &SecretKey, parts: &[Poly]) -> Plaintext {
    let n = params.n();
    let q = params.q();

    let nu = match parts.len() {
        2 => ring::add(&parts[0], &ring::mul(&parts[1], &sk.s, n, q), q),
        3 => {
            let s2 = ring::mul(&sk.s, &sk.s, n, q);
            let c1s = ring::mul(&parts[1], &sk.s, n, q);
            let c2s2 = ring::mul(&parts[2], &s2, n, q);
            ring::add(&ring::add(&parts[0], &c1s, q), &c2s2, q)
        }
        other => panic!("ciphertext size invariant violated: expected 2 or 3 parts, got {other}"),
    };

    let t = BigUint::from(params.t());
    let half_q = q / 2u32;
    let coeffs = nu
        .coeffs()
        .iter()
        .map(|v| {
            let scaled = (v * &t + &half_q) / q;
            scaled % &t
        })
        .collect();

    Plaintext::from_poly(Poly::from_coeffs(coeffs))
}

/// Componentwise addition; `a` and `b` must already have matching sizes (checked by the caller).
pub fn add(params: &Parameters, a: &[Poly], b: &[Poly]) -> Vec<Poly> {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| ring::add(x, y, params.q()))
        .collect()
}

/// Componentwise subtraction; `a` and `b` must already have matching sizes (checked by the
/// caller).
pub fn sub(params: &Parameters, a: &[Poly], b: &[Poly]) -> Vec<Poly> {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| ring::sub(x, y, params.q()))
        .collect()
}

/// Tensoring multiplication of two size-2 ciphertexts into a size-3 ciphertext, with `t/q`
/// rescaling.
///
/// The raw tensor (`d0~ = c10*c20`, `d1~ = c10*c21 + c11*c20`, `d2~ = c11*c21`) is computed over
/// the integers with no mod-`q` reduction, then each coefficient is rescaled directly via
/// `ring::rescale_coeff`. This is the fold-then-rescale order: see `DESIGN.md` for why this is
/// correct on negative accumulators.
pub fn multiply(params: &Parameters, a: &[Poly], b: &[Poly]) -> Vec<Poly> {
    debug_assert_eq!(a.len(), 2);
    debug_assert_eq!(b.len(), 2);
    let n = params.n();
    let t = params.t();
    let q = params.q();

    let raw0 = ring::mul_raw(&a[0], &b[0], n);
    let raw1: Vec<_> = izip!(ring::mul_raw(&a[0], &b[1], n), ring::mul_raw(&a[1], &b[0], n))
        .map(|(x, y)| x + y)
        .collect();
    let raw2 = ring::mul_raw(&a[1], &b[1], n);

    [raw0, raw1, raw2]
        .into_iter()
        .map(|raw| {
            Poly::from_coeffs(
                raw.iter()
                    .map(|v| ring::rescale_coeff(v, t, q))
                    .collect(),
            )
        })
        .collect()
}

/// Reduces a size-3 ciphertext `(d0, d1, d2)` back to size 2 using the relinearization key.
///
/// `d2` is decomposed in base `T` using its *centered* representative, so that
/// `d2_0 in [0, T)` and `d2_1` is a small-magnitude signed digit with
/// `d2 == d2_0 + T * d2_1` as an exact integer identity (not a modular one). Both digit
/// polynomials are then folded into canonical `[0, q)` form before being used as ring-multiply
/// operands against the relinearization key.
pub fn relinearize(params: &Parameters, rlk: &RelinearizationKey, d: &[Poly]) -> Vec<Poly> {
    debug_assert_eq!(d.len(), 3);
    let n = params.n();
    let q = params.q();
    let big_t = params.big_t();
    let big_t_signed = num_bigint::BigInt::from(big_t.clone());

    let mut d2_0_coeffs = Vec::with_capacity(n);
    let mut d2_1_coeffs = Vec::with_capacity(n);
    for coeff in d[2].coeffs() {
        let centered = ring::reduce_center(coeff, q);
        let digit0 = centered.mod_floor(&big_t_signed);
        let digit1 = centered.div_floor(&big_t_signed);
        d2_0_coeffs.push(digit0.to_biguint().expect("mod_floor against T is always nonnegative"));
        d2_1_coeffs.push(ring::fold_into_ring(&digit1, q));
    }
    let d2_0 = Poly::from_coeffs(d2_0_coeffs);
    let d2_1 = Poly::from_coeffs(d2_1_coeffs);

    let c0p = ring::add(
        &d[0],
        &ring::add(
            &ring::mul(&d2_0, &rlk.k0.b, n, q),
            &ring::mul(&d2_1, &rlk.k1.b, n, q),
            q,
        ),
        q,
    );
    let c1p = ring::add(
        &d[1],
        &ring::add(
            &ring::mul(&d2_0, &rlk.k0.a, n, q),
            &ring::mul(&d2_1, &rlk.k1.a, n, q),
            q,
        ),
        q,
    );

    vec![c0p, c1p]
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::ParametersBuilder;
    use crate::plaintext;
    use rand::{rngs::StdRng, SeedableRng};

    fn test_params() -> Parameters {
        ParametersBuilder::new()
            .set_degree(64)
            .set_plain_modulus(257)
            .set_modulus_bit_width(40)
            .build()
            .expect("valid parameters")
    }

    #[test]
    fn encrypt_decrypt_round_trips() {
        let params = test_params();
        let mut rng = StdRng::seed_from_u64(1);
        let sk = generate_secret_key(&params, &mut rng);
        let pk = generate_public_key(&params, &sk, &mut rng);

        let pt = plaintext::encode(&params, &[42]);
        let ct = encrypt(&params, &pk, &pt, &mut rng);
        let decrypted = decrypt(&params, &sk, &ct);

        assert_eq!(plaintext::decode_scalar(&params, &decrypted), 42);
    }

    #[test]
    fn add_is_homomorphic() {
        let params = test_params();
        let mut rng = StdRng::seed_from_u64(2);
        let sk = generate_secret_key(&params, &mut rng);
        let pk = generate_public_key(&params, &sk, &mut rng);

        let ct1 = encrypt(&params, &pk, &plaintext::encode(&params, &[100]), &mut rng);
        let ct2 = encrypt(&params, &pk, &plaintext::encode(&params, &[200]), &mut rng);
        let sum = add(&params, &ct1, &ct2);
        let decrypted = decrypt(&params, &sk, &sum);

        assert_eq!(plaintext::decode_scalar(&params, &decrypted), 300);
    }

    #[test]
    fn sub_centers_negative_results() {
        let params = test_params();
        let mut rng = StdRng::seed_from_u64(3);
        let sk = generate_secret_key(&params, &mut rng);
        let pk = generate_public_key(&params, &sk, &mut rng);

        let ct1 = encrypt(&params, &pk, &plaintext::encode(&params, &[100]), &mut rng);
        let ct2 = encrypt(&params, &pk, &plaintext::encode(&params, &[200]), &mut rng);
        let diff = sub(&params, &ct1, &ct2);
        let decrypted = decrypt(&params, &sk, &diff);

        assert_eq!(plaintext::decode_scalar(&params, &decrypted), -100);
    }

    #[test]
    fn multiply_and_relinearize_recovers_product() {
        let params = test_params();
        let mut rng = StdRng::seed_from_u64(4);
        let sk = generate_secret_key(&params, &mut rng);
        let pk = generate_public_key(&params, &sk, &mut rng);
        let rlk = generate_relin_key(&params, &sk, &mut rng);

        let ct1 = encrypt(&params, &pk, &plaintext::encode(&params, &[12]), &mut rng);
        let ct2 = encrypt(&params, &pk, &plaintext::encode(&params, &[8]), &mut rng);

        let product = multiply(&params, &ct1, &ct2);
        let relinearized = relinearize(&params, &rlk, &product);
        let decrypted = decrypt(&params, &sk, &relinearized);

        assert_eq!(plaintext::decode_scalar(&params, &decrypted), 96);
    }

    #[test]
    fn decrypt_accepts_unrelinearized_size_three_ciphertexts() {
        let params = test_params();
        let mut rng = StdRng::seed_from_u64(5);
        let sk = generate_secret_key(&params, &mut rng);
        let pk = generate_public_key(&params, &sk, &mut rng);

        let ct1 = encrypt(&params, &pk, &plaintext::encode(&params, &[5]), &mut rng);
        let ct2 = encrypt(&params, &pk, &plaintext::encode(&params, &[7]), &mut rng);
        let product = multiply(&params, &ct1, &ct2);

        let decrypted = decrypt(&params, &sk, &product);
        assert_eq!(plaintext::decode_scalar(&params, &decrypted), 35);
    }
}
