//! Parameter selection: given `(N, t, q_bits, sigma)`, derive a usable ciphertext modulus `q`,
//! the scale `delta = floor(q/t)`, and the relinearization decomposition base `T`.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{rngs::StdRng, SeedableRng};

use crate::error::Error;
use crate::primitives::ring::pow2;

/// Deterministic small-prime witness set, sufficient for a correct (non-probabilistic)
/// Miller-Rabin primality test for any `q < 3,317,044,064,679,887,385,961,981` — comfortably
/// covering every `q_bits <= 64` candidate this selector produces.
const MILLER_RABIN_WITNESSES: &[u64] = &[2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// The number of random-witness rounds used for candidates wider than 64 bits, where the fixed
/// witness set above is no longer known to be deterministic.
const MILLER_RABIN_PROBABILISTIC_ROUNDS: usize = 40;

/// The immutable, validated parameters of a BFV instance.
///
/// Constructed only through [`ParametersBuilder::build`]; there is no public constructor that
/// bypasses validation.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameters {
    n: usize,
    t: u64,
    q: BigUint,
    sigma: f64,
    delta: BigUint,
    big_t: BigUint,
    ntt_friendly: bool,
}

impl Parameters {
    /// The ring degree. Always a power of two.
    pub fn n(&self) -> usize {
        self.n
    }

    /// The plaintext modulus.
    pub fn t(&self) -> u64 {
        self.t
    }

    /// The ciphertext modulus.
    pub fn q(&self) -> &BigUint {
        &self.q
    }

    /// The noise standard deviation used by the Gaussian sampler.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// `floor(q/t)`, the plaintext scaling factor.
    pub fn delta(&self) -> &BigUint {
        &self.delta
    }

    /// The relinearization decomposition base, chosen near `sqrt(q)`.
    pub fn big_t(&self) -> &BigUint {
        &self.big_t
    }

    /// Whether `q` satisfies `q == 1 (mod 2N)`, i.e. admits NTT acceleration.
    pub fn ntt_friendly(&self) -> bool {
        self.ntt_friendly
    }

    /// Reconstructs `Parameters` from its four independent fields, recomputing `delta`, `T`, and
    /// `ntt_friendly` deterministically. Used by deserialization, since the wire format only
    /// carries `N`, `t`, `q`, and `sigma` (see `DESIGN.md`).
    pub(crate) fn from_raw(n: usize, t: u64, q: BigUint, sigma: f64) -> Self {
        let delta = &q / t;
        let big_t = pow2(u32::try_from(q.bits() / 2).expect("bit length fits in u32"));
        let m = BigUint::from(2 * n as u64);
        let ntt_friendly = (&q % &m) == BigUint::one();
        Parameters {
            n,
            t,
            q,
            sigma,
            delta,
            big_t,
            ntt_friendly,
        }
    }

    /// A stable 16-byte fingerprint of this value's wire representation, used to detect
    /// ciphertexts or keys built under different parameters.
    pub fn fingerprint(&self) -> [u8; 16] {
        use crate::serialization::ToBytes;
        fingerprint_bytes(&self.to_bytes())
    }
}

/// A simple, dependency-free 128-bit FNV-1a-style hash over arbitrary bytes. This is a
/// stability/identity check, not a cryptographic commitment, so FNV's weaker properties are
/// acceptable here.
pub(crate) fn fingerprint_bytes(data: &[u8]) -> [u8; 16] {
    fn fnv1a64(seed: u64, data: &[u8]) -> u64 {
        const PRIME: u64 = 0x0000_0100_0000_01B3;
        let mut hash = seed;
        for &byte in data {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(PRIME);
        }
        hash
    }

    let lo = fnv1a64(0xcbf2_9ce4_8422_2325, data);
    let hi = fnv1a64(0x9e37_79b9_7f4a_7c15, data);
    let mut out = [0u8; 16];
    out[..8].copy_from_slice(&lo.to_le_bytes());
    out[8..].copy_from_slice(&hi.to_le_bytes());
    out
}

/// A fallible builder over the recognized configuration options: `N`, `t`, `q_bits`, `sigma`,
/// and `require_ntt_friendly`. This is the only supported way to construct [`Parameters`].
#[derive(Clone, Debug)]
pub struct ParametersBuilder {
    n: Option<usize>,
    t: Option<u64>,
    q_bits: Option<u32>,
    sigma: f64,
    require_ntt_friendly: bool,
}

impl Default for ParametersBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ParametersBuilder {
    /// Starts a new builder with the default noise policy: `sigma = 3.2`,
    /// `require_ntt_friendly = true`.
    pub fn new() -> Self {
        ParametersBuilder {
            n: None,
            t: None,
            q_bits: None,
            sigma: 3.2,
            require_ntt_friendly: true,
        }
    }

    /// Sets the ring degree. Must be a power of two.
    pub fn set_degree(mut self, n: usize) -> Self {
        self.n = Some(n);
        self
    }

    /// Sets the plaintext modulus.
    pub fn set_plain_modulus(mut self, t: u64) -> Self {
        self.t = Some(t);
        self
    }

    /// Sets the target bit-width of the ciphertext modulus.
    pub fn set_modulus_bit_width(mut self, q_bits: u32) -> Self {
        self.q_bits = Some(q_bits);
        self
    }

    /// Sets the noise standard deviation (default 3.2).
    pub fn set_noise_std_dev(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// If true (the default), the selector enforces `q == 1 (mod 2N)` so an external multiplier
    /// can use NTT acceleration. If false, `q = 2^q_bits - 1` is permitted directly.
    pub fn set_require_ntt_friendly(mut self, require: bool) -> Self {
        self.require_ntt_friendly = require;
        self
    }

    /// Validates the accumulated options and selects a modulus, producing [`Parameters`].
    pub fn build(self) -> Result<Parameters, Error> {
        let n = self
            .n
            .ok_or_else(|| Error::ParameterError("N was not set".into()))?;
        let t = self
            .t
            .ok_or_else(|| Error::ParameterError("t was not set".into()))?;
        let q_bits = self
            .q_bits
            .ok_or_else(|| Error::ParameterError("q_bits was not set".into()))?;

        if n == 0 || (n & (n - 1)) != 0 {
            return Err(Error::ParameterError(format!(
                "N must be a power of two, got {n}"
            )));
        }
        if !(self.sigma > 0.0) {
            return Err(Error::ParameterError(format!(
                "sigma must be positive, got {}",
                self.sigma
            )));
        }

        let q = if self.require_ntt_friendly {
            find_ntt_friendly_prime(q_bits, n)?
        } else {
            pow2(q_bits) - BigUint::one()
        };

        if q <= BigUint::from(t) {
            return Err(Error::ParameterError(format!(
                "t ({t}) must be strictly less than q ({q})"
            )));
        }

        Ok(Parameters::from_raw(n, t, q, self.sigma))
    }
}

/// The bounded search window for the NTT-friendly prime search: at least 2^20 candidates.
const MAX_PRIME_SEARCH_CANDIDATES: u64 = 1 << 20;
static_assertions::const_assert_eq!(MAX_PRIME_SEARCH_CANDIDATES.count_ones(), 1);

/// Finds a prime `q` with `q == 1 (mod 2N)`, starting near `2^q_bits`.
///
/// Rounds `2^q_bits` down to the nearest multiple of `2N`, adds one, then advances by `2N` until
/// a prime is found.
fn find_ntt_friendly_prime(q_bits: u32, n: usize) -> Result<BigUint, Error> {
    let m = BigUint::from(2 * n as u64);
    let start = pow2(q_bits);
    let mut q = (&start / &m) * &m + BigUint::one();

    let mut rng = StdRng::seed_from_u64(0);
    for _ in 0..MAX_PRIME_SEARCH_CANDIDATES {
        if is_probable_prime(&q, &mut rng) {
            tracing::debug!(q_bits, n, %q, "parameter selector found an NTT-friendly prime");
            return Ok(q);
        }
        q += &m;
    }

    Err(Error::ParameterError(format!(
        "no NTT-friendly prime found near 2^{q_bits} within {MAX_PRIME_SEARCH_CANDIDATES} candidates"
    )))
}

/// Deterministic Miller-Rabin for candidates up to 64 bits, falling back to a fixed number of
/// random-witness rounds for wider candidates.
fn is_probable_prime(candidate: &BigUint, rng: &mut StdRng) -> bool {
    use rand::Rng;

    if *candidate < BigUint::from(2u32) {
        return false;
    }
    for small_prime in [2u32, 3, 5, 7, 11, 13] {
        let small_prime = BigUint::from(small_prime);
        if *candidate == small_prime {
            return true;
        }
        if (candidate % &small_prime).is_zero() {
            return false;
        }
    }

    let one = BigUint::one();
    let two = BigUint::from(2u32);
    let n_minus_one = candidate - &one;

    let mut d = n_minus_one.clone();
    let mut s = 0u32;
    while (&d % &two).is_zero() {
        d /= &two;
        s += 1;
    }

    let deterministic = candidate.bits() <= 64;
    let witnesses: Vec<BigUint> = if deterministic {
        MILLER_RABIN_WITNESSES
            .iter()
            .map(|&w| BigUint::from(w))
            .filter(|w| w < candidate)
            .collect()
    } else {
        (0..MILLER_RABIN_PROBABILISTIC_ROUNDS)
            .map(|_| {
                let byte_len = candidate.to_bytes_le().len();
                loop {
                    let mut bytes = vec![0u8; byte_len];
                    rng.fill(bytes.as_mut_slice());
                    let candidate_witness = BigUint::from_bytes_le(&bytes);
                    if candidate_witness >= two && candidate_witness < n_minus_one {
                        return candidate_witness;
                    }
                }
            })
            .collect()
    };

    'witness: for a in witnesses {
        let mut x = a.modpow(&d, candidate);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 0..s.saturating_sub(1) {
            x = (&x * &x) % candidate;
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_non_power_of_two_degree() {
        let result = ParametersBuilder::new()
            .set_degree(100)
            .set_plain_modulus(17)
            .set_modulus_bit_width(20)
            .build();
        assert!(matches!(result, Err(Error::ParameterError(_))));
    }

    #[test]
    fn selector_finds_ntt_friendly_prime() {
        let params = ParametersBuilder::new()
            .set_degree(16)
            .set_plain_modulus(17)
            .set_modulus_bit_width(20)
            .build()
            .expect("valid parameters");
        let two_n = BigUint::from(32u32);
        assert_eq!(params.q() % &two_n, BigUint::one());
        assert!(params.ntt_friendly());
        assert!(is_probable_prime(params.q(), &mut StdRng::seed_from_u64(0)));
    }

    #[test]
    fn non_ntt_friendly_fallback_skips_search() {
        let params = ParametersBuilder::new()
            .set_degree(16)
            .set_plain_modulus(17)
            .set_modulus_bit_width(20)
            .set_require_ntt_friendly(false)
            .build()
            .expect("valid parameters");
        assert_eq!(params.q(), &(pow2(20) - BigUint::one()));
        assert!(!params.ntt_friendly());
    }

    #[test]
    fn rejects_t_greater_than_or_equal_to_q() {
        let result = ParametersBuilder::new()
            .set_degree(16)
            .set_plain_modulus(1 << 20)
            .set_modulus_bit_width(16)
            .build();
        assert!(result.is_err());
    }
}
