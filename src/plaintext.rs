//! Plaintexts and the encoder that maps integer vectors to and from them.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::params::Parameters;
use crate::primitives::ring::Poly;

/// A plaintext polynomial: `N` coefficients in `[0, t)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plaintext {
    pub(crate) poly: Poly,
}

impl Plaintext {
    pub(crate) fn from_poly(poly: Poly) -> Self {
        Plaintext { poly }
    }
}

/// Packs an integer vector into a length-`N` plaintext polynomial: coefficient `i` gets
/// `values[i] mod t`, padded with zeros; values beyond `N` are truncated.
pub fn encode(params: &Parameters, values: &[u64]) -> Plaintext {
    let n = params.n();
    let t = BigUint::from(params.t());
    let coeffs = (0..n)
        .map(|i| {
            values
                .get(i)
                .map(|&v| BigUint::from(v) % &t)
                .unwrap_or_else(BigUint::zero)
        })
        .collect();
    Plaintext::from_poly(Poly::from_coeffs(coeffs))
}

/// Decodes every coefficient to its centered representative in `[-floor(t/2), ceil(t/2))`.
pub fn decode(params: &Parameters, plaintext: &Plaintext) -> Vec<i64> {
    plaintext
        .poly
        .coeffs()
        .iter()
        .map(|v| centered_i64(v, params.t()))
        .collect()
}

/// Decodes only coefficient 0, the common case for scalar (non-batched) values.
pub fn decode_scalar(params: &Parameters, plaintext: &Plaintext) -> i64 {
    centered_i64(&plaintext.poly.coeffs()[0], params.t())
}

fn centered_i64(v: &BigUint, t: u64) -> i64 {
    // The decode window is `[-floor(t/2), ceil(t/2))`, upper-exclusive: `v` stays positive only
    // while `v < ceil(t/2)`, so for even `t` the boundary coefficient `t/2` must map to `-t/2`,
    // not `+t/2`.
    let ceil_half = (t + 1) / 2;
    let v = v
        .to_u64()
        .expect("plaintext coefficients are always reduced mod t, which fits in u64");
    if v >= ceil_half {
        v as i64 - t as i64
    } else {
        v as i64
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::ParametersBuilder;

    fn test_params() -> Parameters {
        ParametersBuilder::new()
            .set_degree(16)
            .set_plain_modulus(257)
            .set_modulus_bit_width(20)
            .build()
            .expect("valid parameters")
    }

    #[test]
    fn encode_decode_scalar_round_trips() {
        let params = test_params();
        let pt = encode(&params, &[42]);
        assert_eq!(decode_scalar(&params, &pt), 42);
    }

    #[test]
    fn encode_pads_and_truncates() {
        let params = test_params();
        let pt = encode(&params, &[1, 2, 3]);
        let decoded = decode(&params, &pt);
        assert_eq!(decoded.len(), params.n());
        assert_eq!(&decoded[..3], &[1, 2, 3]);
        assert!(decoded[3..].iter().all(|&v| v == 0));
    }

    #[test]
    fn decode_centers_large_values() {
        let params = test_params();
        // t = 257, so 200 should decode as 200 - 257 = -57.
        let pt = encode(&params, &[200]);
        assert_eq!(decode_scalar(&params, &pt), 200 - 257);
    }

    #[test]
    fn decode_maps_even_modulus_boundary_to_the_negative_side() {
        // t = 256 is even, so the window [-128, 128) excludes +128: the boundary coefficient
        // must decode as -128, not +128.
        let params = ParametersBuilder::new()
            .set_degree(16)
            .set_plain_modulus(256)
            .set_modulus_bit_width(20)
            .build()
            .expect("valid parameters");
        let pt = encode(&params, &[128]);
        assert_eq!(decode_scalar(&params, &pt), -128);
        let pt = encode(&params, &[127]);
        assert_eq!(decode_scalar(&params, &pt), 127);
    }
}
