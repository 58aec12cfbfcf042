//! Wire format: `ToBytes`/`FromBytes` for every type that crosses a process boundary.
//!
//! Every encoding starts with a 4-byte magic tag identifying the type and a `u16` format version,
//! so a reader can reject a mismatched or stale blob before attempting to parse the rest of it.
//! Big integers are written as a `u16` byte length followed by that many little-endian bytes,
//! which comfortably covers ciphertext moduli up to 2^524280 bits.

use std::sync::Arc;

use num_bigint::BigUint;

use crate::ciphertext::Ciphertext;
use crate::error::Error;
use crate::keys::{PublicKey, RelinKeyPart, RelinearizationKey, SecretKey};
use crate::params::Parameters;
use crate::primitives::ring::Poly;

const MAGIC_PARAMETERS: &[u8; 4] = b"FHEP";
const MAGIC_CIPHERTEXT: &[u8; 4] = b"FHEC";
const MAGIC_SECRET_KEY: &[u8; 4] = b"FHES";
const MAGIC_PUBLIC_KEY: &[u8; 4] = b"FHEK";
const MAGIC_RELIN_KEY: &[u8; 4] = b"FHER";

const FORMAT_VERSION: u16 = 1;

/// Produces this value's wire representation.
pub trait ToBytes {
    fn to_bytes(&self) -> Vec<u8>;
}

/// Parses a value from its wire representation. Types whose bytes alone don't fully determine the
/// value (a ciphertext's ring degree and modulus, say) take an external `Context`.
pub trait FromBytes: Sized {
    type Context;

    fn from_bytes(bytes: &[u8], context: Self::Context) -> Result<Self, Error>;
}

/// A small forward-only cursor over a byte slice, used by every `FromBytes` implementation below.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let end = self.pos.checked_add(n).ok_or_else(|| {
            Error::SerializationError("length overflow while reading".into())
        })?;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| Error::SerializationError("unexpected end of input".into()))?;
        self.pos = end;
        Ok(slice)
    }

    fn expect_magic(&mut self, expected: &[u8; 4]) -> Result<(), Error> {
        let actual = self.take(4)?;
        if actual != expected {
            return Err(Error::SerializationError(format!(
                "wrong magic bytes: expected {expected:?}, got {actual:?}"
            )));
        }
        Ok(())
    }

    fn read_u16(&mut self) -> Result<u16, Error> {
        let bytes: [u8; 2] = self.take(2)?.try_into().expect("took exactly 2 bytes");
        Ok(u16::from_le_bytes(bytes))
    }

    fn read_u32(&mut self) -> Result<u32, Error> {
        let bytes: [u8; 4] = self.take(4)?.try_into().expect("took exactly 4 bytes");
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_u64(&mut self) -> Result<u64, Error> {
        let bytes: [u8; 8] = self.take(8)?.try_into().expect("took exactly 8 bytes");
        Ok(u64::from_le_bytes(bytes))
    }

    /// Reads `sigma` stored as `sigma * 10` in a `u16`, per the wire format's fixed-point
    /// encoding (one decimal digit of precision is all production sigmas ever use).
    fn read_sigma_fixed_point(&mut self) -> Result<f64, Error> {
        let tenths = self.read_u16()?;
        Ok(f64::from(tenths) / 10.0)
    }

    fn read_version(&mut self) -> Result<(), Error> {
        let version = self.read_u16()?;
        if version != FORMAT_VERSION {
            return Err(Error::SerializationError(format!(
                "unsupported format version {version}, expected {FORMAT_VERSION}"
            )));
        }
        Ok(())
    }

    fn read_fingerprint(&mut self) -> Result<[u8; 16], Error> {
        Ok(self.take(16)?.try_into().expect("took exactly 16 bytes"))
    }

    fn read_biguint(&mut self) -> Result<BigUint, Error> {
        let len = self.read_u16()? as usize;
        Ok(BigUint::from_bytes_le(self.take(len)?))
    }

    fn read_poly(&mut self, n: usize) -> Result<Poly, Error> {
        let count = self.read_u32()? as usize;
        if count != n {
            return Err(Error::SerializationError(format!(
                "polynomial has {count} coefficients, expected {n}"
            )));
        }
        let coeffs = (0..count)
            .map(|_| self.read_biguint())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Poly::from_coeffs(coeffs))
    }
}

fn write_biguint(out: &mut Vec<u8>, value: &BigUint) {
    let bytes = value.to_bytes_le();
    let len = u16::try_from(bytes.len()).expect("coefficients never exceed 2^16 bytes");
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&bytes);
}

fn write_poly(out: &mut Vec<u8>, poly: &Poly) {
    out.extend_from_slice(&(poly.degree() as u32).to_le_bytes());
    for coeff in poly.coeffs() {
        write_biguint(out, coeff);
    }
}

impl ToBytes for Parameters {
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC_PARAMETERS);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&(self.n() as u32).to_le_bytes());
        out.extend_from_slice(&self.t().to_le_bytes());
        write_biguint(&mut out, self.q());
        let sigma_tenths = u16::try_from((self.sigma() * 10.0).round() as i64)
            .expect("sigma fits in the wire format's fixed-point u16");
        out.extend_from_slice(&sigma_tenths.to_le_bytes());
        out
    }
}

impl FromBytes for Parameters {
    type Context = ();

    fn from_bytes(bytes: &[u8], _context: ()) -> Result<Self, Error> {
        let mut reader = Reader::new(bytes);
        reader.expect_magic(MAGIC_PARAMETERS)?;
        reader.read_version()?;
        let n = reader.read_u32()? as usize;
        let t = reader.read_u64()?;
        let q = reader.read_biguint()?;
        let sigma = reader.read_sigma_fixed_point()?;
        Ok(Parameters::from_raw(n, t, q, sigma))
    }
}

impl ToBytes for Ciphertext {
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC_CIPHERTEXT);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.push(self.parts.len() as u8);
        out.extend_from_slice(&self.fingerprint());
        for part in &self.parts {
            write_poly(&mut out, part);
        }
        out
    }
}

impl FromBytes for Ciphertext {
    type Context = Arc<Parameters>;

    fn from_bytes(bytes: &[u8], params: Arc<Parameters>) -> Result<Self, Error> {
        let mut reader = Reader::new(bytes);
        reader.expect_magic(MAGIC_CIPHERTEXT)?;
        reader.read_version()?;
        let size = reader.take(1)?[0] as usize;
        if size != 2 && size != 3 {
            return Err(Error::SerializationError(format!(
                "ciphertext has {size} parts, expected 2 or 3"
            )));
        }
        let fingerprint = reader.read_fingerprint()?;
        check_fingerprint(fingerprint, &params)?;
        let parts = (0..size)
            .map(|_| reader.read_poly(params.n()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Ciphertext::new(parts, params))
    }
}

impl ToBytes for SecretKey {
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC_SECRET_KEY);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        write_poly(&mut out, &self.s);
        out
    }
}

impl FromBytes for SecretKey {
    type Context = Arc<Parameters>;

    fn from_bytes(bytes: &[u8], params: Arc<Parameters>) -> Result<Self, Error> {
        let mut reader = Reader::new(bytes);
        reader.expect_magic(MAGIC_SECRET_KEY)?;
        reader.read_version()?;
        let s = reader.read_poly(params.n())?;
        Ok(SecretKey { s })
    }
}

impl ToBytes for PublicKey {
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC_PUBLIC_KEY);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        write_poly(&mut out, &self.b);
        write_poly(&mut out, &self.a);
        out
    }
}

impl FromBytes for PublicKey {
    type Context = Arc<Parameters>;

    fn from_bytes(bytes: &[u8], params: Arc<Parameters>) -> Result<Self, Error> {
        let mut reader = Reader::new(bytes);
        reader.expect_magic(MAGIC_PUBLIC_KEY)?;
        reader.read_version()?;
        let b = reader.read_poly(params.n())?;
        let a = reader.read_poly(params.n())?;
        Ok(PublicKey { b, a })
    }
}

impl ToBytes for RelinearizationKey {
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC_RELIN_KEY);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        write_poly(&mut out, &self.k0.b);
        write_poly(&mut out, &self.k0.a);
        write_poly(&mut out, &self.k1.b);
        write_poly(&mut out, &self.k1.a);
        out
    }
}

impl FromBytes for RelinearizationKey {
    type Context = Arc<Parameters>;

    fn from_bytes(bytes: &[u8], params: Arc<Parameters>) -> Result<Self, Error> {
        let mut reader = Reader::new(bytes);
        reader.expect_magic(MAGIC_RELIN_KEY)?;
        reader.read_version()?;
        let k0b = reader.read_poly(params.n())?;
        let k0a = reader.read_poly(params.n())?;
        let k1b = reader.read_poly(params.n())?;
        let k1a = reader.read_poly(params.n())?;
        Ok(RelinearizationKey {
            k0: RelinKeyPart { b: k0b, a: k0a },
            k1: RelinKeyPart { b: k1b, a: k1a },
        })
    }
}

fn check_fingerprint(actual: [u8; 16], params: &Parameters) -> Result<(), Error> {
    let expected = params.fingerprint();
    if actual != expected {
        return Err(Error::ParameterMismatch(
            "ciphertext was produced under different parameters".into(),
        ));
    }
    Ok(())
}
