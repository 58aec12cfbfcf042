//! The ciphertext type: a size-2 or size-3 vector of ring polynomials, tagged with the
//! [`Parameters`] it was encrypted under so mismatched operands are caught before they produce
//! garbage instead of an error.

use std::sync::Arc;

use crate::params::Parameters;
use crate::primitives::ring::Poly;

/// A BFV ciphertext: 2 parts fresh from encryption or after relinearization, 3 parts after a
/// multiplication that hasn't been relinearized yet.
#[derive(Clone, Debug)]
pub struct Ciphertext {
    pub(crate) parts: Vec<Poly>,
    pub(crate) params: Arc<Parameters>,
}

impl Ciphertext {
    pub(crate) fn new(parts: Vec<Poly>, params: Arc<Parameters>) -> Self {
        debug_assert!(parts.len() == 2 || parts.len() == 3);
        Ciphertext { parts, params }
    }

    /// The number of ring-polynomial parts: 2 for a fresh or relinearized ciphertext, 3 for the
    /// direct output of a multiplication.
    pub fn size(&self) -> usize {
        self.parts.len()
    }

    /// The parameters this ciphertext was produced under.
    pub fn parameters(&self) -> &Arc<Parameters> {
        &self.params
    }

    /// The 16-byte identity fingerprint of the parameters this ciphertext was produced under, for
    /// cheaply checking compatibility before a homomorphic operation.
    pub fn fingerprint(&self) -> [u8; 16] {
        self.params.fingerprint()
    }
}
