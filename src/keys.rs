//! Key material: secret key, public key, relinearization key, and the explicit bundle that
//! carries a subset of them to an operation.
//!
//! The engine itself is an immutable value; every cryptographic operation instead takes an
//! explicit `KeyMaterial` bundle naming whichever keys it needs, so there is no hidden state and
//! concurrent use is obvious.

use crate::error::Error;
use crate::primitives::ring::Poly;

/// The secret key `s`: one polynomial with ternary coefficients. Never leaves the decrypting
/// party.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecretKey {
    pub(crate) s: Poly,
}

/// The public key `(b, a)` with `b = -(a*s + e) mod q`. Freely distributable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    pub(crate) b: Poly,
    pub(crate) a: Poly,
}

/// One half of a [`RelinearizationKey`]: an encryption of a known polynomial under `s`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelinKeyPart {
    pub(crate) b: Poly,
    pub(crate) a: Poly,
}

/// The relinearization key: `k0` encrypts `s^2`, `k1` encrypts `T * s^2`. Distributed to the
/// evaluator so it can reduce a size-3 ciphertext back to size 2.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelinearizationKey {
    pub(crate) k0: RelinKeyPart,
    pub(crate) k1: RelinKeyPart,
}

/// An explicit bundle of whichever keys are currently held. Any subset may be absent; an
/// operation that needs a missing piece fails with [`Error::KeyError`] rather than panicking.
#[derive(Clone, Debug, Default)]
pub struct KeyMaterial {
    pub secret: Option<SecretKey>,
    pub public: Option<PublicKey>,
    pub relin: Option<RelinearizationKey>,
}

impl KeyMaterial {
    /// An empty bundle, holding no keys.
    pub fn empty() -> Self {
        KeyMaterial::default()
    }

    /// Returns a new bundle with `relin` populated, keeping `secret`/`public` as they were.
    pub fn with_relin(mut self, relin: RelinearizationKey) -> Self {
        self.relin = Some(relin);
        self
    }

    pub(crate) fn require_secret(&self) -> Result<&SecretKey, Error> {
        self.secret
            .as_ref()
            .ok_or_else(|| Error::KeyError("operation requires a secret key".into()))
    }

    pub(crate) fn require_public(&self) -> Result<&PublicKey, Error> {
        self.public
            .as_ref()
            .ok_or_else(|| Error::KeyError("operation requires a public key".into()))
    }

    pub(crate) fn require_relin(&self) -> Result<&RelinearizationKey, Error> {
        self.relin
            .as_ref()
            .ok_or_else(|| Error::KeyError("operation requires a relinearization key".into()))
    }
}
