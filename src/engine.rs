//! The public facade: an immutable [`Engine`] bound to one set of [`Parameters`] and one backend,
//! plus an explicit [`KeyMaterial`] bundle threaded through every call that needs key access.
//!
//! The engine itself never holds keys, only parameters, a backend choice, and its random source;
//! every cryptographic operation takes whatever `KeyMaterial` it needs as an argument. This makes
//! concurrent use (one engine, many callers with different key subsets) an ordinary `&self` call
//! rather than a locking concern.

use std::sync::{Arc, Mutex};

use rand::{rngs::StdRng, SeedableRng};

use crate::backend::{self, BackendInfo, BackendKind};
use crate::ciphertext::Ciphertext;
use crate::error::Error;
use crate::keys::{KeyMaterial, PublicKey, RelinearizationKey, SecretKey};
use crate::params::Parameters;
use crate::plaintext::{self, Plaintext};
use crate::primitives::bfv;

/// A BFV instance: fixed parameters, a resolved backend, and a thread-safe source of randomness.
pub struct Engine {
    params: Arc<Parameters>,
    backend: BackendKind,
    backend_info: BackendInfo,
    rng: Mutex<StdRng>,
}

impl Engine {
    /// Builds an engine over `params` with the native backend and OS-seeded randomness.
    pub fn new(params: Parameters) -> Self {
        Self::with_options(params, BackendKind::Native, None)
    }

    /// Builds an engine with a fixed seed, so every sample it draws is reproducible. Intended for
    /// tests and benchmarks, not for production key generation.
    pub fn seeded(params: Parameters, seed: u64) -> Self {
        Self::with_options(params, BackendKind::Native, Some(seed))
    }

    /// Builds an engine honoring the `backend` and `rng_seed` configuration options (§6.1):
    /// `requested` names the multiplication backend to try (falling back to `Native` per
    /// [`backend::resolve_backend`]'s policy if it can't be resolved against `params`), and
    /// `rng_seed` makes every sampler reproducible when set, as for [`Engine::seeded`].
    pub fn with_options(params: Parameters, requested: BackendKind, rng_seed: Option<u64>) -> Self {
        let params = Arc::new(params);
        let (backend, backend_info) = backend::resolve_backend(requested, &params);
        let rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Engine {
            params,
            backend,
            backend_info,
            rng: Mutex::new(rng),
        }
    }

    /// The parameters this engine was built over.
    pub fn parameters(&self) -> &Arc<Parameters> {
        &self.params
    }

    /// Which backend is active, and the parameters it resolved against.
    pub fn backend_info(&self) -> &BackendInfo {
        &self.backend_info
    }

    /// Which [`BackendKind`] is active.
    pub fn backend(&self) -> &BackendKind {
        &self.backend
    }

    /// Generates a fresh secret key and the public key derived from it.
    pub fn generate_keys(&self) -> (SecretKey, PublicKey) {
        let mut rng = self.rng.lock().expect("engine RNG mutex was not poisoned");
        let sk = bfv::generate_secret_key(&self.params, &mut *rng);
        let pk = bfv::generate_public_key(&self.params, &sk, &mut *rng);
        (sk, pk)
    }

    /// Generates a relinearization key for `secret`.
    pub fn generate_relin_key(&self, secret: &SecretKey) -> RelinearizationKey {
        let mut rng = self.rng.lock().expect("engine RNG mutex was not poisoned");
        bfv::generate_relin_key(&self.params, secret, &mut *rng)
    }

    /// Packs an integer vector into a plaintext under this engine's parameters.
    pub fn encode(&self, values: &[u64]) -> Plaintext {
        plaintext::encode(&self.params, values)
    }

    /// Decodes every coefficient of `pt` to its centered representative.
    pub fn decode(&self, pt: &Plaintext) -> Vec<i64> {
        plaintext::decode(&self.params, pt)
    }

    /// Decodes only the first coefficient of `pt`.
    pub fn decode_scalar(&self, pt: &Plaintext) -> i64 {
        plaintext::decode_scalar(&self.params, pt)
    }

    /// Encrypts `pt` under the public key in `keys`.
    pub fn encrypt(&self, keys: &KeyMaterial, pt: &Plaintext) -> Result<Ciphertext, Error> {
        let pk = keys.require_public()?;
        let mut rng = self.rng.lock().expect("engine RNG mutex was not poisoned");
        let parts = bfv::encrypt(&self.params, pk, pt, &mut *rng);
        Ok(Ciphertext::new(parts, self.params.clone()))
    }

    /// Decrypts `ct` under the secret key in `keys`. Accepts both size-2 and size-3 ciphertexts
    /// directly; relinearizing first is recommended for noise efficiency but not required.
    pub fn decrypt(&self, keys: &KeyMaterial, ct: &Ciphertext) -> Result<Plaintext, Error> {
        self.check_fingerprint(ct)?;
        let sk = keys.require_secret()?;
        Ok(bfv::decrypt(&self.params, sk, &ct.parts))
    }

    /// Homomorphic addition. Both operands must carry matching sizes and parameters.
    pub fn add(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, Error> {
        self.check_fingerprint(a)?;
        self.check_fingerprint(b)?;
        self.check_same_size(a, b)?;
        let parts = bfv::add(&self.params, &a.parts, &b.parts);
        Ok(Ciphertext::new(parts, self.params.clone()))
    }

    /// Homomorphic subtraction. Both operands must carry matching sizes and parameters.
    pub fn sub(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, Error> {
        self.check_fingerprint(a)?;
        self.check_fingerprint(b)?;
        self.check_same_size(a, b)?;
        let parts = bfv::sub(&self.params, &a.parts, &b.parts);
        Ok(Ciphertext::new(parts, self.params.clone()))
    }

    /// Homomorphic multiplication: the tensoring product of two size-2 ciphertexts, producing a
    /// size-3 ciphertext. Neither operand needs relinearizing first, but both must be size 2.
    pub fn multiply(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, Error> {
        self.check_fingerprint(a)?;
        self.check_fingerprint(b)?;
        if a.size() != 2 || b.size() != 2 {
            return Err(Error::ParameterMismatch(
                "multiply requires two size-2 ciphertexts".into(),
            ));
        }
        let parts = bfv::multiply(&self.params, &a.parts, &b.parts);
        Ok(Ciphertext::new(parts, self.params.clone()))
    }

    /// Reduces a size-3 ciphertext back to size 2 using the relinearization key in `keys`.
    pub fn relinearize(&self, keys: &KeyMaterial, ct: &Ciphertext) -> Result<Ciphertext, Error> {
        self.check_fingerprint(ct)?;
        if ct.size() != 3 {
            return Err(Error::ParameterMismatch(
                "relinearize requires a size-3 ciphertext".into(),
            ));
        }
        let rlk = keys.require_relin()?;
        let parts = bfv::relinearize(&self.params, rlk, &ct.parts);
        Ok(Ciphertext::new(parts, self.params.clone()))
    }

    fn check_fingerprint(&self, ct: &Ciphertext) -> Result<(), Error> {
        if ct.fingerprint() != self.params.fingerprint() {
            return Err(Error::ParameterMismatch(
                "ciphertext was produced under different parameters".into(),
            ));
        }
        Ok(())
    }

    fn check_same_size(&self, a: &Ciphertext, b: &Ciphertext) -> Result<(), Error> {
        if a.size() != b.size() {
            return Err(Error::ParameterMismatch(format!(
                "ciphertext size mismatch: {} vs {}",
                a.size(),
                b.size()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::ParametersBuilder;

    fn test_engine() -> Engine {
        let params = ParametersBuilder::new()
            .set_degree(64)
            .set_plain_modulus(257)
            .set_modulus_bit_width(40)
            .build()
            .expect("valid parameters");
        Engine::seeded(params, 7)
    }

    #[test]
    fn full_round_trip_through_the_facade() {
        let engine = test_engine();
        let (sk, pk) = engine.generate_keys();
        let keys = KeyMaterial {
            secret: Some(sk),
            public: Some(pk),
            relin: None,
        };

        let pt = engine.encode(&[123]);
        let ct = engine.encrypt(&keys, &pt).expect("encryption succeeds");
        let decrypted = engine.decrypt(&keys, &ct).expect("decryption succeeds");
        assert_eq!(engine.decode_scalar(&decrypted), 123);
    }

    #[test]
    fn multiply_requires_size_two_operands() {
        let engine = test_engine();
        let (sk, pk) = engine.generate_keys();
        let keys = KeyMaterial {
            secret: Some(sk),
            public: Some(pk),
            relin: None,
        };
        let ct = engine
            .encrypt(&keys, &engine.encode(&[1]))
            .expect("encryption succeeds");
        let product = engine.multiply(&ct, &ct).expect("multiply succeeds");
        assert!(engine.multiply(&product, &ct).is_err());
    }

    #[test]
    fn decrypt_without_secret_key_fails() {
        let engine = test_engine();
        let (_, pk) = engine.generate_keys();
        let keys = KeyMaterial {
            secret: None,
            public: Some(pk),
            relin: None,
        };
        let ct = engine
            .encrypt(&keys, &engine.encode(&[1]))
            .expect("encryption succeeds");
        assert!(matches!(
            engine.decrypt(&keys, &ct),
            Err(Error::KeyError(_))
        ));
    }

    #[test]
    fn ciphertext_from_a_different_engine_is_rejected() {
        let engine_a = test_engine();
        let engine_b = {
            let params = ParametersBuilder::new()
                .set_degree(64)
                .set_plain_modulus(17)
                .set_modulus_bit_width(40)
                .build()
                .expect("valid parameters");
            Engine::seeded(params, 7)
        };

        let (sk, pk) = engine_a.generate_keys();
        let keys = KeyMaterial {
            secret: Some(sk),
            public: Some(pk),
            relin: None,
        };
        let ct = engine_a
            .encrypt(&keys, &engine_a.encode(&[1]))
            .expect("encryption succeeds");

        assert!(matches!(
            engine_b.decrypt(&keys, &ct),
            Err(Error::ParameterMismatch(_))
        ));
    }
}
