//! A somewhat-homomorphic BFV encryption engine over the power-of-two cyclotomic ring
//! `R_q = Z_q[X] / (X^N + 1)`.
//!
//! Ciphertexts support homomorphic addition, subtraction, and multiplication (with an explicit
//! relinearization step to keep ciphertext size bounded); decryption recovers the plaintext once
//! enough budget remains under the fixed plaintext modulus.
//!
//! This library has 7 core modules:
//! [`params`]: parameter selection and the NTT-friendly modulus search,
//! [`keys`]: secret, public, and relinearization keys, and the `KeyMaterial` bundle,
//! [`plaintext`]: encoding and decoding integer vectors,
//! [`ciphertext`]: the ciphertext type,
//! [`engine`]: the facade tying parameters, backend, and randomness together,
//! [`backend`]: multiplication backend selection and its always-falls-back policy,
//! [`serialization`]: the wire format shared by every serializable type.

pub mod backend;
pub mod ciphertext;
pub mod engine;
pub mod error;
pub mod keys;
pub mod params;
pub mod plaintext;
pub mod primitives;
pub mod serialization;

pub use backend::{BackendInfo, BackendKind};
pub use ciphertext::Ciphertext;
pub use engine::Engine;
pub use error::{Error, Result};
pub use keys::{KeyMaterial, PublicKey, RelinearizationKey, SecretKey};
pub use params::{Parameters, ParametersBuilder};
pub use plaintext::Plaintext;
pub use serialization::{FromBytes, ToBytes};
