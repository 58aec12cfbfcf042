//! Multiplication backend selection.
//!
//! An accelerated (NTT-based) multiplier may be requested but unavailable, in which case
//! resolution falls back to the native kernel silently rather than failing construction. This
//! crate has only one multiplication kernel today ([`crate::primitives::ring::mul_raw`]), so
//! `Accelerated` can never currently be selected, but the strategy and its fallback-never-fails
//! contract are kept so an NTT backend can be added later without changing any public signature.

use crate::params::Parameters;

/// Which multiplication kernel an [`crate::engine::Engine`] is using.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// The arbitrary-precision schoolbook convolution in [`crate::primitives::ring`].
    Native,
    /// A faster kernel, named by implementation (e.g. `"ntt"`). Never produced today; see the
    /// module documentation.
    Accelerated(String),
}

impl BackendKind {
    fn label(&self) -> String {
        match self {
            BackendKind::Native => "native".to_string(),
            BackendKind::Accelerated(name) => name.clone(),
        }
    }
}

/// A snapshot of which backend is active and the parameters it was resolved against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendInfo {
    pub backend_name: String,
    pub multiplication: String,
    pub q: String,
    pub ntt_friendly: bool,
}

/// Resolves the requested backend against `params`, falling back to [`BackendKind::Native`] with
/// a diagnostic log if acceleration was requested but isn't available for these parameters.
///
/// This never fails: an unusable accelerated backend is a degraded-performance event, not a
/// construction error.
pub fn resolve_backend(requested: BackendKind, params: &Parameters) -> (BackendKind, BackendInfo) {
    let resolved = match &requested {
        BackendKind::Native => BackendKind::Native,
        BackendKind::Accelerated(name) => {
            if params.ntt_friendly() && is_accelerated_backend_available(name) {
                requested.clone()
            } else {
                tracing::warn!(
                    requested = %name,
                    ntt_friendly = params.ntt_friendly(),
                    "accelerated backend unavailable for these parameters, falling back to native"
                );
                BackendKind::Native
            }
        }
    };

    let info = BackendInfo {
        backend_name: resolved.label(),
        multiplication: resolved.label(),
        q: params.q().to_string(),
        ntt_friendly: params.ntt_friendly(),
    };
    (resolved, info)
}

/// Whether an accelerated kernel named `name` is compiled into this build. Always `false` today;
/// this is the single seam a future NTT backend would change.
fn is_accelerated_backend_available(_name: &str) -> bool {
    false
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::ParametersBuilder;

    fn test_params() -> Parameters {
        ParametersBuilder::new()
            .set_degree(16)
            .set_plain_modulus(17)
            .set_modulus_bit_width(20)
            .build()
            .expect("valid parameters")
    }

    #[test]
    fn native_backend_resolves_to_itself() {
        let params = test_params();
        let (resolved, info) = resolve_backend(BackendKind::Native, &params);
        assert_eq!(resolved, BackendKind::Native);
        assert_eq!(info.backend_name, "native");
    }

    #[test]
    fn requesting_accelerated_falls_back_to_native() {
        let params = test_params();
        let (resolved, info) =
            resolve_backend(BackendKind::Accelerated("ntt".into()), &params);
        assert_eq!(resolved, BackendKind::Native);
        assert_eq!(info.multiplication, "native");
    }
}
