//! Platform profile resolution.
//!
//! Maps a host identifier (the OS name the process was built for, or an
//! override from configuration) to a resource profile: which model size
//! class to request, how many worker threads to hand the engine, and
//! which compute backend to hint at. Resolution is a pure, total
//! function — unrecognized hosts fall back to [`default_profile`] rather
//! than failing, so downstream initialization never has to handle a
//! missing profile.

use serde::Serialize;

/// Model size class the engine should load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModelSizeClass {
    /// 1B-parameter class for constrained hosts.
    Compact1B,
    /// 3B-parameter class, the default.
    Standard3B,
}

impl ModelSizeClass {
    /// Quantized model identifier handed to the engine at load time.
    pub fn model_id(&self) -> &'static str {
        match self {
            ModelSizeClass::Compact1B => "Llama-3.2-1B-Instruct-q4f16_1",
            ModelSizeClass::Standard3B => "Llama-3.2-3B-Instruct-q4f16_1",
        }
    }
}

/// Compute backend hint passed to engine initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BackendHint {
    /// Portable WASM execution.
    Wasm,
    /// GPU-accelerated path (Metal on iOS, Vulkan on Android).
    WebGpu,
}

/// Resource sizing for one host class.
///
/// Resolved once per process and held as read-only configuration; the
/// thread count is passed to the engine's initialization, not consumed
/// by the pipeline itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformProfile {
    pub model_size: ModelSizeClass,
    pub threads: usize,
    pub backend_hint: BackendHint,
}

/// The documented default: 3B model, 4 threads, WASM backend.
///
/// Every host identifier not listed in [`resolve`]'s table maps here.
pub fn default_profile() -> PlatformProfile {
    PlatformProfile {
        model_size: ModelSizeClass::Standard3B,
        threads: 4,
        backend_hint: BackendHint::Wasm,
    }
}

/// Resolve a host identifier to its platform profile.
///
/// Exactly one profile resolves per host identifier. BSD hosts get the
/// compact model (OpenBSD with the lowest thread count), illumos gets
/// the large model with 8 threads, and the mobile hosts get the
/// GPU-accelerated hint. Anything else — including the empty string —
/// resolves to [`default_profile`].
pub fn resolve(host_id: &str) -> PlatformProfile {
    match host_id {
        "freebsd" => PlatformProfile {
            model_size: ModelSizeClass::Compact1B,
            threads: 4,
            backend_hint: BackendHint::Wasm,
        },
        "openbsd" => PlatformProfile {
            model_size: ModelSizeClass::Compact1B,
            threads: 2,
            backend_hint: BackendHint::Wasm,
        },
        "netbsd" => PlatformProfile {
            model_size: ModelSizeClass::Compact1B,
            threads: 4,
            backend_hint: BackendHint::Wasm,
        },
        // illumos / OmniOS
        "sunos" | "illumos" => PlatformProfile {
            model_size: ModelSizeClass::Standard3B,
            threads: 8,
            backend_hint: BackendHint::Wasm,
        },
        "ios" | "android" => PlatformProfile {
            model_size: ModelSizeClass::Standard3B,
            threads: 4,
            backend_hint: BackendHint::WebGpu,
        },
        _ => default_profile(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_host_gets_default() {
        assert_eq!(resolve("unknown-host"), default_profile());
        assert_eq!(resolve(""), default_profile());
    }

    #[test]
    fn test_known_hosts() {
        let openbsd = resolve("openbsd");
        assert_eq!(openbsd.model_size, ModelSizeClass::Compact1B);
        assert_eq!(openbsd.threads, 2);

        let sunos = resolve("sunos");
        assert_eq!(sunos.model_size, ModelSizeClass::Standard3B);
        assert_eq!(sunos.threads, 8);
        assert_eq!(resolve("illumos"), sunos);
    }

    #[test]
    fn test_mobile_hosts_hint_webgpu() {
        assert_eq!(resolve("ios").backend_hint, BackendHint::WebGpu);
        assert_eq!(resolve("android").backend_hint, BackendHint::WebGpu);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        for host in ["freebsd", "linux", "macos", "sunos", ""] {
            assert_eq!(resolve(host), resolve(host));
        }
    }

    #[test]
    fn test_all_profiles_have_positive_threads() {
        for host in ["freebsd", "openbsd", "netbsd", "sunos", "ios", "other"] {
            assert!(resolve(host).threads >= 1);
        }
    }

    #[test]
    fn test_model_ids() {
        assert!(ModelSizeClass::Compact1B.model_id().contains("1B"));
        assert!(ModelSizeClass::Standard3B.model_id().contains("3B"));
    }
}
