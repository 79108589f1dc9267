//! Chains Storage - signature storage backends.
//!
//! Currently provides the OCI registry backend, which attaches payload
//! signatures to the images they attest.

pub mod backends;
pub mod oci;

// Re-export common types
pub use backends::init_backends;
pub use oci::{
    CredentialResolver, DigestReference, Keychain, OciBackend, RegistryAuth, RegistryUploader,
    SecretsDirResolver, SignatureReference, SignatureUploader,
};

/// Chains storage version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
