//! OCI registry storage for payload signatures.
//!
//! A signature over an image payload is pushed to the image's registry as a
//! small OCI artifact addressed by the image digest:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ghcr.io/org/app@sha256:<hex>        (signed image)          │
//! │  ghcr.io/org/app:sha256-<hex>.sig    (signature object)      │
//! │  └── layer: payload (simplesigning)                          │
//! │      ├── dev.cosignproject.cosign/signature                  │
//! │      ├── dev.sigstore.cosign/certificate   (optional)        │
//! │      └── dev.sigstore.cosign/chain         (optional)        │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod credentials;
pub mod reference;
pub mod registry;
pub mod signature;

pub use backend::{OciBackend, STORAGE_BACKEND_OCI};
pub use credentials::{CredentialResolver, Keychain, SecretsDirResolver};
pub use reference::DigestReference;
pub use registry::{RegistryAuth, RegistryUploader, SignatureUploader};
pub use signature::{signature_tag, Repository, SignatureArtifact, SignatureReference};
