//! Signature object naming and layout.
//!
//! A signature for `registry/repo@sha256:<hex>` lives at
//! `registry/repo:sha256-<hex>.sig`. The object is a single-layer OCI image
//! whose layer is the signed payload and whose layer annotations carry the
//! signature and optional certificate material.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use super::reference::{split_registry_repository, DigestReference};
use chains_core::error::Result;

/// Suffix of signature tags.
pub const SIGNATURE_TAG_SUFFIX: &str = "sig";

/// Media type of the signed payload layer.
pub const SIMPLE_SIGNING_MEDIA_TYPE: &str = "application/vnd.dev.cosign.simplesigning.v1+json";

/// Media type of the signature image config.
pub const CONFIG_MEDIA_TYPE: &str = "application/vnd.oci.image.config.v1+json";

pub const SIGNATURE_ANNOTATION: &str = "dev.cosignproject.cosign/signature";
pub const CERTIFICATE_ANNOTATION: &str = "dev.sigstore.cosign/certificate";
pub const CHAIN_ANNOTATION: &str = "dev.sigstore.cosign/chain";

/// Tag under which the signature for `digest` is stored.
///
/// `sha256:<hex>` becomes `sha256-<hex>.sig`.
pub fn signature_tag(digest: &DigestReference) -> String {
    format!(
        "{}-{}.{}",
        digest.digest_algorithm(),
        digest.digest_hex(),
        SIGNATURE_TAG_SUFFIX
    )
}

/// A repository signatures are redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub registry: String,
    pub repository: String,
}

impl Repository {
    /// Parse `registry/path` (no tag, no digest).
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        let (registry, repository) = split_registry_repository(name, name)?;
        Ok(Self {
            registry,
            repository,
        })
    }
}

/// Location of a signature object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureReference {
    pub registry: String,
    pub repository: String,
    pub tag: String,
    /// Inherited from the signed image's reference
    pub insecure: bool,
}

impl SignatureReference {
    /// Derive the signature location for `digest`.
    ///
    /// Uses the image's own repository unless `repository` redirects it.
    /// The tag always comes from the image digest.
    pub fn for_digest(digest: &DigestReference, repository: Option<&Repository>) -> Self {
        let (registry, repository) = match repository {
            Some(target) => (target.registry.clone(), target.repository.clone()),
            None => (digest.registry.clone(), digest.repository.clone()),
        };
        Self {
            registry,
            repository,
            tag: signature_tag(digest),
            insecure: digest.insecure,
        }
    }
}

impl std::fmt::Display for SignatureReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}:{}", self.registry, self.repository, self.tag)
    }
}

/// Contents of a signature object, ready to be pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureArtifact {
    /// Signed payload, stored as the only layer
    pub payload: Vec<u8>,
    /// Layer annotations carrying signature, certificate and chain
    pub annotations: BTreeMap<String, String>,
    /// Image config blob
    pub config: Vec<u8>,
}

impl SignatureArtifact {
    /// Lay out a signature object. Empty `cert`/`chain` are left out.
    pub fn new(signature: &str, payload: &[u8], cert: Option<&str>, chain: Option<&str>) -> Self {
        let mut annotations = BTreeMap::new();
        annotations.insert(SIGNATURE_ANNOTATION.to_string(), signature.to_string());
        if let Some(cert) = cert.filter(|c| !c.is_empty()) {
            annotations.insert(CERTIFICATE_ANNOTATION.to_string(), cert.to_string());
        }
        if let Some(chain) = chain.filter(|c| !c.is_empty()) {
            annotations.insert(CHAIN_ANNOTATION.to_string(), chain.to_string());
        }

        let config = serde_json::json!({
            "architecture": "",
            "os": "",
            "config": {},
            "rootfs": {
                "type": "layers",
                "diff_ids": [payload_digest(payload)],
            },
        });

        Self {
            payload: payload.to_vec(),
            annotations,
            config: config.to_string().into_bytes(),
        }
    }

    pub fn signature(&self) -> Option<&str> {
        self.annotations.get(SIGNATURE_ANNOTATION).map(String::as_str)
    }

    pub fn certificate(&self) -> Option<&str> {
        self.annotations.get(CERTIFICATE_ANNOTATION).map(String::as_str)
    }

    pub fn chain(&self) -> Option<&str> {
        self.annotations.get(CHAIN_ANNOTATION).map(String::as_str)
    }
}

/// `sha256:<hex>` of the payload layer.
pub fn payload_digest(payload: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(payload)))
}
