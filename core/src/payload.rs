//! Signed payload formats.
//!
//! Storage backends only need to know which image a payload attests, so
//! they depend on [`ImageIdentity`] rather than a concrete format.
//! [`SimpleSigning`] is the container image signature document written by
//! the signing pipeline for OCI artifacts:
//!
//! ```json
//! {
//!   "critical": {
//!     "identity": { "docker-reference": "ghcr.io/org/app" },
//!     "image": { "docker-manifest-digest": "sha256:..." },
//!     "type": "cosign container image signature"
//!   },
//!   "optional": null
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ChainsError, Result};

/// Type string of a container image signature document.
pub const SIMPLE_SIGNING_TYPE: &str = "cosign container image signature";

/// A payload that names the image it attests.
pub trait ImageIdentity {
    /// Image name in `repository[:tag]@digest` form, or `None` when the
    /// payload carries no image reference.
    fn image_name(&self) -> Option<String>;
}

/// Container image signature payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleSigning {
    pub critical: Critical,
    #[serde(default)]
    pub optional: Option<BTreeMap<String, serde_json::Value>>,
}

/// Fields a verifier must understand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Critical {
    pub identity: Identity,
    pub image: Image,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "docker-reference", default)]
    pub docker_reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    #[serde(rename = "docker-manifest-digest", default)]
    pub docker_manifest_digest: String,
}

impl SimpleSigning {
    /// Build a payload for `reference` at `digest`.
    pub fn new(reference: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            critical: Critical {
                identity: Identity {
                    docker_reference: reference.into(),
                },
                image: Image {
                    docker_manifest_digest: digest.into(),
                },
                type_name: SIMPLE_SIGNING_TYPE.to_string(),
            },
            optional: None,
        }
    }

    /// Deserialize a raw payload.
    ///
    /// Anything that is not a simple signing document is a
    /// [`ChainsError::PayloadFormat`]: the caller routed a payload of another
    /// kind to a backend that only stores image signatures.
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw).map_err(|e| {
            ChainsError::PayloadFormat(format!(
                "only OCI artifacts can be stored in an OCI registry: {}",
                e
            ))
        })
    }
}

impl ImageIdentity for SimpleSigning {
    fn image_name(&self) -> Option<String> {
        let reference = self.critical.identity.docker_reference.trim();
        if reference.is_empty() {
            return None;
        }
        let digest = self.critical.image.docker_manifest_digest.trim();
        if digest.is_empty() {
            Some(reference.to_string())
        } else {
            Some(format!("{}@{}", reference, digest))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "sha256:05f95b26ed10668b7183c1e2da98610e91372fa9f510046d4ce5812addad86b5";

    #[test]
    fn test_parse_document() {
        let raw = format!(
            r#"{{"critical":{{"identity":{{"docker-reference":"ghcr.io/org/app"}},"image":{{"docker-manifest-digest":"{}"}},"type":"cosign container image signature"}},"optional":null}}"#,
            DIGEST
        );
        let payload = SimpleSigning::from_slice(raw.as_bytes()).unwrap();
        assert_eq!(payload.critical.identity.docker_reference, "ghcr.io/org/app");
        assert_eq!(payload.critical.type_name, SIMPLE_SIGNING_TYPE);
        assert_eq!(
            payload.image_name(),
            Some(format!("ghcr.io/org/app@{}", DIGEST))
        );
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let json = serde_json::to_string(&SimpleSigning::new("ghcr.io/org/app", DIGEST)).unwrap();
        assert!(json.contains("\"docker-reference\":\"ghcr.io/org/app\""));
        assert!(json.contains("\"docker-manifest-digest\""));
        assert!(json.contains("\"type\":\"cosign container image signature\""));
    }

    #[test]
    fn test_optional_annotations() {
        let raw = br#"{"critical":{"identity":{"docker-reference":"a/b"},"image":{"docker-manifest-digest":"sha256:00"},"type":"t"},"optional":{"builder":"tekton"}}"#;
        let payload = SimpleSigning::from_slice(raw).unwrap();
        let optional = payload.optional.unwrap();
        assert_eq!(optional["builder"], serde_json::json!("tekton"));
    }

    #[test]
    fn test_not_json() {
        let err = SimpleSigning::from_slice(b"not json").unwrap_err();
        assert!(matches!(err, ChainsError::PayloadFormat(_)));
        assert!(err.to_string().contains("only OCI artifacts"));
    }

    #[test]
    fn test_wrong_shape() {
        let raw = br#"{"_type":"https://in-toto.io/Statement/v0.1","subject":[]}"#;
        let err = SimpleSigning::from_slice(raw).unwrap_err();
        assert!(matches!(err, ChainsError::PayloadFormat(_)));
    }

    #[test]
    fn test_image_name_without_digest() {
        let payload = SimpleSigning::new("ghcr.io/org/app:v1", "");
        assert_eq!(payload.image_name(), Some("ghcr.io/org/app:v1".to_string()));
    }

    #[test]
    fn test_image_name_missing_reference() {
        let payload = SimpleSigning::new("  ", DIGEST);
        assert_eq!(payload.image_name(), None);
    }
}
