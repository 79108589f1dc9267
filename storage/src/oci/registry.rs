//! OCI registry client for pushing signature objects.
//!
//! Uses the `oci-distribution` crate to interact with container registries
//! (Docker Hub, GHCR, etc.).

use async_trait::async_trait;
use chains_core::error::{ChainsError, Result};
use oci_distribution::client::{ClientConfig, ClientProtocol, Config, ImageLayer, PushResponse};
use oci_distribution::secrets::RegistryAuth as OciRegistryAuth;
use oci_distribution::{Client, Reference};

use super::signature::{
    SignatureArtifact, SignatureReference, CONFIG_MEDIA_TYPE, SIMPLE_SIGNING_MEDIA_TYPE,
};

/// Authentication credentials for a container registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryAuth {
    username: Option<String>,
    password: Option<String>,
}

impl RegistryAuth {
    /// Create anonymous authentication (no credentials).
    pub fn anonymous() -> Self {
        Self {
            username: None,
            password: None,
        }
    }

    /// Create basic authentication with username and password.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_none() || self.password.is_none()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Convert to oci-distribution auth type.
    fn to_oci_auth(&self) -> OciRegistryAuth {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => OciRegistryAuth::Basic(u.clone(), p.clone()),
            _ => OciRegistryAuth::Anonymous,
        }
    }
}

/// Writes signature objects to a registry.
#[async_trait]
pub trait SignatureUploader: Send + Sync {
    /// Push `artifact` to `destination`, returning the manifest URL.
    ///
    /// An existing object at `destination` is replaced.
    async fn upload(
        &self,
        destination: &SignatureReference,
        artifact: &SignatureArtifact,
        auth: &RegistryAuth,
    ) -> Result<String>;
}

/// Pushes signature objects with the `oci-distribution` client.
pub struct RegistryUploader {
    client: Client,
}

impl RegistryUploader {
    /// Create an uploader speaking HTTPS with verified certificates.
    pub fn new() -> Self {
        Self {
            client: Client::new(ClientConfig {
                protocol: ClientProtocol::Https,
                ..Default::default()
            }),
        }
    }

    /// Client for a registry marked insecure: plain HTTP is allowed for it
    /// and its certificates are not verified.
    fn insecure_client(registry: &str) -> Client {
        Client::new(ClientConfig {
            protocol: ClientProtocol::HttpsExcept(vec![registry.to_string()]),
            accept_invalid_certificates: true,
            ..Default::default()
        })
    }

    /// Convert a SignatureReference to an oci-distribution Reference.
    fn to_oci_reference(reference: &SignatureReference) -> Result<Reference> {
        let ref_str = reference.to_string();
        ref_str.parse::<Reference>().map_err(|e| ChainsError::Upload {
            reference: ref_str.clone(),
            message: format!("Invalid OCI reference: {}", e),
        })
    }
}

impl Default for RegistryUploader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignatureUploader for RegistryUploader {
    async fn upload(
        &self,
        destination: &SignatureReference,
        artifact: &SignatureArtifact,
        auth: &RegistryAuth,
    ) -> Result<String> {
        let oci_ref = Self::to_oci_reference(destination)?;

        let layers = vec![ImageLayer::new(
            artifact.payload.clone(),
            SIMPLE_SIGNING_MEDIA_TYPE.to_string(),
            Some(artifact.annotations.clone().into_iter().collect()),
        )];
        let config = Config::new(artifact.config.clone(), CONFIG_MEDIA_TYPE.to_string(), None);

        tracing::debug!(
            reference = %destination,
            payload_size = artifact.payload.len(),
            insecure = destination.insecure,
            "Pushing signature object"
        );

        let insecure_client;
        let client = if destination.insecure {
            insecure_client = Self::insecure_client(&destination.registry);
            &insecure_client
        } else {
            &self.client
        };

        let response: PushResponse = client
            .push(&oci_ref, &layers, config, &auth.to_oci_auth(), None)
            .await
            .map_err(|e| ChainsError::Upload {
                reference: destination.to_string(),
                message: format!("Failed to push signature: {}", e),
            })?;

        Ok(response.manifest_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig_ref(registry: &str, insecure: bool) -> SignatureReference {
        SignatureReference {
            registry: registry.to_string(),
            repository: "org/app".to_string(),
            tag: "sha256-05f95b26ed10668b7183c1e2da98610e91372fa9f510046d4ce5812addad86b5.sig"
                .to_string(),
            insecure,
        }
    }

    #[test]
    fn test_registry_auth_anonymous() {
        let auth = RegistryAuth::anonymous();
        assert!(auth.is_anonymous());
        assert!(matches!(auth.to_oci_auth(), OciRegistryAuth::Anonymous));
    }

    #[test]
    fn test_registry_auth_basic() {
        let auth = RegistryAuth::basic("user", "pass");
        assert!(!auth.is_anonymous());
        assert_eq!(auth.username(), Some("user"));
        assert!(matches!(
            auth.to_oci_auth(),
            OciRegistryAuth::Basic(u, p) if u == "user" && p == "pass"
        ));
    }

    #[test]
    fn test_to_oci_reference() {
        let oci_ref = RegistryUploader::to_oci_reference(&sig_ref("ghcr.io", false)).unwrap();
        assert_eq!(oci_ref.registry(), "ghcr.io");
        assert_eq!(oci_ref.repository(), "org/app");
        assert_eq!(
            oci_ref.tag(),
            Some("sha256-05f95b26ed10668b7183c1e2da98610e91372fa9f510046d4ce5812addad86b5.sig")
        );
    }

    #[test]
    fn test_to_oci_reference_with_port() {
        let oci_ref =
            RegistryUploader::to_oci_reference(&sig_ref("localhost:5000", true)).unwrap();
        assert_eq!(oci_ref.registry(), "localhost:5000");
    }

    #[tokio::test]
    async fn test_upload_unreachable_registry_is_upload_error() {
        let uploader = RegistryUploader::new();
        let artifact = SignatureArtifact::new("SIG", b"{}", None, None);
        let err = uploader
            .upload(&sig_ref("127.0.0.1:1", true), &artifact, &RegistryAuth::anonymous())
            .await
            .unwrap_err();
        assert!(matches!(err, ChainsError::Upload { .. }));
    }
}
