//! Signature publisher: stores payload signatures next to the image in its
//! registry.

use std::sync::Arc;

use async_trait::async_trait;
use chains_core::config::{ChainsConfig, OciStorageConfig};
use chains_core::error::{ChainsError, Result};
use chains_core::event::{events, EventEmitter, StorageEvent};
use chains_core::payload::{ImageIdentity, SimpleSigning};
use chains_core::storage::{StorageBackend, StorageOpts, TaskRunRef};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::credentials::{CredentialResolver, Keychain};
use super::reference::DigestReference;
use super::registry::SignatureUploader;
use super::signature::{Repository, SignatureArtifact, SignatureReference};

/// Backend type string.
pub const STORAGE_BACKEND_OCI: &str = "oci";

/// Stores signatures as OCI artifacts attached to the signed image.
///
/// Bound to one build run: credentials are resolved once, for the run's
/// namespace and service account, and reused for every upload.
pub struct OciBackend {
    task_run: TaskRunRef,
    config: OciStorageConfig,
    target_repository: Option<Repository>,
    keychain: Keychain,
    uploader: Arc<dyn SignatureUploader>,
    events: EventEmitter,
    span: tracing::Span,
}

impl OciBackend {
    /// Create a backend for `task_run`.
    ///
    /// Fails with [`ChainsError::CredentialResolution`] when `resolver`
    /// cannot produce credentials for the run's identity.
    pub async fn new(
        task_run: TaskRunRef,
        config: &ChainsConfig,
        resolver: &dyn CredentialResolver,
        uploader: Arc<dyn SignatureUploader>,
    ) -> Result<Self> {
        let config = config.storage.oci.clone();
        let target_repository = config
            .repository
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(Repository::parse)
            .transpose()
            .map_err(|e| ChainsError::Config(format!("storage.oci.repository: {}", e)))?;

        let service_account = task_run.service_account().to_string();
        let keychain = resolver
            .resolve(&task_run.namespace, &service_account)
            .await
            .map_err(|e| match e {
                ChainsError::CredentialResolution { .. } => e,
                other => ChainsError::CredentialResolution {
                    namespace: task_run.namespace.clone(),
                    service_account: service_account.clone(),
                    message: other.to_string(),
                },
            })?;

        let span = tracing::info_span!(
            "oci_storage",
            namespace = %task_run.namespace,
            task_run = %task_run.name,
        );

        Ok(Self {
            task_run,
            config,
            target_repository,
            keychain,
            uploader,
            events: EventEmitter::default(),
            span,
        })
    }

    /// Publish storage events to `events` instead of a private emitter.
    pub fn with_events(mut self, events: EventEmitter) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    /// Where the signature for `image_name` is stored. No network I/O.
    pub fn signature_reference(&self, image_name: &str) -> Result<SignatureReference> {
        let digest = DigestReference::parse(image_name, self.config.insecure)?;
        Ok(SignatureReference::for_digest(
            &digest,
            self.target_repository.as_ref(),
        ))
    }

    /// Store a signature, aborting the upload when `cancel` fires.
    pub async fn store_payload_with_cancel(
        &self,
        raw_payload: &[u8],
        signature: &str,
        opts: &StorageOpts,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.store(raw_payload, signature, opts, cancel)
            .instrument(self.span.clone())
            .await
    }

    async fn store(
        &self,
        raw_payload: &[u8],
        signature: &str,
        opts: &StorageOpts,
        cancel: &CancellationToken,
    ) -> Result<()> {
        tracing::info!(task_run = %self.task_run, "Storing payload in OCI registry");

        let payload = SimpleSigning::from_slice(raw_payload)?;
        let image_name = payload
            .image_name()
            .ok_or(ChainsError::MissingImageIdentity)?;

        let destination = self.signature_reference(&image_name)?;
        tracing::info!(
            image = %image_name,
            reference = %destination,
            "Uploading signature"
        );

        let artifact =
            SignatureArtifact::new(signature, raw_payload, opts.cert(), opts.chain());
        let auth = self.keychain.auth_for(&destination.registry);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ChainsError::Cancelled(format!(
                "upload of {} cancelled",
                destination
            ))),
            result = self.uploader.upload(&destination, &artifact, &auth) => {
                result.map_err(|e| match e {
                    ChainsError::Upload { .. } | ChainsError::Cancelled(_) => e,
                    other => ChainsError::Upload {
                        reference: destination.to_string(),
                        message: other.to_string(),
                    },
                })
            }
        };

        match result {
            Ok(manifest_url) => {
                tracing::info!(
                    image = %image_name,
                    reference = %destination,
                    manifest_url = %manifest_url,
                    "Successfully uploaded signature"
                );
                self.events.emit(
                    StorageEvent::new(events::SIGNATURE_UPLOADED)
                        .with("backend", STORAGE_BACKEND_OCI)
                        .with("image", image_name)
                        .with("reference", destination.to_string())
                        .with("manifest_url", manifest_url),
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(reference = %destination, error = %e, "Signature upload failed");
                self.events.emit(
                    StorageEvent::new(events::SIGNATURE_FAILED)
                        .with("backend", STORAGE_BACKEND_OCI)
                        .with("image", image_name)
                        .with("reference", destination.to_string())
                        .with("error", e.to_string()),
                );
                Err(e)
            }
        }
    }
}

#[async_trait]
impl StorageBackend for OciBackend {
    async fn store_payload(
        &self,
        raw_payload: &[u8],
        signature: &str,
        opts: &StorageOpts,
    ) -> Result<()> {
        self.store_payload_with_cancel(raw_payload, signature, opts, &CancellationToken::new())
            .await
    }

    fn backend_type(&self) -> &'static str {
        STORAGE_BACKEND_OCI
    }
}
