//! Backend dispatch: builds the storage backends a configuration enables.

use std::collections::HashMap;
use std::sync::Arc;

use chains_core::config::{ChainsConfig, KEY_OCI_STORAGE};
use chains_core::error::{ChainsError, Result};
use chains_core::storage::{StorageBackend, TaskRunRef};

use crate::oci::{CredentialResolver, OciBackend, SignatureUploader, STORAGE_BACKEND_OCI};

/// Build every backend listed under `artifacts.oci.storage`, keyed by type.
///
/// Duplicate names build one backend. An unknown name fails the whole call
/// so a typo in the configuration is not silently ignored.
pub async fn init_backends(
    task_run: &TaskRunRef,
    config: &ChainsConfig,
    resolver: &dyn CredentialResolver,
    uploader: Arc<dyn SignatureUploader>,
) -> Result<HashMap<String, Box<dyn StorageBackend>>> {
    let mut backends: HashMap<String, Box<dyn StorageBackend>> = HashMap::new();

    for name in &config.artifacts.oci.storage {
        if backends.contains_key(name) {
            continue;
        }
        let backend: Box<dyn StorageBackend> = match name.as_str() {
            STORAGE_BACKEND_OCI => Box::new(
                OciBackend::new(task_run.clone(), config, resolver, uploader.clone()).await?,
            ),
            other => {
                return Err(ChainsError::Config(format!(
                    "{}: unknown storage backend '{}'",
                    KEY_OCI_STORAGE, other
                )))
            }
        };
        tracing::debug!(backend = %name, task_run = %task_run, "Initialized storage backend");
        backends.insert(name.clone(), backend);
    }

    Ok(backends)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oci::{Keychain, RegistryUploader};
    use async_trait::async_trait;

    struct AnonymousResolver;

    #[async_trait]
    impl CredentialResolver for AnonymousResolver {
        async fn resolve(&self, _namespace: &str, _service_account: &str) -> Result<Keychain> {
            Ok(Keychain::anonymous())
        }
    }

    fn config(storage: &[&str]) -> ChainsConfig {
        let mut config = ChainsConfig::default();
        config.artifacts.oci.storage = storage.iter().map(|s| s.to_string()).collect();
        config
    }

    #[tokio::test]
    async fn test_default_config_builds_oci() {
        let backends = init_backends(
            &TaskRunRef::new("build", "run"),
            &ChainsConfig::default(),
            &AnonymousResolver,
            Arc::new(RegistryUploader::new()),
        )
        .await
        .unwrap();

        assert_eq!(backends.len(), 1);
        assert_eq!(backends["oci"].backend_type(), "oci");
    }

    #[tokio::test]
    async fn test_duplicate_names() {
        let backends = init_backends(
            &TaskRunRef::new("build", "run"),
            &config(&["oci", "oci"]),
            &AnonymousResolver,
            Arc::new(RegistryUploader::new()),
        )
        .await
        .unwrap();
        assert_eq!(backends.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_list() {
        let backends = init_backends(
            &TaskRunRef::new("build", "run"),
            &config(&[]),
            &AnonymousResolver,
            Arc::new(RegistryUploader::new()),
        )
        .await
        .unwrap();
        assert!(backends.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_backend() {
        let result = init_backends(
            &TaskRunRef::new("build", "run"),
            &config(&["oci", "gcs"]),
            &AnonymousResolver,
            Arc::new(RegistryUploader::new()),
        )
        .await;
        match result {
            Err(ChainsError::Config(message)) => assert!(message.contains("'gcs'")),
            _ => panic!("expected configuration error"),
        }
    }
}
