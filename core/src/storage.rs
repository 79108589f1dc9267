//! Storage backend abstraction shared by every signature destination.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Service account used when a build run does not name one.
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";

/// Certificate material stored alongside a signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOpts {
    /// PEM-encoded signing certificate
    pub cert: Option<String>,

    /// PEM-encoded certificate chain
    pub chain: Option<String>,
}

impl StorageOpts {
    /// Signing certificate, if non-empty.
    pub fn cert(&self) -> Option<&str> {
        self.cert.as_deref().filter(|c| !c.is_empty())
    }

    /// Certificate chain, if non-empty.
    pub fn chain(&self) -> Option<&str> {
        self.chain.as_deref().filter(|c| !c.is_empty())
    }
}

/// Identity of the build run whose outputs are being signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRunRef {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub service_account: Option<String>,
}

impl TaskRunRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            service_account: None,
        }
    }

    pub fn with_service_account(mut self, service_account: impl Into<String>) -> Self {
        self.service_account = Some(service_account.into());
        self
    }

    /// Service account the run executes as, `default` when unset or blank.
    pub fn service_account(&self) -> &str {
        self.service_account
            .as_deref()
            .filter(|sa| !sa.is_empty())
            .unwrap_or(DEFAULT_SERVICE_ACCOUNT)
    }
}

impl std::fmt::Display for TaskRunRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A destination for signed payloads.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store `raw_payload` together with its `signature`.
    async fn store_payload(
        &self,
        raw_payload: &[u8],
        signature: &str,
        opts: &StorageOpts,
    ) -> Result<()>;

    /// Constant identifying the backend variant.
    fn backend_type(&self) -> &'static str;
}
