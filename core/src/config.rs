use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ChainsError, Result};

/// ConfigMap key listing the backends OCI signatures are stored in.
pub const KEY_OCI_STORAGE: &str = "artifacts.oci.storage";

/// ConfigMap key overriding the repository signatures are written to.
pub const KEY_OCI_REPOSITORY: &str = "storage.oci.repository";

/// ConfigMap key allowing plain-HTTP or self-signed registries.
pub const KEY_OCI_INSECURE: &str = "storage.oci.repository.insecure";

/// Storage backend used when none is configured.
pub const DEFAULT_OCI_STORAGE: &str = "oci";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainsConfig {
    /// Per-artifact settings
    pub artifacts: ArtifactConfigs,

    /// Per-backend settings
    pub storage: StorageConfigs,
}

/// Artifact settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfigs {
    /// OCI image signatures
    pub oci: ArtifactConfig,
}

/// Settings for one kind of signed artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Names of the storage backends this artifact is written to
    pub storage: Vec<String>,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            storage: vec![DEFAULT_OCI_STORAGE.to_string()],
        }
    }
}

/// Backend settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfigs {
    /// OCI registry backend
    pub oci: OciStorageConfig,
}

/// OCI registry backend configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OciStorageConfig {
    /// Repository to write signatures to instead of the image's own
    pub repository: Option<String>,

    /// Allow plain-HTTP and self-signed registries
    pub insecure: bool,
}

impl ChainsConfig {
    /// Build a configuration from flat ConfigMap data.
    ///
    /// Unknown keys are ignored; missing keys keep their defaults.
    pub fn from_map(data: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(storage) = data.get(KEY_OCI_STORAGE) {
            config.artifacts.oci.storage = split_list(storage);
        }

        if let Some(repository) = data.get(KEY_OCI_REPOSITORY) {
            config.storage.oci.repository = normalize_repository(Some(repository.as_str()));
        }

        if let Some(insecure) = data.get(KEY_OCI_INSECURE) {
            config.storage.oci.insecure = parse_bool(KEY_OCI_INSECURE, insecure)?;
        }

        Ok(config)
    }

    /// Parse a YAML document shaped like [`ChainsConfig`].
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut config: Self = serde_yaml::from_str(yaml)?;
        config.storage.oci.repository =
            normalize_repository(config.storage.oci.repository.as_deref());
        Ok(config)
    }
}

/// A blank repository override means "no override".
fn normalize_repository(repository: Option<&str>) -> Option<String> {
    repository
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}

/// Split a comma or whitespace separated list, dropping empty entries.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "no" => Ok(false),
        "true" | "1" | "yes" => Ok(true),
        other => Err(ChainsError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}
