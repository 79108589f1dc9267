//! Registry credentials for a build identity.
//!
//! A [`CredentialResolver`] turns a namespace and service account into a
//! [`Keychain`]: the registry credentials that identity may push with.
//! [`SecretsDirResolver`] reads them from mounted image-pull secrets laid out
//! as `<root>/<namespace>/<service-account>/config.json`, each a docker
//! `config.json`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chains_core::error::{ChainsError, Result};
use serde::Deserialize;

use super::registry::RegistryAuth;

/// File name of a docker credential file.
const DOCKER_CONFIG_FILE: &str = "config.json";

/// Registry credentials bound to one namespace and service account.
///
/// Immutable once built; cheap to clone and share between concurrent
/// uploads.
#[derive(Debug, Clone, Default)]
pub struct Keychain {
    registries: HashMap<String, RegistryAuth>,
}

impl Keychain {
    /// A keychain with no credentials. Every lookup is anonymous.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Add credentials for a registry. Later entries win.
    pub fn with_registry(mut self, registry: &str, auth: RegistryAuth) -> Self {
        self.registries.insert(normalize_registry(registry), auth);
        self
    }

    /// Credentials for `registry`, anonymous when none are known.
    pub fn auth_for(&self, registry: &str) -> RegistryAuth {
        self.registries
            .get(&normalize_registry(registry))
            .cloned()
            .unwrap_or_else(RegistryAuth::anonymous)
    }

    /// Registries with stored credentials, sorted.
    pub fn registries(&self) -> Vec<String> {
        let mut registries: Vec<String> = self.registries.keys().cloned().collect();
        registries.sort();
        registries
    }
}

/// Resolves the registry credentials of a build identity.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, namespace: &str, service_account: &str) -> Result<Keychain>;
}

/// Docker `config.json` format.
#[derive(Debug, Default, Deserialize)]
struct DockerConfig {
    #[serde(default)]
    auths: HashMap<String, DockerAuthEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct DockerAuthEntry {
    /// base64 of `username:password`
    #[serde(default)]
    auth: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// Resolves credentials from mounted pull-secret directories.
pub struct SecretsDirResolver {
    root: PathBuf,
}

impl SecretsDirResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the credential file for a namespace and service account.
    pub fn config_path(&self, namespace: &str, service_account: &str) -> PathBuf {
        self.root
            .join(namespace)
            .join(service_account)
            .join(DOCKER_CONFIG_FILE)
    }

    fn load(&self, path: &Path) -> std::result::Result<Keychain, String> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let config: DockerConfig = serde_json::from_str(&data)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

        let mut keychain = Keychain::anonymous();
        for (registry, entry) in config.auths {
            let (username, password) = decode_entry(&entry)
                .map_err(|e| format!("Invalid credentials for {}: {}", registry, e))?;
            keychain = keychain.with_registry(
                registry_host(&registry),
                RegistryAuth::basic(username, password),
            );
        }
        Ok(keychain)
    }
}

#[async_trait]
impl CredentialResolver for SecretsDirResolver {
    async fn resolve(&self, namespace: &str, service_account: &str) -> Result<Keychain> {
        let path = self.config_path(namespace, service_account);
        let keychain = self
            .load(&path)
            .map_err(|message| ChainsError::CredentialResolution {
                namespace: namespace.to_string(),
                service_account: service_account.to_string(),
                message,
            })?;

        tracing::debug!(
            namespace,
            service_account,
            registries = ?keychain.registries(),
            "Resolved registry credentials"
        );
        Ok(keychain)
    }
}

fn decode_entry(entry: &DockerAuthEntry) -> std::result::Result<(String, String), String> {
    if let (Some(username), Some(password)) = (&entry.username, &entry.password) {
        return Ok((username.clone(), password.clone()));
    }

    let encoded = entry
        .auth
        .as_deref()
        .ok_or_else(|| "neither auth nor username/password set".to_string())?;
    let decoded = BASE64
        .decode(encoded.trim())
        .map_err(|e| format!("auth is not base64: {}", e))?;
    let decoded = String::from_utf8(decoded).map_err(|_| "auth is not UTF-8".to_string())?;
    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| "auth is not username:password".to_string())?;
    Ok((username.to_string(), password.to_string()))
}

/// Strip scheme and path from a docker config key
/// (e.g., "https://index.docker.io/v1/" → "index.docker.io").
fn registry_host(key: &str) -> &str {
    let key = key
        .strip_prefix("https://")
        .or_else(|| key.strip_prefix("http://"))
        .unwrap_or(key);
    key.split('/').next().unwrap_or(key)
}

/// Normalize registry names (e.g., "docker.io" and "index.docker.io" → "index.docker.io").
fn normalize_registry(registry: &str) -> String {
    let r = registry.trim().to_lowercase();
    if r == "docker.io" || r == "registry-1.docker.io" {
        "index.docker.io".to_string()
    } else {
        r
    }
}
