//! Digest reference parsing.
//!
//! Parses image names like `ghcr.io/org/app@sha256:...` into the registry,
//! repository and content digest that signatures are addressed by. Tags are
//! accepted and dropped; a name without a digest is rejected.

use chains_core::error::{ChainsError, Result};

/// Default registry when none is specified.
const DEFAULT_REGISTRY: &str = "docker.io";

/// The only digest algorithm accepted.
const SHA256: &str = "sha256";

/// Hex length of a sha256 digest.
const SHA256_HEX_LEN: usize = 64;

/// Longest tag a registry accepts.
const MAX_TAG_LEN: usize = 128;

/// Content-addressed OCI image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DigestReference {
    /// Registry hostname, with port if any (e.g., "ghcr.io", "localhost:5000")
    pub registry: String,
    /// Repository path (e.g., "library/nginx", "org/app")
    pub repository: String,
    /// Digest (e.g., "sha256:abc123...")
    pub digest: String,
    /// Whether the registry may be reached without verified TLS
    pub insecure: bool,
}

impl DigestReference {
    /// Parse an image name that carries a digest.
    ///
    /// Supports formats:
    /// - `nginx@sha256:...` → docker.io/library/nginx@sha256:...
    /// - `org/app:v1@sha256:...` → docker.io/org/app@sha256:...
    /// - `ghcr.io/org/app@sha256:...` → ghcr.io/org/app@sha256:...
    /// - `localhost:5000/app@sha256:...` → localhost:5000/app@sha256:...
    pub fn parse(name: &str, insecure: bool) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid(name, "empty image reference"));
        }

        let (name_tag, digest) = match name.split_once('@') {
            Some((_, digest)) if digest.contains('@') => {
                return Err(invalid(name, "more than one '@' separator"));
            }
            Some((name_tag, digest)) => (name_tag, digest),
            None => return Err(ChainsError::UnresolvedDigest(name.to_string())),
        };

        validate_digest(name, digest)?;

        let (repository_name, tag) = split_tag(name_tag);
        if let Some(tag) = tag {
            validate_tag(name, tag)?;
        }
        let (registry, repository) = split_registry_repository(name, repository_name)?;

        Ok(DigestReference {
            registry,
            repository,
            digest: digest.to_string(),
            insecure,
        })
    }

    /// Hex part of the digest.
    pub fn digest_hex(&self) -> &str {
        self.digest
            .split_once(':')
            .map(|(_, hex)| hex)
            .unwrap_or(&self.digest)
    }

    /// Algorithm part of the digest.
    pub fn digest_algorithm(&self) -> &str {
        self.digest
            .split_once(':')
            .map(|(algorithm, _)| algorithm)
            .unwrap_or(SHA256)
    }
}

impl std::fmt::Display for DigestReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.registry, self.repository, self.digest)
    }
}

/// Split a repository string (no tag, no digest) into registry and path.
///
/// Shared with repository overrides, which are given in the same form.
pub(crate) fn split_registry_repository(reference: &str, name: &str) -> Result<(String, String)> {
    // The first component is a registry if it looks like a hostname
    // (contains a dot or colon, or is "localhost")
    let (registry, repository) = match name.split_once('/') {
        Some((first, rest))
            if first.contains('.') || first.contains(':') || first == "localhost" =>
        {
            (first.to_string(), rest.to_string())
        }
        _ if name.contains('/') => (DEFAULT_REGISTRY.to_string(), name.to_string()),
        // Single name like "nginx" → "library/nginx" for Docker Hub
        _ => (DEFAULT_REGISTRY.to_string(), format!("library/{}", name)),
    };

    validate_registry(reference, &registry)?;
    validate_repository(reference, &repository)?;
    Ok((registry, repository))
}

/// Split off a `:tag` suffix, leaving a registry port alone.
fn split_tag(name_tag: &str) -> (&str, Option<&str>) {
    let last_component = name_tag.rfind('/').map(|pos| pos + 1).unwrap_or(0);
    match name_tag[last_component..].rfind(':') {
        Some(colon) => (
            &name_tag[..last_component + colon],
            Some(&name_tag[last_component + colon + 1..]),
        ),
        None => (name_tag, None),
    }
}

/// Tags follow `[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}`.
fn validate_tag(reference: &str, tag: &str) -> Result<()> {
    let mut chars = tag.chars();
    let valid_first = chars.next().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if !valid_first || !valid_rest || tag.len() > MAX_TAG_LEN {
        return Err(invalid(reference, &format!("invalid tag '{}'", tag)));
    }
    Ok(())
}

/// Registries are `host[:port]` with a numeric port.
fn validate_registry(reference: &str, registry: &str) -> Result<()> {
    let (host, port) = match registry.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (registry, None),
    };

    let valid_host = !host.is_empty()
        && host.split('.').all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
    if !valid_host {
        return Err(invalid(reference, &format!("invalid registry host '{}'", host)));
    }

    if let Some(port) = port {
        if port.is_empty() || port.len() > 5 || !port.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid(
                reference,
                &format!("registry port must be numeric, got '{}'", port),
            ));
        }
    }
    Ok(())
}

fn validate_repository(reference: &str, repository: &str) -> Result<()> {
    if repository.is_empty() || repository == "library/" {
        return Err(invalid(reference, "empty repository"));
    }
    if repository.split('/').any(str::is_empty) {
        return Err(invalid(reference, "empty path component in repository"));
    }
    if let Some(c) = repository
        .chars()
        .find(|c| !matches!(c, 'a'..='z' | '0'..='9' | '.' | '_' | '-' | '/'))
    {
        return Err(invalid(
            reference,
            &format!("repository may only contain [a-z0-9._/-], found '{}'", c),
        ));
    }
    Ok(())
}

fn validate_digest(reference: &str, digest: &str) -> Result<()> {
    let (algorithm, hex) = digest
        .split_once(':')
        .ok_or_else(|| invalid(reference, "digest must be algorithm:hex"))?;

    if algorithm != SHA256 {
        return Err(invalid(
            reference,
            &format!("unsupported digest algorithm '{}'", algorithm),
        ));
    }
    if hex.len() != SHA256_HEX_LEN
        || !hex.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
    {
        return Err(invalid(
            reference,
            "sha256 digest must be 64 lowercase hex characters",
        ));
    }
    Ok(())
}

fn invalid(reference: &str, message: &str) -> ChainsError {
    ChainsError::InvalidReference {
        reference: reference.to_string(),
        message: message.to_string(),
    }
}
