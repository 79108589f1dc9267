use thiserror::Error;

/// Chains storage error types
#[derive(Error, Debug)]
pub enum ChainsError {
    /// Registry credentials could not be resolved for a build identity
    #[error("Credential resolution failed for {namespace}/{service_account}: {message}")]
    CredentialResolution {
        namespace: String,
        service_account: String,
        message: String,
    },

    /// Payload is not of the shape this backend stores
    #[error("Payload format error: {0}")]
    PayloadFormat(String),

    /// Payload carries no image name
    #[error("Payload does not identify an image")]
    MissingImageIdentity,

    /// Image reference does not parse
    #[error("Invalid reference '{reference}': {message}")]
    InvalidReference { reference: String, message: String },

    /// Image reference has no content digest
    #[error("Reference '{0}' has no digest; signing requires a content-addressed image")]
    UnresolvedDigest(String),

    /// Registry rejected or failed the signature upload
    #[error("Upload to {reference} failed: {message}")]
    Upload { reference: String, message: String },

    /// Operation cancelled by the caller
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ChainsError {
    fn from(err: serde_json::Error) -> Self {
        ChainsError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for ChainsError {
    fn from(err: serde_yaml::Error) -> Self {
        ChainsError::Serialization(err.to_string())
    }
}

/// Result type alias for chains storage operations
pub type Result<T> = std::result::Result<T, ChainsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_resolution_display() {
        let error = ChainsError::CredentialResolution {
            namespace: "build".to_string(),
            service_account: "pipeline".to_string(),
            message: "no pull secrets".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Credential resolution failed for build/pipeline: no pull secrets"
        );
    }

    #[test]
    fn test_payload_format_display() {
        let error = ChainsError::PayloadFormat("expected object".to_string());
        assert_eq!(error.to_string(), "Payload format error: expected object");
    }

    #[test]
    fn test_missing_image_identity_display() {
        assert_eq!(
            ChainsError::MissingImageIdentity.to_string(),
            "Payload does not identify an image"
        );
    }

    #[test]
    fn test_invalid_reference_display() {
        let error = ChainsError::InvalidReference {
            reference: "UPPER/case@sha256:00".to_string(),
            message: "repository must be lowercase".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid reference 'UPPER/case@sha256:00': repository must be lowercase"
        );
    }

    #[test]
    fn test_unresolved_digest_display() {
        let error = ChainsError::UnresolvedDigest("ghcr.io/org/app:v1".to_string());
        assert!(error.to_string().contains("ghcr.io/org/app:v1"));
        assert!(error.to_string().contains("no digest"));
    }

    #[test]
    fn test_upload_display() {
        let error = ChainsError::Upload {
            reference: "ghcr.io/org/app:sha256-abc.sig".to_string(),
            message: "403 Forbidden".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Upload to ghcr.io/org/app:sha256-abc.sig failed: 403 Forbidden"
        );
    }

    #[test]
    fn test_cancelled_display() {
        let error = ChainsError::Cancelled("upload aborted".to_string());
        assert_eq!(error.to_string(), "Cancelled: upload aborted");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: ChainsError = io_error.into();
        assert!(matches!(error, ChainsError::Io(_)));
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let error: ChainsError = result.unwrap_err().into();
        assert!(matches!(error, ChainsError::Serialization(_)));
    }

    #[test]
    fn test_serde_yaml_error_conversion() {
        let result: std::result::Result<serde_yaml::Value, _> =
            serde_yaml::from_str("invalid: yaml: content:");
        let error: ChainsError = result.unwrap_err().into();
        assert!(matches!(error, ChainsError::Serialization(_)));
    }
}
