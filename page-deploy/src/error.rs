//! Error types for page-deploy.

use thiserror::Error;

/// Errors returned by a hosting provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Could not reach the provider.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// Site id not known to the provider.
    #[error("unknown site: {0}")]
    UnknownSite(String),

    /// Deployment id not known to the provider.
    #[error("unknown deployment: {0}")]
    UnknownDeployment(String),

    /// Provider refused the request.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Response body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Any other transport error.
    #[error("http error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for HostError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            HostError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            HostError::InvalidResponse(e.to_string())
        } else {
            HostError::Http(e.to_string())
        }
    }
}

/// Errors that end a deploy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    /// The hosting site could not be created.
    #[error("site provisioning failed: {0}")]
    ProvisioningFailed(String),

    /// The provider did not accept the manifest.
    #[error("manifest rejected: {0}")]
    ManifestFailed(String),

    /// A required file could not be uploaded.
    #[error("upload of {path} failed: {reason}")]
    UploadFailed {
        /// Artifact path.
        path: String,
        /// Provider message.
        reason: String,
    },

    /// The deployment never went live, or a call timed out.
    #[error("deployment failed: {0}")]
    DeploymentFailed(String),

    /// Could not draw a site-name nonce.
    #[error("random source unavailable: {0}")]
    Random(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_error_names_path() {
        let err = DeployError::UploadFailed {
            path: "styles.css".into(),
            reason: "quota".into(),
        };
        assert_eq!(err.to_string(), "upload of styles.css failed: quota");
    }

    #[test]
    fn status_error_display() {
        let err = HostError::Status {
            status: 422,
            body: "bad digest".into(),
        };
        assert_eq!(err.to_string(), "provider returned 422: bad digest");
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DeployError>();
        assert_send_sync::<HostError>();
    }
}
