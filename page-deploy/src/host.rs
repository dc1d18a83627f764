//! Hosting provider interface.
//!
//! Providers are content-addressed: [`HostingProvider::create_deployment`]
//! receives the full manifest and answers with the hashes it does not
//! already hold. Only those are uploaded.

use std::sync::Arc;

use async_trait::async_trait;
use pagecraft_core::RemoteStatus;
use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::manifest::{DeployFile, DeploymentManifest};

/// A provisioned hosting site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteInfo {
    /// Provider site id.
    pub id: String,
    /// Site name (slug plus nonce).
    pub name: String,
    /// Public URL of the site.
    pub url: String,
}

/// A deployment accepted by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentTicket {
    /// Provider deployment id.
    pub id: String,
    /// Hashes the provider still needs.
    #[serde(default)]
    pub required: Vec<String>,
}

/// A static hosting backend.
#[async_trait]
pub trait HostingProvider: Send + Sync {
    /// Provision a new site.
    async fn create_site(&self, name: &str) -> Result<SiteInfo, HostError>;

    /// Start a deployment of `manifest` on `site_id`.
    async fn create_deployment(
        &self,
        site_id: &str,
        manifest: &DeploymentManifest,
    ) -> Result<DeploymentTicket, HostError>;

    /// Upload one file whose hash was listed as required.
    async fn upload_file(&self, deployment_id: &str, file: &DeployFile) -> Result<(), HostError>;

    /// Current state of a deployment.
    async fn deployment_status(&self, deployment_id: &str) -> Result<RemoteStatus, HostError>;
}

#[async_trait]
impl<T: HostingProvider + ?Sized> HostingProvider for Arc<T> {
    async fn create_site(&self, name: &str) -> Result<SiteInfo, HostError> {
        (**self).create_site(name).await
    }

    async fn create_deployment(
        &self,
        site_id: &str,
        manifest: &DeploymentManifest,
    ) -> Result<DeploymentTicket, HostError> {
        (**self).create_deployment(site_id, manifest).await
    }

    async fn upload_file(&self, deployment_id: &str, file: &DeployFile) -> Result<(), HostError> {
        (**self).upload_file(deployment_id, file).await
    }

    async fn deployment_status(&self, deployment_id: &str) -> Result<RemoteStatus, HostError> {
        (**self).deployment_status(deployment_id).await
    }
}
