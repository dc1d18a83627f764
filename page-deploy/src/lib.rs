//! # page-deploy
//!
//! Content-addressed deployment of compiled pages.
//!
//! ## Deploy Flow
//!
//! ```text
//! CompiledArtifact → 4 files → SHA-256 → manifest ─┐
//!                                                   ↓
//!        create_site (first publish only) → create_deployment
//!                                                   ↓
//!                          provider answers `required` hashes
//!                                                   ↓
//!                 upload required files (bounded concurrency)
//!                                                   ↓
//!                 poll deployment_status until ready / error
//! ```
//!
//! A file whose hash the provider already holds is never uploaded again, so
//! re-deploying an unchanged page transfers nothing. Every provider call is
//! bounded by [`DeployConfig::request_timeout`]. There is no automatic retry.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pagecraft_deploy::{DeployClient, DeployConfig, MemoryHost};
//!
//! let client = DeployClient::new(MemoryHost::new(), DeployConfig::default());
//! let outcome = client.deploy(&artifact, &page).await?;
//! println!("live at {}", outcome.url);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
pub mod headers;
mod host;
mod http;
pub mod manifest;
mod memory;

use std::collections::{HashSet, VecDeque};
use std::future::Future;

use futures_util::stream::{self, StreamExt};
use pagecraft_core::{DeployAction, DeployEvent, DeployState};
use pagecraft_types::{CompiledArtifact, PageDocument};
use tracing::{debug, error, info};

pub use config::DeployConfig;
pub use error::{DeployError, HostError};
pub use host::{DeploymentTicket, HostingProvider, SiteInfo};
pub use http::HttpHost;
pub use manifest::{artifact_files, content_hash, DeployFile, DeploymentManifest};
pub use memory::{MemoryHost, ServedFile, UploadRecord};

/// Result of a successful deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    /// Public URL.
    pub url: String,
    /// Hosting site id (new on first publish).
    pub site_id: String,
    /// Provider deployment id.
    pub deployment_id: String,
    /// Paths uploaded in this deploy, sorted.
    pub uploaded: Vec<String>,
    /// Paths the provider already held, sorted.
    pub skipped: Vec<String>,
    /// Manifest that was deployed.
    pub manifest: DeploymentManifest,
}

/// Ships compiled artifacts to a [`HostingProvider`].
pub struct DeployClient<H: HostingProvider> {
    host: H,
    config: DeployConfig,
}

impl<H: HostingProvider> DeployClient<H> {
    /// Create a client for `host`.
    pub fn new(host: H, config: DeployConfig) -> Self {
        Self { host, config }
    }

    /// Get a reference to the provider.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Active configuration.
    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// The page's hosting site id, provisioning a new site when it has none.
    ///
    /// Callers that persist the id before deploying keep it even if the
    /// deploy then fails, so a retry reuses the site and the files it holds.
    ///
    /// # Errors
    ///
    /// - `ProvisioningFailed` if the site cannot be created
    /// - `DeploymentFailed` if the provider times out
    pub async fn ensure_site(&self, page: &PageDocument) -> Result<String, DeployError> {
        match &page.hosting_site_id {
            Some(site_id) => Ok(site_id.clone()),
            None => self.provision(&page.slug).await,
        }
    }

    /// Deploy `artifact` for `page`.
    ///
    /// Provisions a site when `page.hosting_site_id` is unset. The caller is
    /// responsible for recording the returned site id on the page; see
    /// [`DeployClient::ensure_site`] to do that before the deployment starts.
    ///
    /// # Errors
    ///
    /// - `ProvisioningFailed` if the site cannot be created
    /// - `ManifestFailed` if the provider rejects the manifest
    /// - `UploadFailed` if a required file cannot be uploaded
    /// - `DeploymentFailed` on a provider error, exhausted polls or a timeout
    pub async fn deploy(
        &self,
        artifact: &CompiledArtifact,
        page: &PageDocument,
    ) -> Result<DeployOutcome, DeployError> {
        let result = self.run(artifact, page).await;
        match &result {
            Ok(outcome) => info!(
                page_id = %page.id,
                site_id = %outcome.site_id,
                deployment_id = %outcome.deployment_id,
                uploaded = outcome.uploaded.len(),
                skipped = outcome.skipped.len(),
                url = %outcome.url,
                "deployment live"
            ),
            Err(e) => error!(page_id = %page.id, error = %e, "deployment failed"),
        }
        result
    }

    async fn run(
        &self,
        artifact: &CompiledArtifact,
        page: &PageDocument,
    ) -> Result<DeployOutcome, DeployError> {
        let files = artifact_files(artifact);
        let manifest = DeploymentManifest::from_files(&files);

        let site_id = self.ensure_site(page).await?;

        let ticket = self
            .timed("create_deployment", self.host.create_deployment(&site_id, &manifest))
            .await?
            .map_err(|e| DeployError::ManifestFailed(e.to_string()))?;
        info!(
            site_id = %site_id,
            deployment_id = %ticket.id,
            required = ticket.required.len(),
            "deployment created"
        );

        let (mut state, actions) = DeployState::new().on_event(DeployEvent::Created {
            deployment_id: ticket.id.clone(),
            policy: self.config.poll,
        });
        let mut queue: VecDeque<DeployAction> = actions.into();
        let mut uploaded = Vec::new();
        let mut skipped = Vec::new();
        let mut failure: Option<DeployError> = None;

        while let Some(action) = queue.pop_front() {
            let event = match action {
                DeployAction::UploadRequired => {
                    match self.upload(&ticket, &files).await {
                        Ok((up, skip)) => {
                            uploaded = up;
                            skipped = skip;
                            DeployEvent::UploadsFinished
                        }
                        Err(e) => {
                            let reason = e.to_string();
                            failure = Some(e);
                            DeployEvent::Failed { reason }
                        }
                    }
                }
                DeployAction::Poll { delay } => {
                    tokio::time::sleep(delay).await;
                    match self
                        .timed("deployment_status", self.host.deployment_status(&ticket.id))
                        .await
                    {
                        Ok(Ok(status)) => {
                            debug!(deployment_id = %ticket.id, ?status, "polled deployment");
                            DeployEvent::StatusReported(status)
                        }
                        Ok(Err(e)) => DeployEvent::Failed {
                            reason: e.to_string(),
                        },
                        Err(e) => DeployEvent::Failed {
                            reason: match e {
                                DeployError::DeploymentFailed(reason) => reason,
                                other => other.to_string(),
                            },
                        },
                    }
                }
                DeployAction::Finish { url } => {
                    return Ok(DeployOutcome {
                        url,
                        site_id,
                        deployment_id: ticket.id,
                        uploaded,
                        skipped,
                        manifest,
                    });
                }
                DeployAction::Abort { reason } => {
                    return Err(failure.unwrap_or(DeployError::DeploymentFailed(reason)));
                }
            };
            let (next, actions) = state.on_event(event);
            state = next;
            queue.extend(actions);
        }

        Err(DeployError::DeploymentFailed(format!(
            "deployment stopped while {}",
            state.name()
        )))
    }

    async fn provision(&self, slug: &str) -> Result<String, DeployError> {
        let name =
            manifest::random_site_name(slug).map_err(|e| DeployError::Random(e.to_string()))?;
        let site = self
            .timed("create_site", self.host.create_site(&name))
            .await?
            .map_err(|e| DeployError::ProvisioningFailed(e.to_string()))?;
        info!(site_id = %site.id, name = %site.name, "provisioned hosting site");
        Ok(site.id)
    }

    /// Upload the files whose hash is required, one upload per distinct hash.
    async fn upload(
        &self,
        ticket: &DeploymentTicket,
        files: &[DeployFile],
    ) -> Result<(Vec<String>, Vec<String>), DeployError> {
        let required: HashSet<&str> = ticket.required.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        let mut skipped = Vec::new();
        for file in files {
            if required.contains(file.hash.as_str()) && seen.insert(file.hash.as_str()) {
                pending.push(file);
            } else {
                debug!(path = %file.path, hash = %file.hash, "provider already holds file");
                skipped.push(file.path.clone());
            }
        }

        let deployment_id = ticket.id.as_str();
        let results: Vec<_> = stream::iter(pending.into_iter().map(|file| async move {
            let result = self
                .timed(&file.path, self.host.upload_file(deployment_id, file))
                .await;
            (file, result)
        }))
        .buffer_unordered(self.config.upload_concurrency.max(1))
        .collect()
        .await;

        let mut uploaded = Vec::with_capacity(results.len());
        for (file, result) in results {
            match result? {
                Ok(()) => {
                    debug!(path = %file.path, bytes = file.bytes.len(), "uploaded");
                    uploaded.push(file.path.clone());
                }
                Err(e) => {
                    return Err(DeployError::UploadFailed {
                        path: file.path.clone(),
                        reason: e.to_string(),
                    })
                }
            }
        }
        uploaded.sort();
        skipped.sort();
        Ok((uploaded, skipped))
    }

    async fn timed<T, F>(&self, what: &str, call: F) -> Result<Result<T, HostError>, DeployError>
    where
        F: Future<Output = Result<T, HostError>>,
    {
        tokio::time::timeout(self.config.request_timeout, call)
            .await
            .map_err(|_| {
                DeployError::DeploymentFailed(format!(
                    "timed out after {:?} waiting for {}",
                    self.config.request_timeout, what
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_types::PageId;
    use std::time::Duration;

    fn artifact(css: &str) -> CompiledArtifact {
        CompiledArtifact::new("<html></html>".into(), css.into(), "void 0;".into())
    }

    fn page() -> PageDocument {
        PageDocument::new(PageId::new(), "spring-sale")
    }

    fn fast_config() -> DeployConfig {
        DeployConfig::default()
            .with_poll_interval(Duration::from_millis(1))
            .with_max_polls(5)
    }

    // ===========================================
    // Happy Path
    // ===========================================

    #[tokio::test]
    async fn first_deploy_provisions_and_uploads_everything() {
        let host = MemoryHost::new();
        let client = DeployClient::new(host.clone(), fast_config());

        let outcome = client.deploy(&artifact("a{}"), &page()).await.unwrap();

        assert_eq!(host.site_count(), 1);
        let site = host.site(&outcome.site_id).unwrap();
        assert!(site.name.starts_with("spring-sale-"));
        assert_eq!(outcome.url, site.url);
        assert_eq!(
            outcome.uploaded,
            vec!["_headers", "app.js", "index.html", "styles.css"]
        );
        assert!(outcome.skipped.is_empty());
        assert_eq!(host.live_files(&outcome.site_id), *outcome.manifest.as_map());
    }

    #[tokio::test]
    async fn second_deploy_uploads_nothing() {
        let host = MemoryHost::new();
        let client = DeployClient::new(host.clone(), fast_config());
        let mut page = page();

        let first = client.deploy(&artifact("a{}"), &page).await.unwrap();
        page.hosting_site_id = Some(first.site_id.clone());
        let before = host.upload_count();

        let second = client.deploy(&artifact("a{}"), &page).await.unwrap();
        assert_eq!(host.upload_count(), before);
        assert!(second.uploaded.is_empty());
        assert_eq!(second.skipped.len(), 4);
        assert_eq!(second.site_id, first.site_id);
        assert_eq!(host.site_count(), 1);
    }

    #[tokio::test]
    async fn ensure_site_provisions_once() {
        let host = MemoryHost::new();
        let client = DeployClient::new(host.clone(), fast_config());
        let mut page = page();

        let site_id = client.ensure_site(&page).await.unwrap();
        assert_eq!(host.site_count(), 1);

        page.hosting_site_id = Some(site_id.clone());
        assert_eq!(client.ensure_site(&page).await.unwrap(), site_id);
        let outcome = client.deploy(&artifact("a{}"), &page).await.unwrap();
        assert_eq!(outcome.site_id, site_id);
        assert_eq!(host.site_count(), 1);
    }

    #[tokio::test]
    async fn changed_stylesheet_uploads_only_stylesheet() {
        let host = MemoryHost::new();
        let client = DeployClient::new(host.clone(), fast_config());
        let mut page = page();

        let first = client.deploy(&artifact("a{}"), &page).await.unwrap();
        page.hosting_site_id = Some(first.site_id.clone());

        let second = client.deploy(&artifact("b{}"), &page).await.unwrap();
        assert_eq!(second.uploaded, vec!["styles.css"]);
        assert_eq!(
            host.live_file(&first.site_id, "styles.css"),
            Some(b"b{}".to_vec())
        );
    }

    #[tokio::test]
    async fn duplicate_content_uploaded_once() {
        let host = MemoryHost::new();
        let client = DeployClient::new(host.clone(), fast_config());
        let same = CompiledArtifact::new("x".into(), "x".into(), "x".into());

        let outcome = client.deploy(&same, &page()).await.unwrap();
        assert_eq!(outcome.uploaded.len(), 2); // "x" once, plus _headers
        assert_eq!(host.upload_count(), 2);
    }

    // ===========================================
    // Concurrency / Polling
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn uploads_are_bounded() {
        let host = MemoryHost::new();
        host.set_latency(Duration::from_millis(10));
        let client = DeployClient::new(host.clone(), fast_config().with_upload_concurrency(2));

        client.deploy(&artifact("a{}"), &page()).await.unwrap();
        assert_eq!(host.max_concurrent_uploads(), 2);
    }

    #[tokio::test]
    async fn waits_through_processing_polls() {
        let host = MemoryHost::new();
        host.set_processing_polls(3);
        let client = DeployClient::new(host.clone(), fast_config());
        assert!(client.deploy(&artifact("a{}"), &page()).await.is_ok());
    }

    #[tokio::test]
    async fn exhausted_polls_fail() {
        let host = MemoryHost::new();
        host.set_processing_polls(10);
        let client = DeployClient::new(host.clone(), fast_config().with_max_polls(2));
        let result = client.deploy(&artifact("a{}"), &page()).await;
        assert!(matches!(result, Err(DeployError::DeploymentFailed(r)) if r.contains("2 polls")));
    }

    // ===========================================
    // Failure Mapping
    // ===========================================

    #[tokio::test]
    async fn provisioning_failure() {
        let host = MemoryHost::new();
        host.fail_next_create_site("quota");
        let client = DeployClient::new(host.clone(), fast_config());
        let result = client.deploy(&artifact("a{}"), &page()).await;
        assert!(matches!(result, Err(DeployError::ProvisioningFailed(r)) if r.contains("quota")));
    }

    #[tokio::test]
    async fn manifest_failure() {
        let host = MemoryHost::new();
        host.fail_next_deployment("locked");
        let client = DeployClient::new(host.clone(), fast_config());
        let result = client.deploy(&artifact("a{}"), &page()).await;
        assert!(matches!(result, Err(DeployError::ManifestFailed(_))));
    }

    #[tokio::test]
    async fn upload_failure_names_path() {
        let host = MemoryHost::new();
        host.fail_next_upload("app.js", "disk full");
        let client = DeployClient::new(host.clone(), fast_config());
        let result = client.deploy(&artifact("a{}"), &page()).await;
        assert_eq!(
            result.unwrap_err(),
            DeployError::UploadFailed {
                path: "app.js".into(),
                reason: "rejected: disk full".into()
            }
        );
    }

    #[tokio::test]
    async fn provider_error_fails_deploy() {
        let host = MemoryHost::new();
        host.fail_status("build exploded");
        let client = DeployClient::new(host.clone(), fast_config());
        let result = client.deploy(&artifact("a{}"), &page()).await;
        assert!(
            matches!(result, Err(DeployError::DeploymentFailed(r)) if r.contains("build exploded"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let host = MemoryHost::new();
        host.set_latency(Duration::from_secs(120));
        let client = DeployClient::new(
            host.clone(),
            fast_config().with_request_timeout(Duration::from_secs(5)),
        );
        let result = client.deploy(&artifact("a{}"), &page()).await;
        assert!(matches!(result, Err(DeployError::DeploymentFailed(r)) if r.contains("timed out")));
        assert_eq!(host.site_count(), 0);
    }

    #[tokio::test]
    async fn unknown_site_id_is_manifest_failure() {
        let host = MemoryHost::new();
        let client = DeployClient::new(host, fast_config());
        let mut page = page();
        page.hosting_site_id = Some("site-gone".into());
        let result = client.deploy(&artifact("a{}"), &page).await;
        assert!(matches!(result, Err(DeployError::ManifestFailed(r)) if r.contains("site-gone")));
    }
}
