//! In-memory hosting provider for testing.
//!
//! Behaves like a content-addressed static host: each site keeps the blobs
//! it has received, and a new deployment only requires hashes the site does
//! not hold yet. Every upload is logged so tests can assert on traffic.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pagecraft_core::RemoteStatus;

use crate::error::HostError;
use crate::headers::headers_for;
use crate::host::{DeploymentTicket, HostingProvider, SiteInfo};
use crate::manifest::{content_hash, DeployFile, DeploymentManifest, HEADERS, INDEX_HTML};

/// One accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    /// Deployment the file belonged to.
    pub deployment_id: String,
    /// Artifact path.
    pub path: String,
    /// Content hash.
    pub hash: String,
}

/// A live file as a visitor receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedFile {
    /// File contents.
    pub body: Vec<u8>,
    /// Headers the site's live `_headers` file assigns to the path.
    pub headers: Vec<(String, String)>,
}

impl ServedFile {
    /// Value of header `name`, if set.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
struct MemorySite {
    info: Option<SiteInfo>,
    blobs: HashMap<String, Vec<u8>>,
    live: BTreeMap<String, String>,
}

#[derive(Debug)]
struct MemoryDeployment {
    site_id: String,
    manifest: DeploymentManifest,
    missing: BTreeSet<String>,
    polls: u32,
}

#[derive(Debug, Default)]
struct MemoryHostInner {
    sites: HashMap<String, MemorySite>,
    deployments: HashMap<String, MemoryDeployment>,
    uploads: Vec<UploadRecord>,
    next_id: u64,
    processing_polls: u32,
    latency: Option<Duration>,
    in_flight_uploads: usize,
    max_in_flight_uploads: usize,
    fail_next_create_site: Option<String>,
    fail_next_deployment: Option<String>,
    fail_upload: Option<(String, String)>,
    fail_status: Option<String>,
}

/// In-memory hosting provider.
#[derive(Debug, Default)]
pub struct MemoryHost {
    inner: Arc<Mutex<MemoryHostInner>>,
}

impl MemoryHost {
    /// Create an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `Processing` this many times per deployment before `Ready`.
    pub fn set_processing_polls(&self, polls: u32) {
        self.inner.lock().unwrap().processing_polls = polls;
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.inner.lock().unwrap().latency = Some(latency);
    }

    /// Cause the next `create_site` to fail.
    pub fn fail_next_create_site(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_create_site = Some(error.to_string());
    }

    /// Cause the next `create_deployment` to fail.
    pub fn fail_next_deployment(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_deployment = Some(error.to_string());
    }

    /// Cause the next upload of `path` to fail.
    pub fn fail_next_upload(&self, path: &str, error: &str) {
        self.inner.lock().unwrap().fail_upload = Some((path.to_string(), error.to_string()));
    }

    /// Report every deployment as errored with `message`.
    pub fn fail_status(&self, message: &str) {
        self.inner.lock().unwrap().fail_status = Some(message.to_string());
    }

    /// All accepted uploads, in arrival order.
    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.inner.lock().unwrap().uploads.clone()
    }

    /// Number of accepted uploads.
    pub fn upload_count(&self) -> usize {
        self.inner.lock().unwrap().uploads.len()
    }

    /// Highest number of uploads observed running at once.
    pub fn max_concurrent_uploads(&self) -> usize {
        self.inner.lock().unwrap().max_in_flight_uploads
    }

    /// Number of provisioned sites.
    pub fn site_count(&self) -> usize {
        self.inner.lock().unwrap().sites.len()
    }

    /// Site details.
    pub fn site(&self, site_id: &str) -> Option<SiteInfo> {
        let inner = self.inner.lock().unwrap();
        inner.sites.get(site_id).and_then(|s| s.info.clone())
    }

    /// Files currently live on a site, `path → hash`.
    pub fn live_files(&self, site_id: &str) -> BTreeMap<String, String> {
        let inner = self.inner.lock().unwrap();
        inner
            .sites
            .get(site_id)
            .map(|s| s.live.clone())
            .unwrap_or_default()
    }

    /// Live contents of `path` on a site.
    pub fn live_file(&self, site_id: &str, path: &str) -> Option<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        let site = inner.sites.get(site_id)?;
        let hash = site.live.get(path)?;
        site.blobs.get(hash).cloned()
    }

    /// Serve `path` from a site's live deployment. `/` maps to
    /// `index.html`; the `_headers` file itself is never served.
    pub fn serve(&self, site_id: &str, path: &str) -> Option<ServedFile> {
        let path = match path.trim_start_matches('/') {
            "" => INDEX_HTML,
            path => path,
        };
        if path == HEADERS {
            return None;
        }
        let inner = self.inner.lock().unwrap();
        let site = inner.sites.get(site_id)?;
        let body = site.blobs.get(site.live.get(path)?)?.clone();
        let rules = site
            .live
            .get(HEADERS)
            .and_then(|hash| site.blobs.get(hash))
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();
        let headers = headers_for(&rules, path)
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Some(ServedFile { body, headers })
    }

    async fn delay(&self) {
        let latency = self.inner.lock().unwrap().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Clone for MemoryHost {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl HostingProvider for MemoryHost {
    async fn create_site(&self, name: &str) -> Result<SiteInfo, HostError> {
        self.delay().await;
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_create_site.take() {
            return Err(HostError::Rejected(error));
        }
        inner.next_id += 1;
        let info = SiteInfo {
            id: format!("site-{}", inner.next_id),
            name: name.to_string(),
            url: format!("https://{}.pagecraft.test", name),
        };
        inner.sites.insert(
            info.id.clone(),
            MemorySite {
                info: Some(info.clone()),
                ..MemorySite::default()
            },
        );
        Ok(info)
    }

    async fn create_deployment(
        &self,
        site_id: &str,
        manifest: &DeploymentManifest,
    ) -> Result<DeploymentTicket, HostError> {
        self.delay().await;
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_deployment.take() {
            return Err(HostError::Rejected(error));
        }
        let site = inner
            .sites
            .get(site_id)
            .ok_or_else(|| HostError::UnknownSite(site_id.to_string()))?;
        let missing: BTreeSet<String> = manifest
            .iter()
            .map(|(_, hash)| hash)
            .filter(|hash| !site.blobs.contains_key(*hash))
            .map(str::to_string)
            .collect();

        inner.next_id += 1;
        let id = format!("deploy-{}", inner.next_id);
        inner.deployments.insert(
            id.clone(),
            MemoryDeployment {
                site_id: site_id.to_string(),
                manifest: manifest.clone(),
                missing: missing.clone(),
                polls: 0,
            },
        );
        Ok(DeploymentTicket {
            id,
            required: missing.into_iter().collect(),
        })
    }

    async fn upload_file(&self, deployment_id: &str, file: &DeployFile) -> Result<(), HostError> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.in_flight_uploads += 1;
            inner.max_in_flight_uploads = inner.max_in_flight_uploads.max(inner.in_flight_uploads);
        }
        self.delay().await;

        let mut inner = self.inner.lock().unwrap();
        inner.in_flight_uploads -= 1;

        if let Some((path, error)) = inner.fail_upload.take() {
            if path == file.path {
                return Err(HostError::Rejected(error));
            }
            inner.fail_upload = Some((path, error));
        }
        if content_hash(&file.bytes) != file.hash {
            return Err(HostError::Rejected(format!("digest mismatch for {}", file.path)));
        }

        let deployment = inner
            .deployments
            .get_mut(deployment_id)
            .ok_or_else(|| HostError::UnknownDeployment(deployment_id.to_string()))?;
        if deployment.manifest.hash_of(&file.path) != Some(file.hash.as_str()) {
            return Err(HostError::Rejected(format!("{} is not in the manifest", file.path)));
        }
        if !deployment.missing.remove(&file.hash) {
            return Err(HostError::Rejected(format!("{} was not required", file.hash)));
        }
        let site_id = deployment.site_id.clone();

        inner
            .sites
            .entry(site_id)
            .or_default()
            .blobs
            .insert(file.hash.clone(), file.bytes.clone());
        inner.uploads.push(UploadRecord {
            deployment_id: deployment_id.to_string(),
            path: file.path.clone(),
            hash: file.hash.clone(),
        });
        Ok(())
    }

    async fn deployment_status(&self, deployment_id: &str) -> Result<RemoteStatus, HostError> {
        self.delay().await;
        let mut inner = self.inner.lock().unwrap();
        if let Some(message) = inner.fail_status.clone() {
            return Ok(RemoteStatus::Error { message });
        }
        let processing_polls = inner.processing_polls;
        let deployment = inner
            .deployments
            .get_mut(deployment_id)
            .ok_or_else(|| HostError::UnknownDeployment(deployment_id.to_string()))?;
        if !deployment.missing.is_empty() || deployment.polls < processing_polls {
            deployment.polls += 1;
            return Ok(RemoteStatus::Processing);
        }
        let site_id = deployment.site_id.clone();
        let live = deployment.manifest.as_map().clone();

        let site = inner
            .sites
            .get_mut(&site_id)
            .ok_or_else(|| HostError::UnknownSite(site_id.clone()))?;
        site.live = live;
        let url = site
            .info
            .as_ref()
            .map(|info| info.url.clone())
            .unwrap_or_default();
        Ok(RemoteStatus::Ready { url })
    }
}
