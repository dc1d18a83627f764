//! HTTP hosting provider.
//!
//! Talks to a file-digest deploy API that addresses files by SHA-256, the
//! digest [`DeploymentManifest`] carries. Providers keyed on another digest
//! (Netlify's deploy API expects SHA-1) need their own [`HostingProvider`].
//!
//! | Call | Request |
//! |------|---------|
//! | create site | `POST {base}/sites` `{"name"}` |
//! | create deployment | `POST {base}/sites/{id}/deploys` `{"files": {path: sha256}}` |
//! | upload | `PUT {base}/deploys/{id}/files/{path}` (raw bytes) |
//! | status | `GET {base}/deploys/{id}` |
//!
//! Every request carries `Authorization: Bearer <token>`.

use async_trait::async_trait;
use pagecraft_core::RemoteStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::HostError;
use crate::host::{DeploymentTicket, HostingProvider, SiteInfo};
use crate::manifest::{DeployFile, DeploymentManifest};

/// Hosting provider reached over HTTP.
#[derive(Clone)]
pub struct HttpHost {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for HttpHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpHost")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize)]
struct CreateSiteRequest<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
struct SiteResponse {
    id: String,
    name: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    ssl_url: Option<String>,
}

#[derive(Serialize)]
struct CreateDeployRequest<'a> {
    files: &'a BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct DeployResponse {
    id: String,
    #[serde(default)]
    required: Vec<String>,
}

#[derive(Deserialize)]
struct StatusResponse {
    state: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    ssl_url: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

impl StatusResponse {
    fn into_status(self) -> Result<RemoteStatus, HostError> {
        match self.state.as_str() {
            "ready" => self
                .ssl_url
                .or(self.url)
                .map(|url| RemoteStatus::Ready { url })
                .ok_or_else(|| HostError::InvalidResponse("ready deployment without url".into())),
            "error" => Ok(RemoteStatus::Error {
                message: self
                    .error_message
                    .unwrap_or_else(|| "unknown error".to_string()),
            }),
            _ => Ok(RemoteStatus::Processing),
        }
    }
}

impl HttpHost {
    /// Create a provider for `base_url` authenticated with `token`.
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, HostError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(HostError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl HostingProvider for HttpHost {
    async fn create_site(&self, name: &str) -> Result<SiteInfo, HostError> {
        let response = self
            .http
            .post(self.url("sites"))
            .bearer_auth(&self.token)
            .json(&CreateSiteRequest { name })
            .send()
            .await?;
        let site: SiteResponse = Self::check(response).await?.json().await?;
        let url = site
            .ssl_url
            .or(site.url)
            .ok_or_else(|| HostError::InvalidResponse("site without url".into()))?;
        Ok(SiteInfo {
            id: site.id,
            name: site.name,
            url,
        })
    }

    async fn create_deployment(
        &self,
        site_id: &str,
        manifest: &DeploymentManifest,
    ) -> Result<DeploymentTicket, HostError> {
        let response = self
            .http
            .post(self.url(&format!("sites/{}/deploys", site_id)))
            .bearer_auth(&self.token)
            .json(&CreateDeployRequest {
                files: manifest.as_map(),
            })
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(HostError::UnknownSite(site_id.to_string()));
        }
        let deploy: DeployResponse = Self::check(response).await?.json().await?;
        Ok(DeploymentTicket {
            id: deploy.id,
            required: deploy.required,
        })
    }

    async fn upload_file(&self, deployment_id: &str, file: &DeployFile) -> Result<(), HostError> {
        let response = self
            .http
            .put(self.url(&format!("deploys/{}/files/{}", deployment_id, file.path)))
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(file.bytes.clone())
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn deployment_status(&self, deployment_id: &str) -> Result<RemoteStatus, HostError> {
        let response = self
            .http
            .get(self.url(&format!("deploys/{}", deployment_id)))
            .bearer_auth(&self.token)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(HostError::UnknownDeployment(deployment_id.to_string()));
        }
        let status: StatusResponse = Self::check(response).await?.json().await?;
        status.into_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(json: &str) -> Result<RemoteStatus, HostError> {
        serde_json::from_str::<StatusResponse>(json)
            .unwrap()
            .into_status()
    }

    #[test]
    fn url_joins_paths() {
        let host = HttpHost::new("https://api.example.com/v1/", "t");
        assert_eq!(host.base_url(), "https://api.example.com/v1");
        assert_eq!(
            host.url("/sites/abc/deploys"),
            "https://api.example.com/v1/sites/abc/deploys"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let host = HttpHost::new("https://api.example.com", "secret-token");
        assert!(!format!("{:?}", host).contains("secret-token"));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            status(r#"{"state":"ready","ssl_url":"https://a.example"}"#).unwrap(),
            RemoteStatus::Ready {
                url: "https://a.example".into()
            }
        );
        assert_eq!(
            status(r#"{"state":"uploading"}"#).unwrap(),
            RemoteStatus::Processing
        );
        assert_eq!(
            status(r#"{"state":"error","error_message":"bad"}"#).unwrap(),
            RemoteStatus::Error {
                message: "bad".into()
            }
        );
        assert!(matches!(
            status(r#"{"state":"ready"}"#),
            Err(HostError::InvalidResponse(_))
        ));
    }

    #[test]
    fn https_url_preferred() {
        assert_eq!(
            status(r#"{"state":"ready","url":"http://a.example","ssl_url":"https://a.example"}"#)
                .unwrap(),
            RemoteStatus::Ready {
                url: "https://a.example".into()
            }
        );
    }

    #[test]
    fn deploy_request_carries_sha256_digests() {
        let files = crate::manifest::artifact_files(&pagecraft_types::CompiledArtifact::new(
            "<html></html>".into(),
            "a{}".into(),
            "void 0;".into(),
        ));
        let manifest = DeploymentManifest::from_files(&files);
        let body = serde_json::to_value(CreateDeployRequest {
            files: manifest.as_map(),
        })
        .unwrap();
        let digests = body["files"].as_object().unwrap();
        assert_eq!(digests.len(), 4);
        assert_eq!(
            digests["styles.css"],
            serde_json::json!(crate::manifest::content_hash(b"a{}"))
        );
        assert!(digests.values().all(|d| d.as_str().unwrap().len() == 64));
    }

    #[test]
    fn deploy_response_defaults_required() {
        let deploy: DeployResponse = serde_json::from_str(r#"{"id":"d1"}"#).unwrap();
        assert_eq!(deploy.id, "d1");
        assert!(deploy.required.is_empty());
    }

    #[tokio::test]
    async fn unreachable_host_is_connection_failure() {
        // Port 9 (discard) on localhost is not served.
        let host = HttpHost::new("http://127.0.0.1:9", "t");
        let result = host.create_site("s").await;
        assert!(matches!(result, Err(HostError::ConnectionFailed(_))));
    }
}
