//! Artifact files and their content addresses.
//!
//! A deployment is described by a manifest of `path → SHA-256 hex`. The
//! provider compares it against what it already stores and answers with the
//! hashes it still needs, so unchanged files are never uploaded twice.

use std::collections::BTreeMap;

use pagecraft_types::CompiledArtifact;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::headers::HEADERS_FILE;

/// Path of the page markup.
pub const INDEX_HTML: &str = "index.html";
/// Path of the stylesheet.
pub const STYLES_CSS: &str = "styles.css";
/// Path of the behavior script.
pub const APP_JS: &str = "app.js";
/// Path of the headers file.
pub const HEADERS: &str = "_headers";

/// SHA-256 of `bytes`, lowercase hex.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// One file of a deployment.
#[derive(Clone, PartialEq, Eq)]
pub struct DeployFile {
    /// Path relative to the site root.
    pub path: String,
    /// MIME type sent on upload.
    pub content_type: &'static str,
    /// File contents.
    pub bytes: Vec<u8>,
    /// SHA-256 hex of `bytes`.
    pub hash: String,
}

impl DeployFile {
    /// Build a file, computing its hash.
    pub fn new(path: &str, content_type: &'static str, bytes: Vec<u8>) -> Self {
        let hash = content_hash(&bytes);
        Self {
            path: path.to_string(),
            content_type,
            bytes,
            hash,
        }
    }
}

impl std::fmt::Debug for DeployFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployFile")
            .field("path", &self.path)
            .field("hash", &self.hash)
            .field("bytes", &format!("[{} bytes]", self.bytes.len()))
            .finish()
    }
}

/// The four files every deployment ships.
pub fn artifact_files(artifact: &CompiledArtifact) -> Vec<DeployFile> {
    vec![
        DeployFile::new(
            INDEX_HTML,
            "text/html; charset=utf-8",
            artifact.markup().as_bytes().to_vec(),
        ),
        DeployFile::new(
            STYLES_CSS,
            "text/css; charset=utf-8",
            artifact.stylesheet().as_bytes().to_vec(),
        ),
        DeployFile::new(
            APP_JS,
            "application/javascript; charset=utf-8",
            artifact.script().as_bytes().to_vec(),
        ),
        DeployFile::new(HEADERS, "text/plain; charset=utf-8", HEADERS_FILE.as_bytes().to_vec()),
    ]
}

/// `path → hash` for one deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentManifest {
    files: BTreeMap<String, String>,
}

impl DeploymentManifest {
    /// Manifest of `files`.
    pub fn from_files(files: &[DeployFile]) -> Self {
        Self {
            files: files
                .iter()
                .map(|f| (f.path.clone(), f.hash.clone()))
                .collect(),
        }
    }

    /// Hash recorded for `path`.
    pub fn hash_of(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, h)| (p.as_str(), h.as_str()))
    }

    /// Underlying map, as sent to the provider.
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the manifest is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Site name for `slug`: the slug reduced to `[a-z0-9-]`, then `-` and the
/// hex nonce.
pub fn site_name(slug: &str, nonce: &[u8]) -> String {
    let mut base = String::with_capacity(slug.len());
    for c in slug.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            base.push(c);
        } else if !base.ends_with('-') {
            base.push('-');
        }
    }
    let base = base.trim_matches('-');
    let base = if base.is_empty() { "page" } else { base };
    let base: String = base.chars().take(48).collect();
    format!("{}-{}", base.trim_end_matches('-'), hex::encode(nonce))
}

/// Site name with a fresh 4-byte random nonce.
pub fn random_site_name(slug: &str) -> Result<String, getrandom::Error> {
    let mut nonce = [0u8; 4];
    getrandom::getrandom(&mut nonce)?;
    Ok(site_name(slug, &nonce))
}
