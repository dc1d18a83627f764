//! Print the deployment manifest of a page.

use std::path::Path;

use anyhow::Result;
use pagecraft_core::{compile, normalize_order, StyleVocabulary};
use pagecraft_deploy::{artifact_files, DeploymentManifest};

use super::load_page;

/// Run the manifest command.
pub async fn run(page_path: &Path) -> Result<()> {
    let (mut document, _) = load_page(page_path).await?;
    normalize_order(&mut document.components);

    let artifact = compile(&document, &StyleVocabulary::builtin());
    let manifest = DeploymentManifest::from_files(&artifact_files(&artifact));
    for (path, hash) in manifest.iter() {
        println!("{}  {}", path, hash);
    }
    Ok(())
}
