//! Compile a page into its static files.

use std::path::Path;

use anyhow::{Context, Result};
use pagecraft_core::{compile_with_diagnostics, normalize_order, StyleVocabulary};
use pagecraft_deploy::artifact_files;

use super::load_page;

/// Run the compile command.
pub async fn run(page_path: &Path, out_dir: &Path) -> Result<()> {
    let (mut document, _) = load_page(page_path).await?;
    normalize_order(&mut document.components);

    let compilation = compile_with_diagnostics(&document, &StyleVocabulary::builtin());
    for degraded in &compilation.diagnostics {
        println!("warning: {}", degraded);
    }

    tokio::fs::create_dir_all(out_dir)
        .await
        .context("Failed to create output directory")?;
    for file in artifact_files(&compilation.artifact) {
        let path = out_dir.join(&file.path);
        tokio::fs::write(&path, &file.bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("wrote {} ({} bytes)", path.display(), file.bytes.len());
    }
    Ok(())
}
