//! CLI command implementations.

pub mod check;
pub mod compile;
pub mod deploy;
pub mod manifest;

use std::path::Path;

use anyhow::{Context, Result};
use pagecraft_types::{legacy, legacy::MigrationReport, PageDocument};

/// Read and migrate a page file.
pub async fn load_page(path: &Path) -> Result<(PageDocument, MigrationReport)> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read page file {}", path.display()))?;
    legacy::migrate_page_str(&text)
        .with_context(|| format!("Invalid page document in {}", path.display()))
}
