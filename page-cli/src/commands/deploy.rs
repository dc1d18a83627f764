//! Publish a page: save, compile, deploy.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use pagecraft_core::StyleVocabulary;
use pagecraft_deploy::{DeployClient, HostingProvider, HttpHost, MemoryHost};
use pagecraft_sync::{publish, MemoryStore, PageStore, SyncSession, TokioScheduler};

use super::load_page;
use crate::config::Config;
use crate::file_store::JsonFileStore;

/// Run the deploy command.
///
/// With `write_back` the page file itself is the store, so the saved
/// document and the publish result land in it. Otherwise the page is
/// published from an in-memory copy and the file is left untouched.
pub async fn run(config: &Config, page_path: &Path, use_mock: bool, write_back: bool) -> Result<()> {
    let (document, _) = load_page(page_path).await?;
    let page_id = document.id;

    let store: Arc<dyn PageStore> = if write_back {
        Arc::new(JsonFileStore::new(page_path, page_id))
    } else {
        let store = MemoryStore::new();
        let raw = tokio::fs::read_to_string(page_path)
            .await
            .context("Failed to read page file")?;
        store.insert_raw(page_id, serde_json::from_str(&raw)?);
        Arc::new(store)
    };

    let session = SyncSession::initialize(
        page_id,
        store,
        Arc::new(TokioScheduler::new()),
        config.session_config(),
    )
    .await
    .context("Failed to open page")?;

    let result = if use_mock {
        println!("Deploying {} to mock host...", document.slug);
        let client = DeployClient::new(MemoryHost::new(), config.deploy_config());
        run_publish(&session, &client).await
    } else {
        let token = std::env::var(&config.deploy.token_env).with_context(|| {
            format!("Hosting token not set. Export {}.", config.deploy.token_env)
        })?;
        let api_base = config
            .deploy
            .api_base
            .as_deref()
            .context("No hosting API configured. Set api_base in the [deploy] section.")?;
        println!("Deploying {} to {}...", document.slug, api_base);
        let client = DeployClient::new(HttpHost::new(api_base, &token), config.deploy_config());
        run_publish(&session, &client).await
    };
    session.close().await;
    result
}

async fn run_publish<H: HostingProvider>(
    session: &SyncSession,
    client: &DeployClient<H>,
) -> Result<()> {
    let outcome = publish(session, client, &StyleVocabulary::builtin())
        .await
        .context("Publish failed")?;

    println!("Live at {}", outcome.url);
    println!("  Site:       {}", outcome.site_id);
    println!("  Deployment: {}", outcome.deployment_id);
    println!(
        "  Files:      {} uploaded, {} unchanged",
        outcome.uploaded.len(),
        outcome.skipped.len()
    );
    Ok(())
}
