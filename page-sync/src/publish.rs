//! Publish pipeline: save, compile, deploy, record.

use pagecraft_core::{compile_with_diagnostics, StyleVocabulary};
use pagecraft_deploy::{DeployClient, DeployOutcome, HostingProvider};
use pagecraft_types::PageDocument;
use tracing::{info, warn};

use crate::error::PublishError;
use crate::session::SyncSession;

/// Publish the session's page.
///
/// 1. Force-save pending edits.
/// 2. Mark the page `publishing` and persist that.
/// 3. On first publish, provision the hosting site and persist its id.
/// 4. Compile the saved document and deploy the artifact.
/// 5. On success record the live URL and mark the page `published`; on
///    failure return it to `draft` with the error recorded.
///
/// A site provisioned in step 3 stays on the page when a later step fails,
/// so retrying reuses it and uploads only what the site does not hold.
///
/// # Errors
///
/// - `Session` if the save or a status write fails
/// - `AlreadyPublishing` if another publish of this page is running
/// - `Deploy` if the deployment fails (the page is back in draft)
pub async fn publish<H: HostingProvider>(
    session: &SyncSession,
    client: &DeployClient<H>,
    vocabulary: &StyleVocabulary,
) -> Result<DeployOutcome, PublishError> {
    let page_id = session.page_id();
    session.force_save().await?;
    let mut document = session.begin_publish().await?;
    info!(page_id = %page_id, slug = %document.slug, "publishing");

    match ship(session, client, vocabulary, &mut document).await {
        Ok(outcome) => {
            session
                .finish_publish(Ok((&outcome.site_id, &outcome.url)))
                .await?;
            info!(page_id = %page_id, url = %outcome.url, "published");
            Ok(outcome)
        }
        Err(e) => {
            if let Err(record_err) = session.finish_publish(Err(e.to_string())).await {
                warn!(page_id = %page_id, error = %record_err, "failed to record publish failure");
            }
            Err(e)
        }
    }
}

async fn ship<H: HostingProvider>(
    session: &SyncSession,
    client: &DeployClient<H>,
    vocabulary: &StyleVocabulary,
    document: &mut PageDocument,
) -> Result<DeployOutcome, PublishError> {
    if document.hosting_site_id.is_none() {
        let site_id = client.ensure_site(document).await?;
        session.record_site(&site_id).await?;
        document.hosting_site_id = Some(site_id);
    }

    let compilation = compile_with_diagnostics(document, vocabulary);
    for degraded in &compilation.diagnostics {
        warn!(page_id = %document.id, %degraded, "component degraded");
    }

    Ok(client.deploy(&compilation.artifact, document).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;
    use crate::session::SessionConfig;
    use crate::store::{MemoryStore, WriteRecord};
    use crate::error::{SessionError, StoreError};
    use pagecraft_deploy::{DeployConfig, DeployError, MemoryHost};
    use pagecraft_types::{
        ComponentId, ComponentInstance, PageDocument, PageId, PageStatus, VariationRef,
    };
    use std::sync::Arc;
    use std::time::Duration;

    struct Fixture {
        store: MemoryStore,
        host: MemoryHost,
        session: SyncSession,
        client: DeployClient<MemoryHost>,
    }

    async fn fixture() -> Fixture {
        let mut document = PageDocument::new(PageId::new(), "launch");
        document.components = vec![ComponentInstance::new(
            ComponentId::new_durable(),
            VariationRef::new("hero", 1),
            1,
        )
        .with_content("headline", "Ship it")];
        let store = MemoryStore::new();
        store.insert(&document).unwrap();
        let session = SyncSession::initialize(
            document.id,
            Arc::new(store.clone()),
            Arc::new(ManualScheduler::new()),
            SessionConfig::default(),
        )
        .await
        .unwrap();
        let host = MemoryHost::new();
        let client = DeployClient::new(
            host.clone(),
            DeployConfig::default().with_poll_interval(Duration::from_millis(1)),
        );
        Fixture {
            store,
            host,
            session,
            client,
        }
    }

    // ===========================================
    // Success
    // ===========================================

    #[tokio::test]
    async fn publish_records_site_and_url() {
        let f = fixture().await;
        let outcome = publish(&f.session, &f.client, &StyleVocabulary::builtin())
            .await
            .unwrap();

        let document = f.session.document().await;
        assert_eq!(document.status, PageStatus::Published);
        assert_eq!(document.hosting_site_id.as_deref(), Some(outcome.site_id.as_str()));
        assert_eq!(document.published_url.as_deref(), Some(outcome.url.as_str()));

        let stored = f.store.page(&f.session.page_id()).unwrap();
        assert_eq!(stored.publish_record(), document.publish_record());

        let html = f.host.live_file(&outcome.site_id, "index.html").unwrap();
        assert!(String::from_utf8(html).unwrap().contains("Ship it"));
    }

    #[tokio::test]
    async fn publish_saves_before_deploying() {
        let f = fixture().await;
        let page_id = f.session.page_id();
        publish(&f.session, &f.client, &StyleVocabulary::builtin())
            .await
            .unwrap();

        let writes = f.store.writes();
        assert_eq!(writes.first(), Some(&WriteRecord::Page(page_id)));
        // publishing, provisioned site, published
        assert_eq!(
            writes
                .iter()
                .filter(|w| matches!(w, WriteRecord::PublishState(_)))
                .count(),
            3
        );
    }

    #[tokio::test]
    async fn republish_reuses_site_and_locks_slug() {
        let f = fixture().await;
        let vocabulary = StyleVocabulary::builtin();
        let first = publish(&f.session, &f.client, &vocabulary).await.unwrap();
        let second = publish(&f.session, &f.client, &vocabulary).await.unwrap();

        assert_eq!(first.site_id, second.site_id);
        assert_eq!(f.host.site_count(), 1);
        assert!(second.uploaded.is_empty());
        assert!(matches!(
            f.session.update_slug("renamed").await,
            Err(SessionError::SlugLocked { .. })
        ));
    }

    // ===========================================
    // Failure
    // ===========================================

    #[tokio::test]
    async fn deploy_failure_returns_page_to_draft() {
        let f = fixture().await;
        f.host.fail_status("build exploded");
        let result = publish(&f.session, &f.client, &StyleVocabulary::builtin()).await;
        assert!(matches!(
            result,
            Err(PublishError::Deploy(DeployError::DeploymentFailed(_)))
        ));

        let document = f.session.document().await;
        assert_eq!(document.status, PageStatus::Draft);
        let error = document.last_publish_error.unwrap();
        assert!(error.contains("build exploded"));

        let stored = f.store.page(&f.session.page_id()).unwrap();
        assert_eq!(stored.status, PageStatus::Draft);
        assert!(stored.last_publish_error.is_some());
    }

    #[tokio::test]
    async fn failed_first_publish_keeps_site_for_retry() {
        let f = fixture().await;
        let vocabulary = StyleVocabulary::builtin();
        f.host.fail_next_upload("app.js", "disk full");

        let result = publish(&f.session, &f.client, &vocabulary).await;
        assert!(matches!(
            result,
            Err(PublishError::Deploy(DeployError::UploadFailed { .. }))
        ));
        let document = f.session.document().await;
        assert_eq!(document.status, PageStatus::Draft);
        let site_id = document.hosting_site_id.clone().unwrap();
        let stored = f.store.page(&f.session.page_id()).unwrap();
        assert_eq!(stored.hosting_site_id.as_deref(), Some(site_id.as_str()));

        let uploads_before = f.host.upload_count();
        let retry = publish(&f.session, &f.client, &vocabulary).await.unwrap();
        assert_eq!(retry.site_id, site_id);
        assert_eq!(f.host.site_count(), 1);
        assert_eq!(retry.uploaded, vec!["app.js"]);
        assert_eq!(f.host.upload_count(), uploads_before + 1);
        assert_eq!(f.session.document().await.status, PageStatus::Published);
    }

    #[tokio::test]
    async fn provisioning_failure_returns_page_to_draft() {
        let f = fixture().await;
        f.host.fail_next_create_site("quota");
        let result = publish(&f.session, &f.client, &StyleVocabulary::builtin()).await;
        assert!(matches!(
            result,
            Err(PublishError::Deploy(DeployError::ProvisioningFailed(_)))
        ));
        let document = f.session.document().await;
        assert_eq!(document.status, PageStatus::Draft);
        assert!(document.hosting_site_id.is_none());
    }

    #[tokio::test]
    async fn save_failure_aborts_before_deploy() {
        let f = fixture().await;
        f.store.fail_next_write("disk full");
        let result = publish(&f.session, &f.client, &StyleVocabulary::builtin()).await;
        assert!(matches!(
            result,
            Err(PublishError::Session(SessionError::StorageWriteFailed(
                StoreError::WriteFailed(_)
            )))
        ));
        assert_eq!(f.host.site_count(), 0);
        assert_eq!(f.session.document().await.status, PageStatus::Draft);
    }

    #[tokio::test]
    async fn concurrent_publish_is_refused() {
        let f = fixture().await;
        f.host.set_processing_polls(3);
        let vocabulary = StyleVocabulary::builtin();
        let (first, second) = tokio::join!(
            publish(&f.session, &f.client, &vocabulary),
            async {
                // Let the first publish reach the deploy step.
                while f.session.document().await.status != PageStatus::Publishing {
                    tokio::task::yield_now().await;
                }
                publish(&f.session, &f.client, &vocabulary).await
            }
        );
        assert!(first.is_ok());
        assert!(matches!(second, Err(PublishError::AlreadyPublishing)));
    }
}
