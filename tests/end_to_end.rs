//! End-to-end tests for patron
//!
//! A donation event goes through the lock, a crawl of a mock code host,
//! dependency weighting and the distributor into a real `SQLite` ledger.

mod common;

use common::*;
use patron_errors::{Error, LockError};
use patron_events::{AppEvent, CrawlEvent, LockEvent};
use patron_state::{DistributedLock, OrgStore};
use patron_types::{now_millis, PackageRecord};

const CLI_PACKAGE_JSON: &str = r#"{"dependencies":{"standard":"^14.0.0","react":"^16.13.0"}}"#;
const SPLASH_PACKAGE_JSON: &str = r#"{"dependencies":{"react":"^16.13.0"}}"#;

/// Two active repositories and one archived one.
///
/// npm: standard once, react twice. pypi: django once.
async fn serve_org(host: &CodeHost) {
    host.repos(&[("cli", false), ("splash", false), ("old", true)])
        .await;
    host.search("cli", "package.json", &["package.json"]).await;
    host.search("cli", "requirements.txt", &["requirements.txt"])
        .await;
    host.search("splash", "package.json", &["package.json", "package-lock.json"])
        .await;
    host.search_raw("splash", "requirements.txt", serde_json::json!({}))
        .await;
    host.file("cli", "package.json", CLI_PACKAGE_JSON).await;
    host.file("cli", "requirements.txt", "django\n").await;
    host.file("splash", "package.json", SPLASH_PACKAGE_JSON).await;
}

#[tokio::test]
async fn test_whole_org_donation_reaches_ledger() {
    let host = CodeHost::start().await;
    serve_org(&host).await;
    let archived = host.search("old", "package.json", &["package.json"]).await;
    let mut env = TestEnvironment::new(&host).await;

    let outcome = env.processor.process(&donation_body(1000)).await.unwrap();

    // 1000 cents less 4% and 30 cents
    assert_eq!(outcome.donation, 930_000);
    // npm has two weighted packages, pypi one
    assert_eq!(outcome.report.distributed(), 930_000);
    assert!(outcome.snapshot_recorded);
    archived.assert_hits_async(0).await;

    let ledger = env.ledger().await;
    assert_eq!(ledger.len(), 3);
    assert_close(ledger["react"], 620_000.0 * 2.0 / 3.0);
    assert_close(ledger["standard"], 620_000.0 / 3.0);
    assert_close(ledger["django"], 310_000.0);

    let snapshots = env.store.snapshots_for_org(ORG_ID).await.unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].top_level_deps, 4);
    assert_eq!(snapshots[0].total_deps, 3);

    let events = env.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        AppEvent::Crawl(CrawlEvent::Completed { manifests: 3, .. })
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, AppEvent::Lock(LockEvent::Released { .. }))));
    assert!(env.lock.current(ORG_ID).await.unwrap().is_none());
}

#[tokio::test]
async fn test_no_comp_list_excludes_package() {
    let host = CodeHost::start().await;
    serve_org(&host).await;
    let env = TestEnvironment::new(&host).await;
    env.store
        .set_no_comp_list("javascript", "npm", ["standard"])
        .await
        .unwrap();

    env.processor.process(&donation_body(1000)).await.unwrap();

    let ledger = env.ledger().await;
    assert!(!ledger.contains_key("standard"));
    assert_close(ledger["react"], 465_000.0);
    assert_close(ledger["django"], 465_000.0);
}

#[tokio::test]
async fn test_target_package_donation_skips_code_host() {
    let host = CodeHost::start().await;
    let listing = host.repos(&[("cli", false)]).await;
    let env = TestEnvironment::new(&host).await;
    env.store
        .put_package(&PackageRecord {
            id: "pkg-react".into(),
            name: Some("react".into()),
            language: Some("javascript".into()),
            registry: Some("npm".into()),
        })
        .await
        .unwrap();
    let body = serde_json::json!({
        "amount": 500,
        "organizationId": ORG_ID,
        "targetPackageId": "pkg-react",
    })
    .to_string();

    let outcome = env.processor.process(&body).await.unwrap();

    listing.assert_hits_async(0).await;
    // 500 * 0.96 = 480 cents, less 30
    assert_eq!(outcome.donation, 450_000);
    assert!(!outcome.snapshot_recorded);

    let entries = env.store.ledger_for_org(ORG_ID).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].package_id, "pkg-react");
    assert_close(entries[0].amount, 450_000.0);
    assert!(env.store.snapshots_for_org(ORG_ID).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_locked_org_is_not_crawled() {
    let host = CodeHost::start().await;
    let listing = host.repos(&[("cli", false)]).await;
    let env = TestEnvironment::new(&host).await;
    let held = env.lock.acquire_at(ORG_ID, now_millis()).await.unwrap();

    let err = env.processor.process(&donation_body(1000)).await.unwrap_err();

    assert!(matches!(err, Error::Lock(LockError::Conflict { .. })));
    listing.assert_hits_async(0).await;
    assert!(env.ledger().await.is_empty());
    // the other worker's lock is untouched
    assert_eq!(env.lock.current(ORG_ID).await.unwrap(), Some(held));
}

#[tokio::test]
async fn test_failed_download_writes_nothing_and_unlocks() {
    let host = CodeHost::start().await;
    host.repos(&[("cli", false)]).await;
    host.search("cli", "package.json", &["package.json"]).await;
    host.search("cli", "requirements.txt", &[]).await;
    host.server
        .mock_async(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/repos/flossbank/cli/contents/package.json");
            then.status(500);
        })
        .await;
    let env = TestEnvironment::new(&host).await;

    let err = env.processor.process(&donation_body(1000)).await.unwrap_err();

    assert!(matches!(err, Error::Crawl(_)));
    assert!(env.ledger().await.is_empty());
    assert!(env.store.snapshots_for_org(ORG_ID).await.unwrap().is_empty());
    assert!(env.lock.current(ORG_ID).await.unwrap().is_none());
    assert!(env.lock.acquire(ORG_ID).await.is_ok());
}

#[tokio::test]
async fn test_unknown_org_fails_without_crawl() {
    let host = CodeHost::start().await;
    let listing = host.repos(&[("cli", false)]).await;
    let env = TestEnvironment::new(&host).await;
    let body = serde_json::json!({"amount": 1000, "organizationId": "nobody"}).to_string();

    let err = env.processor.process(&body).await.unwrap_err();

    assert!(err.to_string().contains("nobody"));
    listing.assert_hits_async(0).await;
    assert!(env.store.get_org("nobody").await.unwrap().is_none());
    assert!(env.lock.current("nobody").await.unwrap().is_none());
}
