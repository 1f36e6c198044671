//! Shared infrastructure for end-to-end tests
//!
//! - A mock code host serving repository listings, code search and file
//!   contents
//! - A manifest-reading weight resolver
//! - A test environment wiring both into a processor over a real database

use async_trait::async_trait;
use base64::Engine;
use httpmock::prelude::*;
use httpmock::Mock;
use patron_crawler::{GithubManifestSource, StaticTokenProvider};
use patron_errors::Error;
use patron_events::{AppEvent, EventReceiver};
use patron_net::{NetClient, NetConfig};
use patron_ops::{DonationProcessor, ProcessorBuilder, WeightRequest, WeightResolver};
use patron_state::{OrgLock, SqliteStore};
use patron_types::{DependencyGroup, ManifestRecord, Organization, PackageWeightMap, SearchPattern};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const ORG_ID: &str = "org-e2e";
pub const ORG_NAME: &str = "flossbank";

/// Mock GitHub-style REST API
pub struct CodeHost {
    pub server: MockServer,
}

#[allow(dead_code)] // not every scenario uses every helper
impl CodeHost {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start_async().await,
        }
    }

    /// `GET /orgs/{org}/repos`; each entry is `(name, archived)`
    pub async fn repos(&self, repos: &[(&str, bool)]) -> Mock<'_> {
        let body: Vec<Value> = repos
            .iter()
            .map(|(name, archived)| {
                json!({
                    "name": name,
                    "full_name": format!("{ORG_NAME}/{name}"),
                    "owner": { "login": ORG_NAME },
                    "archived": archived,
                })
            })
            .collect();
        self.server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/orgs/{ORG_NAME}/repos"));
                then.status(200).json_body(Value::Array(body));
            })
            .await
    }

    /// Code search for `filename` in one repository, answering with `paths`
    pub async fn search(&self, repo: &str, filename: &str, paths: &[&str]) -> Mock<'_> {
        let items: Vec<Value> = paths
            .iter()
            .map(|path| {
                let name = path.rsplit('/').next().unwrap_or(path);
                json!({ "name": name, "path": path })
            })
            .collect();
        self.search_raw(repo, filename, json!({ "items": items }))
            .await
    }

    pub async fn search_raw(&self, repo: &str, filename: &str, body: Value) -> Mock<'_> {
        let query = format!("filename:{filename} repo:{ORG_NAME}/{repo}");
        self.server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/search/code")
                    .query_param("q", query.as_str());
                then.status(200).json_body(body);
            })
            .await
    }

    /// `GET /repos/{org}/{repo}/contents/{path}` with base64 content
    pub async fn file(&self, repo: &str, path: &str, text: &str) -> Mock<'_> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(text);
        self.server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(format!("/repos/{ORG_NAME}/{repo}/contents/{path}"));
                then.status(200).json_body(json!({ "content": encoded }));
            })
            .await
    }
}

/// Resolver that reads `package.json` dependencies and `requirements.txt`
/// lines, and weighs each package by how often it is required.
pub struct ManifestResolver;

impl ManifestResolver {
    fn parse(manifest: &ManifestRecord) -> Vec<String> {
        match manifest.registry.as_str() {
            "npm" => serde_json::from_str::<Value>(&manifest.manifest)
                .ok()
                .and_then(|v| v.get("dependencies").and_then(Value::as_object).cloned())
                .map(|deps| deps.keys().cloned().collect())
                .unwrap_or_default(),
            _ => manifest
                .manifest
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

#[async_trait]
impl WeightResolver for ManifestResolver {
    async fn supported_manifest_patterns(&self) -> Result<Vec<SearchPattern>, Error> {
        Ok(vec![
            SearchPattern::new("npm", "javascript", ["package.json"]),
            SearchPattern::new("pypi", "python", ["requirements.txt"]),
        ])
    }

    async fn extract_dependencies(
        &self,
        manifests: &[ManifestRecord],
    ) -> Result<Vec<DependencyGroup>, Error> {
        let mut groups: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();
        for manifest in manifests {
            groups
                .entry((manifest.registry.clone(), manifest.language.clone()))
                .or_default()
                .extend(Self::parse(manifest));
        }
        Ok(groups
            .into_iter()
            .map(|((registry, language), deps)| DependencyGroup {
                registry,
                language,
                deps,
            })
            .collect())
    }

    async fn compute_package_weight(
        &self,
        request: WeightRequest,
    ) -> Result<PackageWeightMap, Error> {
        let mut counts: BTreeMap<String, f64> = BTreeMap::new();
        for dep in &request.top_level_packages {
            if !request.no_comp_list.contains(dep) {
                *counts.entry(dep.clone()).or_default() += 1.0;
            }
        }
        let total: f64 = counts.values().sum();
        Ok(counts
            .into_iter()
            .map(|(name, count)| (name, count / total))
            .collect())
    }

    async fn build_latest_spec(
        &self,
        name: &str,
        _language: &str,
        _registry: &str,
    ) -> Result<String, Error> {
        Ok(name.to_string())
    }
}

/// Real database and crawler behind a processor
pub struct TestEnvironment {
    pub processor: DonationProcessor,
    pub store: SqliteStore,
    pub lock: OrgLock,
    pub events: EventReceiver,
    _dir: TempDir,
}

#[allow(dead_code)]
impl TestEnvironment {
    pub async fn new(host: &CodeHost) -> Self {
        let dir = TempDir::new().unwrap();
        let pool = patron_state::open(&dir.path().join("patron.sqlite"))
            .await
            .unwrap();
        let store = SqliteStore::new(pool.clone());
        let lock = OrgLock::new(pool, Duration::from_secs(180));

        store
            .put_org(&Organization {
                id: ORG_ID.into(),
                name: ORG_NAME.into(),
                installation_id: "42".into(),
                host: "github".into(),
            })
            .await
            .unwrap();

        let (tx, events) = patron_events::channel();
        let client = NetClient::new(NetConfig {
            retry_count: 0,
            ..NetConfig::default()
        })
        .unwrap();
        let source = GithubManifestSource::new(
            client,
            host.server.base_url(),
            Arc::new(StaticTokenProvider::new("ghs_e2e")),
            tx.clone(),
        );

        let processor = ProcessorBuilder::new()
            .with_lock(Arc::new(lock.clone()))
            .with_org_store(Arc::new(store.clone()))
            .with_ledger(Arc::new(store.clone()))
            .with_manifest_source(Arc::new(source))
            .with_resolver(Arc::new(ManifestResolver))
            .with_event_sender(tx)
            .build()
            .unwrap();

        Self {
            processor,
            store,
            lock,
            events,
            _dir: dir,
        }
    }

    /// Everything emitted so far
    pub fn drain_events(&mut self) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Ledger as `package -> millicents`, summed per package
    pub async fn ledger(&self) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for entry in self.store.ledger_for_org(ORG_ID).await.unwrap() {
            let name = entry.package_name.unwrap_or(entry.package_id);
            *totals.entry(name).or_insert(0.0) += entry.amount;
        }
        totals
    }
}

pub fn donation_body(amount_cents: u64) -> String {
    json!({
        "amount": amount_cents,
        "timestamp": 1_700_000_000_000_i64,
        "organizationId": ORG_ID,
        "description": "end to end donation",
    })
    .to_string()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
