//! Seams between the crawler and the rest of the system

use crate::crawler::ManifestCrawler;
use async_trait::async_trait;
use patron_config::Config;
use patron_errors::{CrawlError, Error};
use patron_events::EventSender;
use patron_net::{NetClient, NetConfig, RateLimitedClient};
use patron_resources::{IntoResourceLimits, ResourceLimits};
use patron_types::{ManifestRecord, Organization, SearchPattern};
use std::sync::Arc;
use std::time::Duration;

/// Issues code host access tokens for an organization's installation
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn installation_token(&self, org: &Organization) -> Result<String, Error>;
}

/// Serves one configured token for every organization
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if no token is configured.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        config.code_host_token().map(Self::new)
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn installation_token(&self, _org: &Organization) -> Result<String, Error> {
        Ok(self.token.clone())
    }
}

/// Anything that can produce an organization's manifests
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn fetch_manifests(
        &self,
        org: &Organization,
        patterns: &[SearchPattern],
    ) -> Result<Vec<ManifestRecord>, Error>;
}

/// Manifest source backed by a GitHub-compatible REST API.
///
/// Each call builds a fresh [`ManifestCrawler`], so caches and rate-limit
/// state never leak between donation events.
pub struct GithubManifestSource {
    client: NetClient,
    api_url: String,
    max_rate_limit_wait: Duration,
    page_size: u32,
    limits: ResourceLimits,
    credentials: Arc<dyn CredentialProvider>,
    tx: EventSender,
}

impl GithubManifestSource {
    pub fn new(
        client: NetClient,
        api_url: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
        tx: EventSender,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            max_rate_limit_wait: Duration::from_secs(
                patron_config::constants::MAX_RATE_LIMIT_WAIT_SECS,
            ),
            page_size: patron_config::constants::SEARCH_PAGE_SIZE,
            limits: ResourceLimits::default(),
            credentials,
            tx,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(
        config: &Config,
        credentials: Arc<dyn CredentialProvider>,
        tx: EventSender,
    ) -> Result<Self, Error> {
        let client = NetClient::new(NetConfig::from(&config.network))?;
        Ok(Self::new(client, &config.code_host.api_url, credentials, tx)
            .with_limits((&config.resources).into_resource_limits())
            .with_max_rate_limit_wait(Duration::from_secs(config.code_host.max_rate_limit_wait))
            .with_page_size(config.code_host.page_size))
    }

    #[must_use]
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn with_max_rate_limit_wait(mut self, wait: Duration) -> Self {
        self.max_rate_limit_wait = wait;
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Build a crawler bound to one organization and token
    ///
    /// # Errors
    ///
    /// Returns an error if the configured API URL is invalid.
    pub fn crawler(&self, organization: &str, token: &str) -> Result<ManifestCrawler, Error> {
        let api = RateLimitedClient::new(
            self.client.clone(),
            &self.api_url,
            token,
            self.max_rate_limit_wait,
            self.tx.clone(),
        )?;
        Ok(
            ManifestCrawler::new(organization, api, &self.limits, self.tx.clone())
                .with_page_size(self.page_size),
        )
    }
}

#[async_trait]
impl ManifestSource for GithubManifestSource {
    async fn fetch_manifests(
        &self,
        org: &Organization,
        patterns: &[SearchPattern],
    ) -> Result<Vec<ManifestRecord>, Error> {
        let token = self
            .credentials
            .installation_token(org)
            .await
            .map_err(|e| CrawlError::CredentialsUnavailable {
                organization: org.name.clone(),
                message: e.to_string(),
            })?;

        self.crawler(&org.name, &token)?
            .fetch_manifests(patterns)
            .await
    }
}
