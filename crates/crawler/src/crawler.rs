//! Manifest discovery for one organization

use crate::cache::{RepoListCache, SearchCache, SearchKey};
use crate::models::{CodeSearchItem, FileContents, Repository, SearchResponse};
use base64::Engine;
use futures::future::try_join_all;
use patron_errors::{CrawlError, Error, NetworkError};
use patron_events::{AppEvent, CrawlEvent, EventEmitter, EventSender};
use patron_net::RateLimitedClient;
use patron_resources::{DownloadPool, ResourceLimits};
use patron_types::{ManifestRecord, SearchPattern};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Crawls one organization's repositories for manifest files.
///
/// Repository listings and search results are cached for the lifetime of
/// the crawler, so calling [`ManifestCrawler::fetch_manifests`] again only
/// repeats the downloads.
pub struct ManifestCrawler {
    organization: String,
    api: RateLimitedClient,
    repos: RepoListCache,
    searches: SearchCache,
    downloads: DownloadPool,
    page_size: u32,
    tx: EventSender,
}

impl ManifestCrawler {
    #[must_use]
    pub fn new(
        organization: impl Into<String>,
        api: RateLimitedClient,
        limits: &ResourceLimits,
        tx: EventSender,
    ) -> Self {
        Self {
            organization: organization.into(),
            api,
            repos: RepoListCache::new(),
            searches: SearchCache::new(),
            downloads: DownloadPool::new(limits),
            page_size: patron_config::constants::SEARCH_PAGE_SIZE,
            tx,
        }
    }

    /// Results requested per page for listings and searches
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, 100);
        self
    }

    #[must_use]
    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Download every manifest matching `patterns` across the
    /// organization's active repositories.
    ///
    /// # Errors
    ///
    /// Fails if the repository listing fails, if any single download
    /// fails, or if the rate limit resets later than the maximum wait. Any
    /// other failed search only drops that search's matches.
    pub async fn fetch_manifests(
        &self,
        patterns: &[SearchPattern],
    ) -> Result<Vec<ManifestRecord>, Error> {
        self.tx.emit(AppEvent::Crawl(CrawlEvent::Started {
            organization: self.organization.clone(),
            pattern_groups: patterns.len(),
        }));

        let repos = self.repositories().await?;

        // searches run one at a time; their rate limits are much tighter
        let mut found = Vec::new();
        for repo in repos.iter() {
            for group in patterns {
                found.push((repo, group, self.search(repo, group).await?));
            }
        }

        let downloads = found.iter().flat_map(|(repo, group, matches)| {
            matches
                .iter()
                .map(move |item| self.download(repo, group, item))
        });
        let manifests = try_join_all(downloads).await?;

        self.tx.emit(AppEvent::Crawl(CrawlEvent::Completed {
            organization: self.organization.clone(),
            manifests: manifests.len(),
        }));
        Ok(manifests)
    }

    async fn repositories(&self) -> Result<Arc<Vec<Repository>>, Error> {
        self.repos
            .get_or_try_load(|| async {
                let all = self.list_repositories().await.map_err(|e| {
                    Error::from(CrawlError::RepositoryListingFailed {
                        organization: self.organization.clone(),
                        message: e.to_string(),
                    })
                })?;

                let total = all.len();
                let active: Vec<Repository> = all.into_iter().filter(|r| !r.archived).collect();
                self.tx.emit(AppEvent::Crawl(CrawlEvent::RepositoriesListed {
                    organization: self.organization.clone(),
                    active: active.len(),
                    archived: total - active.len(),
                }));
                Ok::<_, Error>(active)
            })
            .await
    }

    async fn list_repositories(&self) -> Result<Vec<Repository>, Error> {
        let mut url = self.api_path(&["orgs", &self.organization, "repos"])?;
        url.query_pairs_mut()
            .append_pair("per_page", &self.page_size.to_string());
        self.api.get_all_pages(url).await
    }

    /// Matches for one pattern group in one repository. Failed searches
    /// contribute nothing and leave the group uncached, except when the rate
    /// limit outlasts the maximum wait, which fails the crawl.
    async fn search(
        &self,
        repo: &Repository,
        group: &SearchPattern,
    ) -> Result<Arc<Vec<CodeSearchItem>>, Error> {
        let key = SearchKey::new(&repo.full_name, &group.registry, &group.language);
        if let Some(cached) = self.searches.get(&key) {
            self.emit_search_completed(repo, group, cached.len(), true);
            return Ok(cached);
        }

        let mut seen = HashSet::new();
        let mut matches = Vec::new();
        let mut complete = true;

        for pattern in &group.patterns {
            match self.search_pattern(repo, pattern).await {
                Ok(items) => {
                    for item in items {
                        if seen.insert(item.path.clone()) {
                            matches.push(item);
                        }
                    }
                }
                Err(e @ Error::Network(NetworkError::RateLimitWaitExceeded { .. })) => {
                    return Err(e);
                }
                Err(e) => {
                    complete = false;
                    self.tx.emit(AppEvent::Crawl(CrawlEvent::SearchFailed {
                        repository: repo.full_name.clone(),
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    }));
                }
            }
        }

        self.emit_search_completed(repo, group, matches.len(), false);
        Ok(if complete {
            self.searches.insert(key, matches)
        } else {
            Arc::new(matches)
        })
    }

    async fn search_pattern(
        &self,
        repo: &Repository,
        pattern: &str,
    ) -> Result<Vec<CodeSearchItem>, Error> {
        let matcher = glob::Pattern::new(pattern)
            .map_err(|e| Error::internal(format!("invalid manifest pattern {pattern}: {e}")))?;

        let mut url = self.api_path(&["search", "code"])?;
        url.query_pairs_mut()
            .append_pair("q", &format!("filename:{pattern} repo:{}", repo.full_name))
            .append_pair("per_page", &self.page_size.to_string());

        let mut items = Vec::new();
        let mut next = Some(url);
        while let Some(page) = next.take() {
            let (body, following): (SearchResponse, _) = self.api.get_page(&page).await?;
            // search also returns partial name matches, e.g. package-lock.json
            items.extend(
                body.items
                    .into_iter()
                    .filter(|item| matcher.matches(&item.name)),
            );
            next = following;
        }
        Ok(items)
    }

    async fn download(
        &self,
        repo: &Repository,
        group: &SearchPattern,
        item: &CodeSearchItem,
    ) -> Result<ManifestRecord, Error> {
        let _permit = self.downloads.acquire().await?;

        self.tx.emit(AppEvent::Crawl(CrawlEvent::DownloadStarted {
            repository: repo.full_name.clone(),
            path: item.path.clone(),
        }));

        let download_failed = |message: String| CrawlError::DownloadFailed {
            repository: repo.full_name.clone(),
            path: item.path.clone(),
            message,
        };

        let mut segments = vec!["repos", repo.owner.login.as_str(), repo.name.as_str(), "contents"];
        segments.extend(item.path.split('/').filter(|s| !s.is_empty()));
        let url = self
            .api_path(&segments)
            .map_err(|e| download_failed(e.to_string()))?;

        let body: FileContents = self
            .api
            .get_json(&url)
            .await
            .map_err(|e| download_failed(e.to_string()))?;

        let manifest = decode_content(&body.content).map_err(|message| CrawlError::DecodeFailed {
            repository: repo.full_name.clone(),
            path: item.path.clone(),
            message,
        })?;

        Ok(ManifestRecord {
            registry: group.registry.clone(),
            language: group.language.clone(),
            manifest,
        })
    }

    fn api_path(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.api.endpoint("")?;
        url.path_segments_mut()
            .map_err(|()| NetworkError::InvalidUrl("base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn emit_search_completed(
        &self,
        repo: &Repository,
        group: &SearchPattern,
        matches: usize,
        cached: bool,
    ) {
        self.tx.emit(AppEvent::Crawl(CrawlEvent::SearchCompleted {
            repository: repo.full_name.clone(),
            registry: group.registry.clone(),
            language: group.language.clone(),
            matches,
            cached,
        }));
    }
}

/// Decode a base64 file body. The code host wraps the encoding in newlines.
pub(crate) fn decode_content(content: &str) -> Result<String, String> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| e.to_string())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
