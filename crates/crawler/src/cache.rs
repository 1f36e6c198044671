//! Per-crawl response caches
//!
//! Both caches live exactly as long as the crawler that owns them. File
//! contents are never cached.

use crate::models::{CodeSearchItem, Repository};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

/// The organization's non-archived repositories, fetched at most once
#[derive(Debug, Default)]
pub struct RepoListCache {
    repos: OnceCell<Arc<Vec<Repository>>>,
}

impl RepoListCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> Option<Arc<Vec<Repository>>> {
        self.repos.get().cloned()
    }

    /// Return the cached list or run `load` to fill it. A failed load
    /// leaves the cache empty.
    pub async fn get_or_try_load<F, Fut, E>(&self, load: F) -> Result<Arc<Vec<Repository>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Vec<Repository>, E>>,
    {
        self.repos
            .get_or_try_init(|| async { load().await.map(Arc::new) })
            .await
            .cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchKey {
    pub repository: String,
    pub registry: String,
    pub language: String,
}

impl SearchKey {
    pub fn new(
        repository: impl Into<String>,
        registry: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            registry: registry.into(),
            language: language.into(),
        }
    }
}

/// Filtered search matches per repository and pattern group
#[derive(Debug, Default)]
pub struct SearchCache {
    entries: Mutex<HashMap<SearchKey, Arc<Vec<CodeSearchItem>>>>,
}

impl SearchCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &SearchKey) -> Option<Arc<Vec<CodeSearchItem>>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn insert(&self, key: SearchKey, items: Vec<CodeSearchItem>) -> Arc<Vec<CodeSearchItem>> {
        let items = Arc::new(items);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&items));
        items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepoOwner;

    fn repo(name: &str) -> Repository {
        Repository {
            name: name.to_string(),
            full_name: format!("acme/{name}"),
            owner: RepoOwner {
                login: "acme".to_string(),
            },
            archived: false,
        }
    }

    #[tokio::test]
    async fn repo_list_loads_once() {
        let cache = RepoListCache::new();
        let first: Result<_, ()> = cache.get_or_try_load(|| async { Ok(vec![repo("a")]) }).await;
        assert_eq!(first.unwrap().len(), 1);

        let second: Result<_, ()> = cache
            .get_or_try_load(|| async { panic!("loaded twice") })
            .await;
        assert_eq!(second.unwrap()[0].name, "a");
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let cache = RepoListCache::new();
        let failed: Result<_, &str> = cache.get_or_try_load(|| async { Err("boom") }).await;
        assert!(failed.is_err());
        assert!(cache.get().is_none());
    }

    #[test]
    fn search_keys_are_scoped_by_ecosystem() {
        let cache = SearchCache::new();
        cache.insert(
            SearchKey::new("acme/cli", "npm", "javascript"),
            vec![CodeSearchItem {
                name: "package.json".into(),
                path: "package.json".into(),
            }],
        );
        assert!(cache.get(&SearchKey::new("acme/cli", "npm", "javascript")).is_some());
        assert!(cache.get(&SearchKey::new("acme/cli", "pypi", "python")).is_none());
        assert_eq!(cache.len(), 1);
    }
}
