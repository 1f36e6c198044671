use serde::{Deserialize, Serialize};

/// Manifest crawl progress
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CrawlEvent {
    Started {
        organization: String,
        pattern_groups: usize,
    },

    RepositoriesListed {
        organization: String,
        active: usize,
        archived: usize,
    },

    SearchCompleted {
        repository: String,
        registry: String,
        language: String,
        matches: usize,
        cached: bool,
    },

    /// A search failed and contributes no matches
    SearchFailed {
        repository: String,
        pattern: String,
        message: String,
    },

    DownloadStarted { repository: String, path: String },

    Completed {
        organization: String,
        manifests: usize,
    },
}
