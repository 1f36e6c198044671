//! Code host API payloads

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

/// One entry of `GET /orgs/{org}/repos`
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub owner: RepoOwner,
    #[serde(default)]
    pub archived: bool,
}

/// Body of `GET /search/code`. A body without `items` is an empty result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<CodeSearchItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CodeSearchItem {
    /// File name without directories, matched against the search pattern
    pub name: String,
    /// Path from the repository root
    pub path: String,
}

/// Body of `GET /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Clone, Deserialize)]
pub struct FileContents {
    pub content: String,
}
