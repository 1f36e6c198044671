#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Manifest crawling for patron
//!
//! Lists an organization's repositories on the code host, searches each
//! one for manifest files and downloads the matches. All requests of one
//! crawl share a rate-limit gate and a bounded download pool.

mod cache;
mod crawler;
pub mod models;
mod source;

pub use cache::{RepoListCache, SearchCache, SearchKey};
pub use crawler::ManifestCrawler;
pub use source::{CredentialProvider, GithubManifestSource, ManifestSource, StaticTokenProvider};
