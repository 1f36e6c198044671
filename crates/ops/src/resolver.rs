//! Weight resolver seam
//!
//! Manifest parsing and dependency-graph weighting live in an external
//! service. The processor only sees this trait.

use async_trait::async_trait;
use patron_errors::Error;
use patron_types::{DependencyGroup, ManifestRecord, PackageWeightMap, SearchPattern};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Input to a weight computation for one ecosystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightRequest {
    pub top_level_packages: Vec<String>,
    pub language: String,
    pub registry: String,
    /// Packages that must not receive weight
    pub no_comp_list: BTreeSet<String>,
}

#[async_trait]
pub trait WeightResolver: Send + Sync {
    /// Manifest file patterns per supported ecosystem
    async fn supported_manifest_patterns(&self) -> Result<Vec<SearchPattern>, Error>;

    /// Top-level dependencies per ecosystem. Duplicates may be kept.
    async fn extract_dependencies(
        &self,
        manifests: &[ManifestRecord],
    ) -> Result<Vec<DependencyGroup>, Error>;

    /// Weight map over the transitive closure of `request.top_level_packages`
    async fn compute_package_weight(&self, request: WeightRequest)
        -> Result<PackageWeightMap, Error>;

    /// Dependency specifier for the latest version of a package
    async fn build_latest_spec(
        &self,
        name: &str,
        language: &str,
        registry: &str,
    ) -> Result<String, Error>;
}
