//! Package weight maps

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tolerance used when deciding whether a weight map is already normalized
pub const NORMALIZATION_TOLERANCE: f64 = 1e-9;

/// Mapping from package name to its share of compensation responsibility
/// within one `(registry, language)` pair.
///
/// Weights are non-negative and need not sum to 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageWeightMap(BTreeMap<String, f64>);

impl PackageWeightMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, package: impl Into<String>, weight: f64) {
        self.0.insert(package.into(), weight);
    }

    #[must_use]
    pub fn get(&self, package: &str) -> Option<f64> {
        self.0.get(package).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.0.values().sum()
    }

    /// Whether the weights already sum to 1
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        (self.total_weight() - 1.0).abs() < NORMALIZATION_TOLERANCE
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, weight)| (name.as_str(), *weight))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for PackageWeightMap {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
