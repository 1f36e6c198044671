//! Manifest discovery and extraction types

use crate::Ecosystem;
use serde::{Deserialize, Serialize};

/// Which filenames constitute a manifest for a registry/language pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPattern {
    pub registry: String,
    pub language: String,
    /// Glob patterns matched against the file name, in search order
    pub patterns: Vec<String>,
}

impl SearchPattern {
    pub fn new(
        registry: impl Into<String>,
        language: impl Into<String>,
        patterns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            registry: registry.into(),
            language: language.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn ecosystem(&self) -> Ecosystem {
        Ecosystem::new(&self.registry, &self.language)
    }
}

/// Raw contents of one downloaded manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRecord {
    pub registry: String,
    pub language: String,
    pub manifest: String,
}

/// Top-level dependencies extracted from all manifests of one ecosystem.
///
/// Duplicates are kept so weighting can reflect how often a package is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGroup {
    pub registry: String,
    pub language: String,
    pub deps: Vec<String>,
}

impl DependencyGroup {
    #[must_use]
    pub fn ecosystem(&self) -> Ecosystem {
        Ecosystem::new(&self.registry, &self.language)
    }
}
