//! Integration tests for types

#[cfg(test)]
mod tests {
    use patron_types::*;

    #[test]
    fn test_search_pattern_ecosystem() {
        let pattern = SearchPattern::new("npm", "javascript", ["package.json"]);
        assert_eq!(pattern.ecosystem(), Ecosystem::new("npm", "javascript"));
        assert_eq!(pattern.ecosystem().to_string(), "javascript/npm");
    }

    #[test]
    fn test_weight_map_iteration_is_sorted() {
        let weights: PackageWeightMap = [("yttrium-server", 0.3), ("standard", 0.5), ("js-deep-equals", 0.2)]
            .into_iter()
            .collect();
        let names: Vec<&str> = weights.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["js-deep-equals", "standard", "yttrium-server"]);
    }

    #[test]
    fn test_manifest_record_roundtrip_shape() {
        let record = ManifestRecord {
            registry: "npm".into(),
            language: "javascript".into(),
            manifest: "{}".into(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["registry"], "npm");
        assert_eq!(value["manifest"], "{}");
    }
}
