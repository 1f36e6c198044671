//! HTTP client for the external weight resolver service

use async_trait::async_trait;
use patron_errors::{ConfigError, Error, ResolverError};
use patron_net::{ensure_success, NetClient};
use patron_ops::{WeightRequest, WeightResolver};
use patron_types::{DependencyGroup, ManifestRecord, PackageWeightMap, SearchPattern};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Serialize)]
struct ExtractRequest<'a> {
    manifests: &'a [ManifestRecord],
}

#[derive(Serialize)]
struct LatestSpecRequest<'a> {
    name: &'a str,
    language: &'a str,
    registry: &'a str,
}

#[derive(Deserialize)]
struct LatestSpecResponse {
    spec: String,
}

/// [`WeightResolver`] backed by a JSON-over-HTTP service
///
/// `GET patterns`, `POST extract`, `POST weights` and `POST latest-spec`
/// are resolved against the configured base URL.
pub struct HttpWeightResolver {
    client: NetClient,
    base_url: Url,
}

impl HttpWeightResolver {
    /// # Errors
    ///
    /// Returns a config error if `base_url` is not a valid URL.
    pub fn new(client: NetClient, base_url: &str) -> Result<Self, Error> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| ConfigError::InvalidValue {
            field: "resolver.url".to_string(),
            value: format!("{base_url}: {e}"),
        })?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, operation: &'static str, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path)
            .map_err(|e| failed(operation, &e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, operation: &'static str, path: &str) -> Result<T, Error> {
        let url = self.endpoint(operation, path)?;
        let response = self
            .client
            .get(url.as_str())
            .await
            .and_then(ensure_success)
            .map_err(|e| failed(operation, &e.to_string()))?;
        response
            .json()
            .await
            .map_err(|e| failed(operation, &e.to_string()))
    }

    async fn post<B, T>(&self, operation: &'static str, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(operation, path)?;
        let response = self
            .client
            .post_json(url.as_str(), body)
            .await
            .and_then(ensure_success)
            .map_err(|e| failed(operation, &e.to_string()))?;
        response
            .json()
            .await
            .map_err(|e| failed(operation, &e.to_string()))
    }
}

fn failed(operation: &str, message: &str) -> Error {
    ResolverError::Failed {
        operation: operation.to_string(),
        message: message.to_string(),
    }
    .into()
}

#[async_trait]
impl WeightResolver for HttpWeightResolver {
    async fn supported_manifest_patterns(&self) -> Result<Vec<SearchPattern>, Error> {
        self.get("supported_manifest_patterns", "patterns").await
    }

    async fn extract_dependencies(
        &self,
        manifests: &[ManifestRecord],
    ) -> Result<Vec<DependencyGroup>, Error> {
        self.post("extract_dependencies", "extract", &ExtractRequest { manifests })
            .await
    }

    async fn compute_package_weight(
        &self,
        request: WeightRequest,
    ) -> Result<PackageWeightMap, Error> {
        self.post("compute_package_weight", "weights", &request).await
    }

    async fn build_latest_spec(
        &self,
        name: &str,
        language: &str,
        registry: &str,
    ) -> Result<String, Error> {
        let response: LatestSpecResponse = self
            .post(
                "build_latest_spec",
                "latest-spec",
                &LatestSpecRequest {
                    name,
                    language,
                    registry,
                },
            )
            .await?;
        Ok(response.spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use patron_net::NetConfig;
    use serde_json::json;
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn resolver(server: &MockServer) -> HttpWeightResolver {
        let client = NetClient::new(NetConfig {
            retry_count: 0,
            retry_delay: Duration::from_millis(1),
            ..NetConfig::default()
        })
        .unwrap();
        HttpWeightResolver::new(client, &server.url("/v1")).unwrap()
    }

    #[tokio::test]
    async fn fetches_patterns() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/patterns");
                then.status(200).json_body(json!([
                    {"registry": "npm", "language": "javascript", "patterns": ["package.json"]},
                    {"registry": "pypi", "language": "python", "patterns": ["requirements.txt", "*.pip"]}
                ]));
            })
            .await;

        let patterns = resolver(&server).supported_manifest_patterns().await.unwrap();

        mock.assert_async().await;
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[1].patterns, vec!["requirements.txt", "*.pip"]);
    }

    #[tokio::test]
    async fn posts_weight_request_in_camel_case() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/weights").json_body(json!({
                    "topLevelPackages": ["react", "react"],
                    "language": "javascript",
                    "registry": "npm",
                    "noCompList": ["left-pad"]
                }));
                then.status(200)
                    .json_body(json!({"react": 0.75, "loose-envify": 0.25}));
            })
            .await;

        let weights = resolver(&server)
            .compute_package_weight(WeightRequest {
                top_level_packages: vec!["react".into(), "react".into()],
                language: "javascript".into(),
                registry: "npm".into(),
                no_comp_list: BTreeSet::from(["left-pad".to_string()]),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(weights.get("react"), Some(0.75));
        assert!(weights.is_normalized());
    }

    #[tokio::test]
    async fn extracts_dependencies() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/extract").json_body(json!({
                    "manifests": [
                        {"registry": "npm", "language": "javascript", "manifest": "{}"}
                    ]
                }));
                then.status(200).json_body(json!([
                    {"registry": "npm", "language": "javascript", "deps": ["standard"]}
                ]));
            })
            .await;

        let groups = resolver(&server)
            .extract_dependencies(&[ManifestRecord {
                registry: "npm".into(),
                language: "javascript".into(),
                manifest: "{}".into(),
            }])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(groups[0].deps, vec!["standard"]);
    }

    #[tokio::test]
    async fn builds_latest_spec() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/latest-spec").json_body(json!({
                    "name": "standard",
                    "language": "javascript",
                    "registry": "npm"
                }));
                then.status(200).json_body(json!({"spec": "standard@latest"}));
            })
            .await;

        let spec = resolver(&server)
            .build_latest_spec("standard", "javascript", "npm")
            .await
            .unwrap();
        assert_eq!(spec, "standard@latest");
    }

    #[tokio::test]
    async fn service_errors_become_resolver_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/patterns");
                then.status(503);
            })
            .await;

        let err = resolver(&server)
            .supported_manifest_patterns()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Resolver(ResolverError::Failed { ref operation, .. })
                if operation == "supported_manifest_patterns"
        ));
    }

    #[test]
    fn rejects_invalid_base_url() {
        let client = NetClient::with_defaults().unwrap();
        assert!(HttpWeightResolver::new(client, "not a url").is_err());
    }
}
