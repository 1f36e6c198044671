//! Integration tests for config

#[cfg(test)]
mod tests {
    use patron_config::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[general]
database_path = "/tmp/patron-test.sqlite"

[code_host]
api_url = "http://localhost:8080"
token = "ghs_test"

[lock]
ttl = 60

[fees]
percent_fee_bps = 500
compensation_epsilon = 250
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(
            config.database_path(),
            std::path::PathBuf::from("/tmp/patron-test.sqlite")
        );
        assert_eq!(config.code_host.api_url, "http://localhost:8080");
        assert_eq!(config.code_host_token().unwrap(), "ghs_test");
        assert_eq!(config.lock_ttl(), std::time::Duration::from_secs(60));
        assert_eq!(config.fees.percent_fee_bps, 500);
        assert_eq!(config.fees.compensation_epsilon, 250);
        // untouched sections keep their defaults
        assert_eq!(config.fees.flat_fee_cents, 30);
        assert_eq!(config.resources.concurrent_downloads, 30);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.code_host.api_url, "https://api.github.com");
        assert_eq!(config.lock.ttl, 180);
        assert_eq!(config.fees.percent_fee_bps, 400);
        assert_eq!(config.fees.compensation_epsilon, 0);
        assert!(config.code_host_token().is_err());
        assert!(config.resolver_url().is_err());
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = Config::load_from_file(std::path::Path::new("/nonexistent/patron.toml")).await;
        assert!(matches!(
            result,
            Err(patron_errors::Error::Config(patron_errors::ConfigError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::set_var("PATRON_LOCK_TTL", "90");
        std::env::set_var("PATRON_RESOLVER_URL", "http://resolver.local");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.lock.ttl, 90);
        assert_eq!(config.resolver_url().unwrap(), "http://resolver.local");

        std::env::remove_var("PATRON_LOCK_TTL");
        std::env::remove_var("PATRON_RESOLVER_URL");
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::set_var("PATRON_CONCURRENT_DOWNLOADS", "many");

        let mut config = Config::default();
        let result = config.merge_env();
        assert!(result.is_err());

        std::env::remove_var("PATRON_CONCURRENT_DOWNLOADS");
    }

    #[test]
    fn test_validate_rejects_fee_over_100_percent() {
        let mut config = Config::default();
        config.fees.percent_fee_bps = 10_001;
        assert!(config.validate().is_err());
    }
}
