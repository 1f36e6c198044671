//! System setup and initialization

use crate::error::CliError;
use crate::resolver::HttpWeightResolver;
use patron_config::Config;
use patron_crawler::{GithubManifestSource, StaticTokenProvider};
use patron_events::EventSender;
use patron_net::{NetClient, NetConfig};
use patron_ops::{DonationProcessor, FeeModel, ProcessorBuilder};
use patron_state::{OrgLock, SqliteStore};
use std::sync::Arc;
use tracing::{debug, info};

/// Database-backed components shared by every command
pub struct SystemSetup {
    config: Config,
    store: SqliteStore,
    lock: OrgLock,
}

impl SystemSetup {
    /// Open the database and apply pending migrations
    pub async fn initialize(config: Config) -> Result<Self, CliError> {
        let db_path = config.database_path();
        info!(database = %db_path.display(), "Opening patron database");

        let pool = patron_state::open(&db_path).await?;
        let lock = OrgLock::new(pool.clone(), config.lock_ttl());
        let store = SqliteStore::new(pool);

        debug!(lock_ttl_secs = config.lock.ttl, "State initialized");
        Ok(Self {
            config,
            store,
            lock,
        })
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn lock(&self) -> &OrgLock {
        &self.lock
    }

    /// Wire the code host, resolver and ledger into a processor
    pub fn processor(&self, tx: EventSender) -> Result<DonationProcessor, CliError> {
        let config = &self.config;

        let credentials = Arc::new(StaticTokenProvider::from_config(config)?);
        let manifests = GithubManifestSource::from_config(config, credentials, tx.clone())?;

        let resolver_client = NetClient::new(NetConfig::from(&config.network))?;
        let resolver = HttpWeightResolver::new(resolver_client, config.resolver_url()?)?;

        let store = Arc::new(self.store.clone());
        let processor = ProcessorBuilder::new()
            .with_lock(Arc::new(self.lock.clone()))
            .with_org_store(store.clone())
            .with_ledger(store)
            .with_manifest_source(Arc::new(manifests))
            .with_resolver(Arc::new(resolver))
            .with_fees(FeeModel::from(&config.fees))
            .with_compensation_epsilon(config.fees.compensation_epsilon)
            .with_event_sender(tx)
            .build()?;

        info!(
            code_host = %config.code_host.api_url,
            concurrent_downloads = config.resources.concurrent_downloads,
            "Donation processor ready"
        );
        Ok(processor)
    }
}
