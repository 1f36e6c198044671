//! Processor wiring

use crate::distribute::DonationDistributor;
use crate::fees::FeeModel;
use crate::process::DonationProcessor;
use crate::resolver::WeightResolver;
use patron_crawler::ManifestSource;
use patron_errors::Error;
use patron_events::EventSender;
use patron_state::{DistributedLock, LedgerStore, OrgStore};
use patron_types::Millicents;
use std::sync::Arc;

/// Builder for [`DonationProcessor`]
#[derive(Default)]
pub struct ProcessorBuilder {
    lock: Option<Arc<dyn DistributedLock>>,
    orgs: Option<Arc<dyn OrgStore>>,
    ledger: Option<Arc<dyn LedgerStore>>,
    manifests: Option<Arc<dyn ManifestSource>>,
    resolver: Option<Arc<dyn WeightResolver>>,
    fees: Option<FeeModel>,
    compensation_epsilon: Option<Millicents>,
    tx: Option<EventSender>,
}

impl ProcessorBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_lock(mut self, lock: Arc<dyn DistributedLock>) -> Self {
        self.lock = Some(lock);
        self
    }

    #[must_use]
    pub fn with_org_store(mut self, orgs: Arc<dyn OrgStore>) -> Self {
        self.orgs = Some(orgs);
        self
    }

    #[must_use]
    pub fn with_ledger(mut self, ledger: Arc<dyn LedgerStore>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    #[must_use]
    pub fn with_manifest_source(mut self, manifests: Arc<dyn ManifestSource>) -> Self {
        self.manifests = Some(manifests);
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn WeightResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Defaults to [`FeeModel::default`]
    #[must_use]
    pub fn with_fees(mut self, fees: FeeModel) -> Self {
        self.fees = Some(fees);
        self
    }

    /// Shares below this many millicents are not written. Defaults to
    /// writing every share.
    #[must_use]
    pub fn with_compensation_epsilon(mut self, epsilon: Millicents) -> Self {
        self.compensation_epsilon = Some(epsilon);
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Build the processor
    ///
    /// # Errors
    ///
    /// Returns an error if any required component is missing.
    pub fn build(self) -> Result<DonationProcessor, Error> {
        let lock = self.lock.ok_or_else(|| missing("lock"))?;
        let orgs = self.orgs.ok_or_else(|| missing("org_store"))?;
        let ledger = self.ledger.ok_or_else(|| missing("ledger"))?;
        let manifests = self.manifests.ok_or_else(|| missing("manifest_source"))?;
        let resolver = self.resolver.ok_or_else(|| missing("resolver"))?;
        let tx = self.tx.ok_or_else(|| missing("event_sender"))?;

        let mut distributor = DonationDistributor::new(ledger, tx.clone());
        if let Some(epsilon) = self.compensation_epsilon {
            distributor = distributor.with_compensation_epsilon(epsilon);
        }

        Ok(DonationProcessor {
            lock,
            orgs,
            manifests,
            resolver,
            distributor,
            fees: self.fees.unwrap_or_default(),
            tx,
        })
    }
}

fn missing(component: &str) -> Error {
    Error::internal(format!("processor component not configured: {component}"))
}
