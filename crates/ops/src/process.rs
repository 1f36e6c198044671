//! Per-event donation processing
//!
//! `RECEIVED -> LOCKED -> (CRAWL_AND_EXTRACT | TARGET_PACKAGE_LOOKUP)
//!  -> WEIGHTED -> DISTRIBUTED -> UNLOCKED`

use crate::distribute::{DistributionReport, DonationDistributor, GroupWeights};
use crate::fees::FeeModel;
use crate::resolver::{WeightRequest, WeightResolver};
use patron_crawler::ManifestSource;
use patron_errors::{Error, ResolverError, ValidationError};
use patron_events::{
    AppEvent, DonationEvent, EventEmitter, EventSender, FailureContext, LockEvent, ProcessStage,
};
use patron_state::{DistributedLock, OrgStore};
use patron_types::{DependencyGroup, DonationRecord, Millicents, Organization, PackageRecord};
use serde::Serialize;
use std::sync::Arc;

/// Result of one successfully processed donation event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessOutcome {
    pub organization_id: String,
    /// Net donation after fees
    pub donation: Millicents,
    pub report: DistributionReport,
    pub snapshot_recorded: bool,
}

/// Drives one donation event from payload to ledger
pub struct DonationProcessor {
    pub(crate) lock: Arc<dyn DistributedLock>,
    pub(crate) orgs: Arc<dyn OrgStore>,
    pub(crate) manifests: Arc<dyn ManifestSource>,
    pub(crate) resolver: Arc<dyn WeightResolver>,
    pub(crate) distributor: DonationDistributor,
    pub(crate) fees: FeeModel,
    pub(crate) tx: EventSender,
}

impl DonationProcessor {
    #[must_use]
    pub fn fees(&self) -> FeeModel {
        self.fees
    }

    /// Process a raw JSON message body
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed payloads, and otherwise
    /// whatever [`DonationProcessor::process_record`] returns.
    pub async fn process(&self, body: &str) -> Result<ProcessOutcome, Error> {
        let record: DonationRecord = serde_json::from_str(body).map_err(|e| {
            let err = Error::from(ValidationError::MalformedPayload {
                message: e.to_string(),
            });
            self.tx
                .emit_operation_failed("process donation", FailureContext::from_error(&err));
            err
        })?;
        self.process_record(record).await
    }

    /// Process one donation
    ///
    /// # Errors
    ///
    /// Validation errors for a missing organization id, unknown
    /// organization or incomplete target package; `LockError::Conflict`
    /// if another worker holds the organization; upstream errors from the
    /// crawler, resolver or ledger.
    pub async fn process_record(&self, record: DonationRecord) -> Result<ProcessOutcome, Error> {
        let Some(organization_id) = record
            .organization_id
            .clone()
            .filter(|id| !id.trim().is_empty())
        else {
            let err = Error::from(ValidationError::MissingOrganizationId);
            self.tx
                .emit_operation_failed("process donation", FailureContext::from_error(&err));
            return Err(err);
        };

        let donation = self.fees.net_millicents(record.amount);
        self.tx.emit(AppEvent::Donation(DonationEvent::Received {
            organization_id: organization_id.clone(),
            amount_cents: record.amount,
            donation_millicents: donation,
            target_package_id: record.target_package_id.clone(),
            description: record.description.clone(),
        }));
        if donation == 0 {
            self.tx.emit_warning_with_context(
                format!("fees consume the entire donation of {} cents", record.amount),
                organization_id.clone(),
            );
        }

        let result = self.process_for_org(&organization_id, &record, donation).await;

        match &result {
            Ok(outcome) => self.tx.emit(AppEvent::Donation(DonationEvent::Completed {
                organization_id: organization_id.clone(),
                distributed: outcome.report.distributed(),
            })),
            Err(e) => self.tx.emit(AppEvent::Donation(DonationEvent::Failed {
                organization_id: organization_id.clone(),
                failure: FailureContext::from_error(e),
            })),
        }
        result
    }

    async fn process_for_org(
        &self,
        organization_id: &str,
        record: &DonationRecord,
        donation: Millicents,
    ) -> Result<ProcessOutcome, Error> {
        // a conflict leaves the other worker's lock alone
        let lock = match self.lock.acquire(organization_id).await {
            Ok(lock) => lock,
            Err(e) => {
                if e.is_lock_conflict() {
                    self.tx.emit(AppEvent::Lock(LockEvent::Conflict {
                        organization_id: organization_id.to_string(),
                    }));
                }
                return Err(e);
            }
        };
        self.tx.emit(AppEvent::Lock(LockEvent::Acquired {
            organization_id: lock.organization_id,
            locked_until: lock.locked_until,
        }));
        self.stage(organization_id, ProcessStage::Locked);

        let result = self.process_locked(organization_id, record, donation).await;

        match self.lock.release(organization_id).await {
            Ok(()) => {
                self.tx.emit(AppEvent::Lock(LockEvent::Released {
                    organization_id: organization_id.to_string(),
                }));
                self.stage(organization_id, ProcessStage::Unlocked);
            }
            Err(e) => self.tx.emit(AppEvent::Lock(LockEvent::ReleaseFailed {
                organization_id: organization_id.to_string(),
                failure: FailureContext::from_error(&e),
            })),
        }
        result
    }

    async fn process_locked(
        &self,
        organization_id: &str,
        record: &DonationRecord,
        donation: Millicents,
    ) -> Result<ProcessOutcome, Error> {
        let org = self
            .orgs
            .get_org(organization_id)
            .await?
            .ok_or_else(|| ValidationError::OrganizationNotFound {
                id: organization_id.to_string(),
            })?;

        match record.target_package_id.as_deref() {
            None => self.distribute_to_org(&org, donation).await,
            Some(package_id) => self.distribute_to_package(&org, package_id, donation).await,
        }
    }

    /// Whole-organization donation: crawl, weigh, distribute, snapshot
    async fn distribute_to_org(
        &self,
        org: &Organization,
        donation: Millicents,
    ) -> Result<ProcessOutcome, Error> {
        self.stage(&org.id, ProcessStage::CrawlAndExtract);
        let patterns = self.resolver.supported_manifest_patterns().await?;
        let manifests = self.manifests.fetch_manifests(org, &patterns).await?;
        let groups = self.resolver.extract_dependencies(&manifests).await?;
        let top_level_deps: u64 = groups.iter().map(|g| g.deps.len() as u64).sum();

        let weighted = self.weigh(groups).await?;
        self.stage(&org.id, ProcessStage::Weighted);
        let total_deps: u64 = weighted.iter().map(|g| g.weights.len() as u64).sum();

        let report = self.distributor.distribute(&org.id, donation, &weighted).await?;
        self.stage(&org.id, ProcessStage::Distributed);

        let snapshot_recorded = self
            .distributor
            .snapshot(&org.id, total_deps, top_level_deps)
            .await;

        Ok(ProcessOutcome {
            organization_id: org.id.clone(),
            donation,
            report,
            snapshot_recorded,
        })
    }

    /// Redistribution to a single package and its dependencies
    async fn distribute_to_package(
        &self,
        org: &Organization,
        package_id: &str,
        donation: Millicents,
    ) -> Result<ProcessOutcome, Error> {
        self.stage(&org.id, ProcessStage::TargetPackageLookup);
        let package = self
            .orgs
            .get_package(package_id)
            .await?
            .ok_or_else(|| ValidationError::PackageNotFound {
                id: package_id.to_string(),
            })?;
        let (name, language, registry) = package_identity(&package)?;

        let spec = self
            .resolver
            .build_latest_spec(name, language, registry)
            .await?;
        let groups = vec![DependencyGroup {
            registry: registry.to_string(),
            language: language.to_string(),
            deps: vec![spec],
        }];

        let weighted = self.weigh(groups).await?;
        self.stage(&org.id, ProcessStage::Weighted);

        let report = self.distributor.distribute(&org.id, donation, &weighted).await?;
        self.stage(&org.id, ProcessStage::Distributed);

        Ok(ProcessOutcome {
            organization_id: org.id.clone(),
            donation,
            report,
            snapshot_recorded: false,
        })
    }

    async fn weigh(&self, groups: Vec<DependencyGroup>) -> Result<Vec<GroupWeights>, Error> {
        let mut weighted = Vec::with_capacity(groups.len());
        for group in groups {
            let no_comp_list = self
                .orgs
                .get_no_comp_list(&group.language, &group.registry)
                .await?;
            let weights = self
                .resolver
                .compute_package_weight(WeightRequest {
                    top_level_packages: group.deps,
                    language: group.language.clone(),
                    registry: group.registry.clone(),
                    no_comp_list,
                })
                .await?;

            if let Some((package, weight)) = weights
                .iter()
                .find(|(_, w)| !w.is_finite() || *w < 0.0)
            {
                return Err(ResolverError::InvalidWeight {
                    package: package.to_string(),
                    weight,
                }
                .into());
            }

            weighted.push(GroupWeights::new(group.registry, group.language, weights));
        }
        Ok(weighted)
    }

    fn stage(&self, organization_id: &str, stage: ProcessStage) {
        self.tx.emit(AppEvent::Donation(DonationEvent::StageEntered {
            organization_id: organization_id.to_string(),
            stage,
        }));
    }
}

/// Name, language and registry of a package, or an error naming the
/// missing ones
fn package_identity(package: &PackageRecord) -> Result<(&str, &str, &str), Error> {
    let missing = package.missing_fields();
    match (&package.name, &package.language, &package.registry) {
        (Some(name), Some(language), Some(registry)) if missing.is_empty() => {
            Ok((name.as_str(), language.as_str(), registry.as_str()))
        }
        _ => Err(ValidationError::PackageMissingFields {
            id: package.id.clone(),
            fields: missing.into_iter().map(String::from).collect(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_of_complete_package() {
        let package = PackageRecord {
            id: "p".into(),
            name: Some("standard".into()),
            language: Some("javascript".into()),
            registry: Some("npm".into()),
        };
        assert_eq!(
            package_identity(&package).unwrap(),
            ("standard", "javascript", "npm")
        );
    }

    #[test]
    fn empty_field_counts_as_missing() {
        let package = PackageRecord {
            id: "p".into(),
            name: Some("standard".into()),
            language: Some(String::new()),
            registry: Some("npm".into()),
        };
        assert!(matches!(
            package_identity(&package),
            Err(Error::Validation(ValidationError::PackageMissingFields { ref fields, .. }))
                if fields == &["language"]
        ));
    }

    #[test]
    fn identity_names_missing_fields() {
        let package = PackageRecord {
            id: "p".into(),
            name: None,
            language: Some("javascript".into()),
            registry: Some(String::new()),
        };
        let err = package_identity(&package).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation error: target package p is missing required fields: name, registry"
        );
    }
}
