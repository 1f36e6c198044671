//! Weighted-proportional donation distribution
//!
//! A donation is first split across `(registry, language)` groups in
//! proportion to how many packages each group has, flooring every group's
//! amount so the total never exceeds the donation. Each group's amount is
//! then split across its packages by weight and appended to the ledger.

use patron_errors::Error;
use patron_events::{AppEvent, DonationEvent, EventEmitter, EventSender, FailureContext};
use patron_state::LedgerStore;
use patron_types::{now_millis, Ecosystem, LedgerShare, Millicents, PackageWeightMap, UsageSnapshot};
use serde::Serialize;
use std::sync::Arc;

/// A weight map together with the ecosystem it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct GroupWeights {
    pub registry: String,
    pub language: String,
    pub weights: PackageWeightMap,
}

impl GroupWeights {
    pub fn new(
        registry: impl Into<String>,
        language: impl Into<String>,
        weights: PackageWeightMap,
    ) -> Self {
        Self {
            registry: registry.into(),
            language: language.into(),
            weights,
        }
    }

    #[must_use]
    pub fn ecosystem(&self) -> Ecosystem {
        Ecosystem::new(&self.registry, &self.language)
    }
}

/// One group's floored share of a donation
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAllocation<'a> {
    pub group: &'a GroupWeights,
    pub amount: Millicents,
}

/// Split `donation` across non-empty groups in proportion to their package
/// counts. Empty groups get no allocation.
#[must_use]
pub fn allocate(donation: Millicents, groups: &[GroupWeights]) -> Vec<GroupAllocation<'_>> {
    let total: u128 = groups.iter().map(|g| g.weights.len() as u128).sum();
    if total == 0 {
        return Vec::new();
    }

    groups
        .iter()
        .filter(|group| !group.weights.is_empty())
        .map(|group| {
            let share = u128::from(donation) * group.weights.len() as u128 / total;
            GroupAllocation {
                group,
                // never larger than `donation`
                amount: Millicents::try_from(share).unwrap_or(donation),
            }
        })
        .collect()
}

/// Split one group's amount across its packages by weight, leaving out
/// shares smaller than `epsilon` millicents.
///
/// Returns `None` when the weights sum to zero or less.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn split_group(
    weights: &PackageWeightMap,
    amount: Millicents,
    epsilon: Millicents,
) -> Option<Vec<LedgerShare>> {
    let amount = amount as f64;
    let epsilon = epsilon as f64;
    let normalized = weights.is_normalized();
    let total = weights.total_weight();
    if !normalized && total <= 0.0 {
        return None;
    }

    Some(
        weights
            .iter()
            .map(|(package, weight)| LedgerShare {
                package: package.to_string(),
                amount: if normalized {
                    weight * amount
                } else {
                    weight / total * amount
                },
            })
            .filter(|share| share.amount >= epsilon)
            .collect(),
    )
}

/// Outcome for one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub registry: String,
    pub language: String,
    pub allocated: Millicents,
    pub packages: usize,
    /// Millicents of the allocation held back as shares below the
    /// compensation epsilon
    pub withheld: f64,
    /// Why nothing was written, if so
    pub skipped: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DistributionReport {
    pub donation: Millicents,
    pub groups: Vec<GroupReport>,
}

impl DistributionReport {
    /// Millicents written to the ledger
    #[must_use]
    pub fn distributed(&self) -> Millicents {
        self.groups
            .iter()
            .filter(|g| g.skipped.is_none())
            .map(|g| g.allocated)
            .sum()
    }

    /// Millicents lost to flooring or skipped groups
    #[must_use]
    pub fn undistributed(&self) -> Millicents {
        self.donation.saturating_sub(self.distributed())
    }

    /// Millicents allocated to written groups but held back as shares below
    /// the compensation epsilon
    #[must_use]
    pub fn withheld(&self) -> f64 {
        self.groups.iter().map(|g| g.withheld).sum()
    }
}

/// Writes allocations to the ledger
#[derive(Clone)]
pub struct DonationDistributor {
    ledger: Arc<dyn LedgerStore>,
    compensation_epsilon: Millicents,
    tx: EventSender,
}

impl DonationDistributor {
    #[must_use]
    pub fn new(ledger: Arc<dyn LedgerStore>, tx: EventSender) -> Self {
        Self {
            ledger,
            compensation_epsilon: patron_config::constants::COMPENSATION_EPSILON_MILLICENTS,
            tx,
        }
    }

    /// Smallest share, in millicents, written for a package
    #[must_use]
    pub fn with_compensation_epsilon(mut self, epsilon: Millicents) -> Self {
        self.compensation_epsilon = epsilon;
        self
    }

    /// Distribute `donation` millicents across `groups` on behalf of an
    /// organization.
    ///
    /// Each group is written in its own transaction. A zero donation
    /// writes nothing.
    ///
    /// # Errors
    ///
    /// Returns the first ledger write failure. Groups written before the
    /// failure stay written.
    #[allow(clippy::cast_precision_loss)]
    pub async fn distribute(
        &self,
        organization_id: &str,
        donation: Millicents,
        groups: &[GroupWeights],
    ) -> Result<DistributionReport, Error> {
        let mut report = DistributionReport {
            donation,
            groups: Vec::new(),
        };
        if donation == 0 {
            return Ok(report);
        }

        let timestamp = now_millis();
        for allocation in allocate(donation, groups) {
            let group = allocation.group;
            let mut withheld = 0.0;
            let skipped = if allocation.amount == 0 {
                Some("allocation rounds down to zero".to_string())
            } else {
                match split_group(&group.weights, allocation.amount, self.compensation_epsilon) {
                    Some(shares) if shares.is_empty() => {
                        Some("every share is below the compensation epsilon".to_string())
                    }
                    Some(shares) => {
                        let written: f64 = shares.iter().map(|s| s.amount).sum();
                        withheld = (allocation.amount as f64 - written).max(0.0);
                        self.ledger
                            .record_group(
                                organization_id,
                                &group.registry,
                                &group.language,
                                &shares,
                                timestamp,
                            )
                            .await?;
                        None
                    }
                    None => Some("package weights sum to zero".to_string()),
                }
            };

            match &skipped {
                None => self.tx.emit(AppEvent::Donation(DonationEvent::GroupDistributed {
                    organization_id: organization_id.to_string(),
                    registry: group.registry.clone(),
                    language: group.language.clone(),
                    amount: allocation.amount,
                    packages: group.weights.len(),
                })),
                Some(reason) => self.tx.emit(AppEvent::Donation(DonationEvent::GroupSkipped {
                    organization_id: organization_id.to_string(),
                    registry: group.registry.clone(),
                    language: group.language.clone(),
                    reason: reason.clone(),
                })),
            }

            report.groups.push(GroupReport {
                registry: group.registry.clone(),
                language: group.language.clone(),
                allocated: allocation.amount,
                packages: group.weights.len(),
                withheld,
                skipped,
            });
        }

        Ok(report)
    }

    /// Record dependency counts for trend reporting. Failures are reported
    /// as events and never propagate.
    pub async fn snapshot(&self, organization_id: &str, total_deps: u64, top_level_deps: u64) -> bool {
        let snapshot = UsageSnapshot {
            organization_id: organization_id.to_string(),
            total_deps,
            top_level_deps,
            timestamp: now_millis(),
        };

        match self.ledger.record_snapshot(&snapshot).await {
            Ok(()) => {
                self.tx.emit(AppEvent::Donation(DonationEvent::SnapshotRecorded {
                    organization_id: snapshot.organization_id,
                    total_deps,
                    top_level_deps,
                }));
                true
            }
            Err(e) => {
                self.tx.emit(AppEvent::Donation(DonationEvent::SnapshotFailed {
                    organization_id: snapshot.organization_id,
                    failure: FailureContext::from_error(&e),
                }));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(registry: &str, language: &str, weights: &[(&str, f64)]) -> GroupWeights {
        GroupWeights::new(registry, language, weights.iter().copied().collect())
    }

    #[test]
    fn three_to_one_split() {
        let groups = vec![
            group("npm", "javascript", &[("a", 0.5), ("b", 0.2), ("c", 0.3)]),
            group("pypi", "python", &[("d", 1.0)]),
        ];
        let amounts: Vec<_> = allocate(930_000, &groups).iter().map(|a| a.amount).collect();
        assert_eq!(amounts, vec![697_500, 232_500]);
    }

    #[test]
    fn empty_groups_get_nothing() {
        let groups = vec![
            group("npm", "javascript", &[("a", 1.0)]),
            group("hackage", "haskell", &[]),
        ];
        let allocations = allocate(1_000, &groups);
        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].amount, 1_000);

        assert!(allocate(1_000, &[group("hackage", "haskell", &[])]).is_empty());
    }

    #[test]
    fn floor_never_over_distributes() {
        for donation in [0_u64, 1, 2, 7, 99, 1_000, 930_001, 1_234_567] {
            for sizes in [[1_usize, 1, 1], [2, 3, 5], [1, 0, 9], [7, 11, 13]] {
                let groups: Vec<_> = sizes
                    .iter()
                    .enumerate()
                    .map(|(i, n)| {
                        let weights = (0..*n).map(|p| (format!("pkg{p}"), 1.0)).collect();
                        GroupWeights::new(format!("reg{i}"), "lang", weights)
                    })
                    .collect();
                let allocations = allocate(donation, &groups);
                let total: u64 = allocations.iter().map(|a| a.amount).sum();
                assert!(total <= donation);
                // residual is at most one subunit per group beyond the first
                assert!(donation - total < allocations.len().max(1) as u64);
            }
        }
    }

    #[test]
    fn even_division_is_exact() {
        let groups = vec![
            group("npm", "javascript", &[("a", 1.0), ("b", 1.0)]),
            group("pypi", "python", &[("c", 1.0), ("d", 1.0)]),
        ];
        let total: u64 = allocate(1_000, &groups).iter().map(|a| a.amount).sum();
        assert_eq!(total, 1_000);
    }

    #[test]
    fn normalized_weights_multiply_directly() {
        let weights: PackageWeightMap = [("a", 0.5), ("b", 0.2), ("c", 0.3)].into_iter().collect();
        let shares = split_group(&weights, 697_500, 0).unwrap();
        let sum: f64 = shares.iter().map(|s| s.amount).sum();
        assert!((sum - 697_500.0).abs() < 1e-6);
        assert!((shares[0].amount - 348_750.0).abs() < 1e-6);
    }

    #[test]
    fn unnormalized_weights_are_scaled() {
        let weights: PackageWeightMap = [("a", 2.0), ("b", 6.0)].into_iter().collect();
        let shares = split_group(&weights, 1_000, 0).unwrap();
        assert!((shares[0].amount - 250.0).abs() < 1e-9);
        assert!((shares[1].amount - 750.0).abs() < 1e-9);
    }

    #[test]
    fn zero_weight_sum_is_skipped() {
        let weights: PackageWeightMap = [("a", 0.0), ("b", 0.0)].into_iter().collect();
        assert!(split_group(&weights, 1_000, 0).is_none());
    }

    #[test]
    fn report_totals() {
        let report = DistributionReport {
            donation: 1_000,
            groups: vec![
                GroupReport {
                    registry: "npm".into(),
                    language: "javascript".into(),
                    allocated: 666,
                    packages: 2,
                    withheld: 6.0,
                    skipped: None,
                },
                GroupReport {
                    registry: "pypi".into(),
                    language: "python".into(),
                    allocated: 333,
                    packages: 1,
                    withheld: 0.0,
                    skipped: Some("package weights sum to zero".into()),
                },
            ],
        };
        assert_eq!(report.distributed(), 666);
        assert_eq!(report.undistributed(), 334);
        assert!((report.withheld() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn shares_below_epsilon_are_left_out() {
        let weights: PackageWeightMap = [("a", 0.5), ("b", 0.2), ("c", 0.3)].into_iter().collect();
        let shares = split_group(&weights, 697_500, 150_000).unwrap();
        let packages: Vec<_> = shares.iter().map(|s| s.package.as_str()).collect();
        // b would get 139 500
        assert_eq!(packages, ["a", "c"]);
        let sum: f64 = shares.iter().map(|s| s.amount).sum();
        assert!(sum <= 697_500.0);
    }

    #[test]
    fn share_equal_to_epsilon_is_kept() {
        let weights: PackageWeightMap = [("a", 1.0)].into_iter().collect();
        assert_eq!(split_group(&weights, 1_000, 1_000).unwrap().len(), 1);
        assert!(split_group(&weights, 999, 1_000).unwrap().is_empty());
    }
}
