//! Structured logging integration for events
//!
//! Library crates report through `AppEvent`s. This module turns each event
//! into a tracing record with structured fields.

use patron_events::{AppEvent, CrawlEvent, DonationEvent, GeneralEvent, LockEvent};
use tracing::{debug, error, info, trace, warn};

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(event: &AppEvent) {
    let source = event.log_target();
    match event {
        AppEvent::Lock(lock_event) => match lock_event {
            LockEvent::Acquired {
                organization_id,
                locked_until,
            } => {
                info!(
                    source,
                    organization_id = %organization_id,
                    locked_until,
                    "Organization lock acquired"
                );
            }
            LockEvent::Conflict { organization_id } => {
                warn!(
                    source,
                    organization_id = %organization_id,
                    "Organization is locked by another worker"
                );
            }
            LockEvent::Released { organization_id } => {
                debug!(source, organization_id = %organization_id, "Organization lock released");
            }
            LockEvent::ReleaseFailed {
                organization_id,
                failure,
            } => {
                warn!(
                    source,
                    organization_id = %organization_id,
                    code = ?failure.code,
                    message = %failure.message,
                    "Organization lock release failed; it expires with its TTL"
                );
            }
        },

        AppEvent::Crawl(crawl_event) => match crawl_event {
            CrawlEvent::Started {
                organization,
                pattern_groups,
            } => {
                info!(source, organization = %organization, pattern_groups, "Manifest crawl started");
            }
            CrawlEvent::RepositoriesListed {
                organization,
                active,
                archived,
            } => {
                info!(
                    source,
                    organization = %organization,
                    active,
                    archived,
                    "Repositories listed"
                );
            }
            CrawlEvent::SearchCompleted {
                repository,
                registry,
                language,
                matches,
                cached,
            } => {
                debug!(
                    source,
                    repository = %repository,
                    registry = %registry,
                    language = %language,
                    matches,
                    cached,
                    "Manifest search completed"
                );
            }
            CrawlEvent::SearchFailed {
                repository,
                pattern,
                message,
            } => {
                warn!(
                    source,
                    repository = %repository,
                    pattern = %pattern,
                    message = %message,
                    "Manifest search failed; skipping"
                );
            }
            CrawlEvent::DownloadStarted { repository, path } => {
                trace!(source, repository = %repository, path = %path, "Downloading manifest");
            }
            CrawlEvent::Completed {
                organization,
                manifests,
            } => {
                info!(source, organization = %organization, manifests, "Manifest crawl completed");
            }
        },

        AppEvent::Donation(donation_event) => match donation_event {
            DonationEvent::Received {
                organization_id,
                amount_cents,
                donation_millicents,
                target_package_id,
                description,
            } => {
                info!(
                    source,
                    organization_id = %organization_id,
                    amount_cents,
                    donation_millicents,
                    target_package_id = ?target_package_id,
                    description = ?description,
                    "Donation received"
                );
            }
            DonationEvent::StageEntered {
                organization_id,
                stage,
            } => {
                debug!(source, organization_id = %organization_id, stage = %stage, "Stage entered");
            }
            DonationEvent::GroupDistributed {
                organization_id,
                registry,
                language,
                amount,
                packages,
            } => {
                info!(
                    source,
                    organization_id = %organization_id,
                    registry = %registry,
                    language = %language,
                    amount,
                    packages,
                    "Group distributed"
                );
            }
            DonationEvent::GroupSkipped {
                organization_id,
                registry,
                language,
                reason,
            } => {
                warn!(
                    source,
                    organization_id = %organization_id,
                    registry = %registry,
                    language = %language,
                    reason = %reason,
                    "Group skipped"
                );
            }
            DonationEvent::SnapshotRecorded {
                organization_id,
                total_deps,
                top_level_deps,
            } => {
                info!(
                    source,
                    organization_id = %organization_id,
                    total_deps,
                    top_level_deps,
                    "Usage snapshot recorded"
                );
            }
            DonationEvent::SnapshotFailed {
                organization_id,
                failure,
            } => {
                warn!(
                    source,
                    organization_id = %organization_id,
                    code = ?failure.code,
                    message = %failure.message,
                    "Usage snapshot failed"
                );
            }
            DonationEvent::Completed {
                organization_id,
                distributed,
            } => {
                info!(
                    source,
                    organization_id = %organization_id,
                    distributed,
                    "Donation processed"
                );
            }
            DonationEvent::Failed {
                organization_id,
                failure,
            } => {
                if failure.retryable {
                    warn!(
                        source,
                        organization_id = %organization_id,
                        retryable = failure.retryable,
                        code = ?failure.code,
                        message = %failure.message,
                        hint = ?failure.hint,
                        "Donation processing failed"
                    );
                } else {
                    error!(
                        source,
                        organization_id = %organization_id,
                        retryable = failure.retryable,
                        code = ?failure.code,
                        message = %failure.message,
                        hint = ?failure.hint,
                        "Donation processing failed"
                    );
                }
            }
        },

        AppEvent::General(general_event) => match general_event {
            GeneralEvent::OperationFailed { operation, failure } => {
                if failure.retryable {
                    warn!(
                        source,
                        operation = %operation,
                        retryable = failure.retryable,
                        code = ?failure.code,
                        message = %failure.message,
                        hint = ?failure.hint,
                        "Operation failed"
                    );
                } else {
                    error!(
                        source,
                        operation = %operation,
                        retryable = failure.retryable,
                        code = ?failure.code,
                        message = %failure.message,
                        hint = ?failure.hint,
                        "Operation failed"
                    );
                }
            }
            GeneralEvent::RateLimitApplied {
                operation,
                delay_ms,
                reason,
            } => {
                warn!(
                    source,
                    operation = %operation,
                    delay_ms,
                    reason = %reason,
                    "Rate limit applied"
                );
            }
            GeneralEvent::Warning { message, context } => {
                warn!(source, message = %message, context = ?context, "Warning");
            }
        },
    }
}
