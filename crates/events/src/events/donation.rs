use serde::{Deserialize, Serialize};
use std::fmt;

use super::FailureContext;

/// Stages a donation event moves through while being processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStage {
    Received,
    Locked,
    CrawlAndExtract,
    TargetPackageLookup,
    Weighted,
    Distributed,
    Unlocked,
}

impl fmt::Display for ProcessStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Locked => "locked",
            Self::CrawlAndExtract => "crawl_and_extract",
            Self::TargetPackageLookup => "target_package_lookup",
            Self::Weighted => "weighted",
            Self::Distributed => "distributed",
            Self::Unlocked => "unlocked",
        };
        f.write_str(name)
    }
}

/// Donation processing and distribution events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DonationEvent {
    Received {
        organization_id: String,
        amount_cents: u64,
        donation_millicents: u64,
        target_package_id: Option<String>,
        description: Option<String>,
    },

    StageEntered {
        organization_id: String,
        stage: ProcessStage,
    },

    GroupDistributed {
        organization_id: String,
        registry: String,
        language: String,
        amount: u64,
        packages: usize,
    },

    GroupSkipped {
        organization_id: String,
        registry: String,
        language: String,
        reason: String,
    },

    SnapshotRecorded {
        organization_id: String,
        total_deps: u64,
        top_level_deps: u64,
    },

    SnapshotFailed {
        organization_id: String,
        failure: FailureContext,
    },

    Completed {
        organization_id: String,
        distributed: u64,
    },

    Failed {
        organization_id: String,
        failure: FailureContext,
    },
}
