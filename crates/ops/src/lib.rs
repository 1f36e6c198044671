#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Donation operations for patron
//!
//! This crate is the orchestration layer: it turns a donation event into
//! ledger entries by driving the organization lock, the manifest crawler,
//! the external weight resolver and the distributor.

mod batch;
mod context;
mod distribute;
mod fees;
mod process;
mod resolver;

pub use batch::{process_batch, BatchReport, QueueBatch, QueueMessage, RecordResult};
pub use context::ProcessorBuilder;
pub use distribute::{
    allocate, split_group, DistributionReport, DonationDistributor, GroupAllocation, GroupReport,
    GroupWeights,
};
pub use fees::FeeModel;
pub use process::{DonationProcessor, ProcessOutcome};
pub use resolver::{WeightRequest, WeightResolver};
