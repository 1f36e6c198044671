#![deny(clippy::pedantic, unsafe_code)]

//! Resource management utilities for patron
//!
//! Concurrency limits used while crawling and the pool that enforces them.

pub mod limits;
pub mod pool;

pub use limits::{IntoResourceLimits, ResourceLimits};
pub use pool::DownloadPool;
