//! Fixed defaults for patron
//!
//! Every value here can be overridden from the configuration file or the
//! environment; these are only the fallbacks.

pub const DB_PATH: &str = "/var/lib/patron/patron.sqlite";

pub const CODE_HOST_API_URL: &str = "https://api.github.com";

/// Matches the maximum expected processing time of one donation event
pub const LOCK_TTL_SECS: u64 = 180;

/// Simultaneous manifest downloads per crawl
pub const CONCURRENT_DOWNLOADS: usize = 30;

/// 3% card processing fee plus 1% platform fee
pub const PERCENT_FEE_BPS: u32 = 400;

/// Per-transaction card processing fee
pub const FLAT_FEE_CENTS: u64 = 30;

/// Smallest share, in millicents, written to the ledger
pub const COMPENSATION_EPSILON_MILLICENTS: u64 = 0;

pub const MAX_RATE_LIMIT_WAIT_SECS: u64 = 3600;

pub const SEARCH_PAGE_SIZE: u32 = 100;
