#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for patron
//!
//! This crate handles HTTP access to the code host and the weight
//! resolver: connection pooling, retries, rate-limit gating and
//! `Link` pagination.

mod client;
mod pagination;
mod ratelimit;
mod session;

pub use client::{ensure_success, NetClient, NetConfig};
pub use pagination::next_link;
pub use ratelimit::{RateLimit, RateLimitGate};
pub use session::RateLimitedClient;

use patron_errors::{Error, NetworkError};
use url::Url;

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed or invalid according to RFC 3986.
pub fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()).into())
}
