//! Authenticated, rate-limit aware access to the code host API

use crate::client::{ensure_success, NetClient};
use crate::pagination::next_link;
use crate::ratelimit::{RateLimit, RateLimitGate};
use patron_errors::{Error, NetworkError};
use patron_events::{EventEmitter, EventSender};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const ACCEPT_JSON: &str = "application/vnd.github.v3+json";

/// Attempts made when the code host rejects a request for exceeding the
/// rate limit.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// One crawl's view of the code host: a base URL, a token, and a gate
/// shared by every request made through it.
pub struct RateLimitedClient {
    client: NetClient,
    base_url: Url,
    headers: HeaderMap,
    gate: RateLimitGate,
    tx: EventSender,
}

impl RateLimitedClient {
    /// # Errors
    ///
    /// Returns an error if the base URL is malformed or the token is not a
    /// valid header value.
    pub fn new(
        client: NetClient,
        base_url: &str,
        token: &str,
        max_wait: Duration,
        tx: EventSender,
    ) -> Result<Self, Error> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = crate::parse_url(&base)?;

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("token {token}"))
            .map_err(|_| NetworkError::InvalidUrl("token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));

        Ok(Self {
            client,
            base_url,
            headers,
            gate: RateLimitGate::new(max_wait),
            tx,
        })
    }

    /// Resolve an API path against the base URL
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be joined onto the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| NetworkError::InvalidUrl(e.to_string()).into())
    }

    #[must_use]
    pub fn gate(&self) -> &RateLimitGate {
        &self.gate
    }

    /// GET a URL, honouring and updating the rate-limit gate
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the code host keeps
    /// rejecting it for exceeding the rate limit, or the limit resets later
    /// than the maximum wait.
    pub async fn get(&self, url: &Url) -> Result<Response, Error> {
        let mut attempts = 0;
        loop {
            self.gate.wait().await;

            let response = match self.client.get_with_headers(url.as_str(), &self.headers).await {
                Ok(response) => response,
                Err(Error::Network(NetworkError::RateLimited { seconds }))
                    if attempts < MAX_RATE_LIMIT_RETRIES =>
                {
                    attempts += 1;
                    let delay = Duration::from_secs(seconds);
                    self.gate.pause_within_limit(delay)?;
                    self.emit_pause(url, delay, "retry-after");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let Some(limit) = RateLimit::from_headers(response.headers()) else {
                return Ok(response);
            };
            if !limit.is_exhausted() {
                return Ok(response);
            }

            let delay = self.gate.pause_until_reset(&limit)?;
            self.emit_pause(url, delay, "rate limit exhausted");

            let rejected = matches!(
                response.status(),
                StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
            );
            if rejected && attempts < MAX_RATE_LIMIT_RETRIES {
                attempts += 1;
                continue;
            }
            return Ok(response);
        }
    }

    /// GET and decode a JSON body
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or a body
    /// that does not decode as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, Error> {
        let response = ensure_success(self.get(url).await?)?;
        decode(url, response).await
    }

    /// GET one page of JSON along with the `rel="next"` link, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the page fails to load or decode, or the next
    /// link is not a valid URL.
    pub async fn get_page<T: DeserializeOwned>(&self, url: &Url) -> Result<(T, Option<Url>), Error> {
        let response = ensure_success(self.get(url).await?)?;
        let next = next_link(response.headers())
            .map(|link| Url::parse(&link))
            .transpose()
            .map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;
        let body = decode(url, response).await?;
        Ok((body, next))
    }

    /// GET every page of a JSON array, following `Link: rel="next"`
    ///
    /// # Errors
    ///
    /// Returns an error if any page fails to load or decode.
    pub async fn get_all_pages<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, Error> {
        let mut items = Vec::new();
        let mut next = Some(url);

        while let Some(page) = next.take() {
            let (batch, following): (Vec<T>, _) = self.get_page(&page).await?;
            items.extend(batch);
            next = following;
        }

        Ok(items)
    }

    fn emit_pause(&self, url: &Url, delay: Duration, reason: &str) {
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.tx
            .emit_rate_limited(url.path().to_string(), delay_ms, reason.to_string());
    }
}

async fn decode<T: DeserializeOwned>(url: &Url, response: Response) -> Result<T, Error> {
    let body = response
        .bytes()
        .await
        .map_err(|e| NetworkError::RequestFailed(e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| {
        NetworkError::InvalidBody {
            url: url.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}
