//! Transport capability: a single blocking HTTP GET
//!
//! Status codes are returned as data so the cache manager can tell an
//! unexpected status apart from a failed request.

use crate::error::{CacheError, CacheResult};
use std::fmt;
use std::io::Read;
use std::time::Duration;
use tracing::debug;

/// Response to a GET: status code plus the unread body.
///
/// Dropping the response closes the body.
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Body stream, read incrementally
    pub body: Box<dyn Read>,
}

impl Response {
    /// Whether the status is `200 OK`
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Performs HTTP GETs
pub trait Transport {
    /// Issue a GET against `url`.
    ///
    /// Errors only for transport failures (DNS, connect, TLS, timeout);
    /// any status code comes back as a `Response`.
    fn get(&self, url: &str) -> CacheResult<Response>;
}

/// Production transport backed by a `ureq` agent
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    /// Create a transport with an overall per-request timeout.
    ///
    /// `None` disables the timeout.
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> CacheResult<Response> {
        debug!("GET {}", url);
        let response = self
            .agent
            .get(url)
            .header(
                "User-Agent",
                concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            )
            .call()
            .map_err(|e| CacheError::transport(url, e))?;

        let status = response.status().as_u16();
        debug!("GET {} -> {}", url, status);
        Ok(Response {
            status,
            body: Box::new(response.into_body().into_reader()),
        })
    }
}
