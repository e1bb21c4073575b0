//! HTTP transport types and the replaceable transport seam.
//!
//! # Design
//! Requests and responses are described as plain data so the actual I/O can
//! live behind the [`Transport`] trait. The library ships [`UreqTransport`]
//! as the default synchronous implementation; tests and embedders can swap
//! in anything that satisfies the trait. All fields use owned types
//! (`String`, `Vec`) so values can be captured, logged, and replayed without
//! lifetime concerns.
//!
//! The Bot API reports semantic errors through 4xx/5xx responses that still
//! carry a JSON envelope, so the default agent is configured to return
//! non-2xx responses as data rather than as errors — envelope
//! interpretation belongs to the caller, not the transport.

use crate::error::{Error, Result};

/// HTTP method for a request. The Bot API itself is POST-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
///
/// Built by [`Api::build_request`](crate::Api::build_request). The body is
/// raw bytes because multipart payloads are not valid UTF-8.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

/// An HTTP response described as plain data.
///
/// Produced by a [`Transport`] after executing an [`HttpRequest`], then fed
/// to [`parse_response`](crate::api::parse_response) for envelope decoding.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// A synchronous HTTP round-trip.
///
/// Implementations must map network-level failures to [`Error::Transport`]
/// and must return non-2xx responses as data — status interpretation happens
/// in the envelope parser. Timeouts, proxies, and connection reuse are the
/// implementation's business; the executor imposes no policy of its own.
/// Implementations must be safe to share across threads if concurrent calls
/// are made through the same [`Api`](crate::Api).
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Default [`Transport`] backed by a [`ureq::Agent`].
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut response = match request.method {
            HttpMethod::Get => {
                let mut req = self.agent.get(&request.url);
                for (name, value) in &request.headers {
                    req = req.header(name.as_str(), value.as_str());
                }
                req.call()
            }
            HttpMethod::Post => {
                let mut req = self.agent.post(&request.url);
                for (name, value) in &request.headers {
                    req = req.header(name.as_str(), value.as_str());
                }
                req.send(request.body.as_deref().unwrap_or_default())
            }
        }
        .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}
