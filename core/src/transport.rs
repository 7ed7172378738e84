//! Executes `HttpRequest` values against the network.
//!
//! # Design
//! `Transport` is the seam between the pure build/parse layer and real I/O.
//! Status codes are returned as data, never as errors, so the parse methods
//! stay the single place where success is decided. Credentials live in the
//! transport's default headers, not in the client.

use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one HTTP round-trip.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by `ureq`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    default_headers: Vec<(String, String)>,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            default_headers: Vec::new(),
        }
    }

    /// Attach `Authorization: Bearer <token>` to every request.
    pub fn with_bearer_token(self, token: &str) -> Self {
        self.with_header("authorization", &format!("Bearer {token}"))
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .push((name.to_ascii_lowercase(), value.to_string()));
        self
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), path = %request.path, "sending request");

        let headers = self.default_headers.iter().chain(request.headers.iter());
        let result = match request.method {
            HttpMethod::Get | HttpMethod::Delete => {
                let mut builder = if request.method == HttpMethod::Get {
                    self.agent.get(&request.path)
                } else {
                    self.agent.delete(&request.path)
                };
                for (name, value) in headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(&request.path);
                for (name, value) in headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        debug!(status, bytes = body.len(), "received response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
