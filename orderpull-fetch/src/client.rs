//! Fetch worker: one authenticated request per order, classified into a
//! [`FetchOutcome`].

use std::io::Read;

use orderpull_core::{Credentials, FetchConfig, FetchOutcome, OrderId};

use crate::error::ClientError;
use crate::query::fetch_order_request;

/// Longest response excerpt kept for diagnostics.
pub const SNIPPET_LIMIT: usize = 500;

/// Upper bound on a response body read into memory.
const MAX_BODY_BYTES: u64 = 32 * 1024 * 1024;

/// A single-attempt order lookup.
///
/// Implementations block the calling thread for the duration of the request;
/// callers on an async runtime should use a blocking pool. Retries, pacing and
/// concurrency limits are the caller's concern.
pub trait OrderTransport: Send + Sync {
    fn fetch(&self, id: &OrderId) -> FetchOutcome;
}

/// Blocking client for the Atlas GraphQL order endpoint.
pub struct AtlasClient {
    agent: ureq::Agent,
    api_url: String,
    origin: String,
    credentials: Credentials,
}

impl AtlasClient {
    pub fn new(config: &FetchConfig, credentials: Credentials) -> Result<Self, ClientError> {
        config.validate()?;
        if let Some(token) = credentials.token() {
            check_header_value("authorization", token)?;
        }
        if let Some(cookie) = credentials.cookie() {
            check_header_value("cookie", cookie)?;
        }
        check_header_value("origin", &config.origin)?;

        let agent = ureq::AgentBuilder::new()
            .timeout(config.request_timeout)
            .user_agent(concat!("orderpull/", env!("CARGO_PKG_VERSION")))
            .build();

        Ok(Self {
            agent,
            api_url: config.api_url.clone(),
            origin: config.origin.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn request(&self) -> ureq::Request {
        let mut req = self
            .agent
            .post(&self.api_url)
            .set("accept", "*/*")
            .set("accept-language", "en-US,en;q=0.9")
            .set("content-type", "application/json")
            .set("origin", &self.origin)
            .set("referer", &format!("{}/", self.origin))
            .set("user-access", "true");
        if let Some(auth) = self.credentials.authorization_header() {
            req = req.set("authorization", &auth);
        }
        if let Some(cookie) = self.credentials.cookie() {
            req = req.set("cookie", cookie);
        }
        req
    }
}

impl OrderTransport for AtlasClient {
    fn fetch(&self, id: &OrderId) -> FetchOutcome {
        tracing::debug!(order_id = %id, url = %self.api_url, "sending order request");

        let response = match self.request().send_json(fetch_order_request(id)) {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return FetchOutcome::Transient {
                    reason: transport.to_string(),
                };
            }
        };

        let status = response.status();
        classify_read(status, read_body(response))
    }
}

fn read_body(response: ureq::Response) -> std::io::Result<Vec<u8>> {
    let mut body = Vec::new();
    response
        .into_reader()
        .take(MAX_BODY_BYTES)
        .read_to_end(&mut body)?;
    Ok(body)
}

/// Classify once the body has been read, or failed to read.
///
/// The status decides first. Only a 2xx needs a usable body: a read error
/// there is `Transient` and non-UTF-8 bytes are `Other`. Every other status
/// keeps its class whatever happened to the body.
pub fn classify_read(status: u16, body: std::io::Result<Vec<u8>>) -> FetchOutcome {
    let is_success = (200..=299).contains(&status);
    match body {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => classify(status, text),
            Err(err) if is_success => FetchOutcome::Other {
                status: Some(status),
                snippet: format!(
                    "non-UTF-8 body: {}",
                    snippet(&String::from_utf8_lossy(err.as_bytes()))
                ),
            },
            Err(err) => classify(status, String::from_utf8_lossy(err.as_bytes()).into_owned()),
        },
        Err(err) if is_success => FetchOutcome::Transient {
            reason: format!("HTTP {status}: failed to read body: {err}"),
        },
        Err(err) => {
            tracing::debug!(status, error = %err, "failed to read error response body");
            classify(status, String::new())
        }
    }
}

/// Map a completed HTTP exchange onto a [`FetchOutcome`].
///
/// | status            | outcome                                   |
/// |-------------------|-------------------------------------------|
/// | 2xx, JSON body    | `Success` with the body verbatim          |
/// | 2xx, other body   | `Other`                                   |
/// | 401, 403          | `AuthError`                               |
/// | 404               | `NotFound`                                |
/// | 5xx               | `Transient`                               |
/// | anything else     | `Other`                                   |
pub fn classify(status: u16, body: String) -> FetchOutcome {
    match status {
        200..=299 => match serde_json::from_str::<serde::de::IgnoredAny>(&body) {
            Ok(_) => FetchOutcome::Success { body },
            Err(err) => FetchOutcome::Other {
                status: Some(status),
                snippet: format!("unparseable JSON ({err}): {}", snippet(&body)),
            },
        },
        401 | 403 => FetchOutcome::AuthError { status },
        404 => FetchOutcome::NotFound,
        500..=599 => FetchOutcome::Transient {
            reason: format!("HTTP {status}: {}", snippet(&body)),
        },
        _ => FetchOutcome::Other {
            status: Some(status),
            snippet: snippet(&body).to_string(),
        },
    }
}

/// First [`SNIPPET_LIMIT`] characters of `body`, cut on a char boundary.
pub fn snippet(body: &str) -> &str {
    match body.char_indices().nth(SNIPPET_LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

fn check_header_value(name: &'static str, value: &str) -> Result<(), ClientError> {
    if value.chars().any(|c| c.is_control() && c != '\t') {
        return Err(ClientError::InvalidHeader { name });
    }
    Ok(())
}
