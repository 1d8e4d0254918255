//! HTTP fetching for traffic resources
//!
//! [`Fetcher`] turns a [`ResourceKind`] into a decoded [`Resource`] by
//! following the kind's descriptor. The network itself sits behind the
//! [`Transport`] trait so the fetch logic stays synchronous and testable;
//! [`ReqwestTransport`] is the real implementation.

use std::cell::Cell;
use std::time::Duration;

use serde::Deserialize;

use crate::config::{Credentials, GitHubConfig};
use crate::error::{Error, Result};

use super::model::{FetchStrategy, Release, Resource, ResourceKind};

/// API version pin sent with every request
pub const ACCEPT_V3: &str = "application/vnd.github.v3+json";

const USER_AGENT: &str = concat!("repulse/", env!("CARGO_PKG_VERSION"));

/// Longest error body echoed back in [`Error::Status`]
const MAX_ERROR_BODY: usize = 200;

/// A GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
}

impl HttpRequest {
    /// First header value with this name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and full body of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one blocking HTTP GET.
///
/// Implementations report network failures and timeouts as
/// [`Error::Transport`]; status codes are left for the caller to judge.
pub trait Transport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).get(request)
    }
}

/// [`Transport`] backed by an async `reqwest` client on a current-thread runtime
pub struct ReqwestTransport {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl ReqwestTransport {
    /// Create a transport with the configured per-request timeout
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Config(format!("failed to create runtime: {}", e)))?;

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, runtime })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let transport_error = |e: reqwest::Error| Error::Transport {
            url: request.url.clone(),
            message: if e.is_timeout() {
                format!("timed out: {}", e)
            } else {
                e.to_string()
            },
        };

        self.runtime.block_on(async {
            let mut builder = self.client.get(&request.url);
            for (name, value) in &request.headers {
                builder = builder.header(*name, value.as_str());
            }

            let response = builder.send().await.map_err(transport_error)?;
            let status = response.status().as_u16();
            let body = response.bytes().await.map_err(transport_error)?;

            Ok::<_, Error>(HttpResponse {
                status,
                body: body.to_vec(),
            })
        })
    }
}

/// Fetches and decodes resources for one repository
pub struct Fetcher<T> {
    transport: T,
    credentials: Credentials,
    api_url: String,
    max_pages: u32,
    requests: Cell<usize>,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, credentials: Credentials, config: &GitHubConfig) -> Self {
        Self {
            transport,
            credentials,
            api_url: config.api_url.clone(),
            max_pages: config.max_pages,
            requests: Cell::new(0),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Number of HTTP requests issued so far
    pub fn requests_made(&self) -> usize {
        self.requests.get()
    }

    /// Fetch and decode one resource kind.
    ///
    /// Any transport, status or decode failure is returned immediately.
    pub fn fetch(&self, kind: ResourceKind) -> Result<Resource> {
        let descriptor = kind.descriptor();
        let url = (descriptor.build_url)(
            &self.api_url,
            &self.credentials.owner,
            &self.credentials.repo,
        );

        tracing::debug!(kind = %kind, url = %url, "Fetching resource");

        match descriptor.strategy {
            FetchStrategy::Single { decode } => {
                let body = self.get(&url)?;
                decode(&body).map_err(|source| Error::Decode { kind, source })
            }
            FetchStrategy::Paginated {
                decode_page,
                assemble,
            } => {
                let releases = self.fetch_pages(kind, &url, decode_page)?;
                Ok(assemble(releases))
            }
        }
    }

    /// Request `page=1,2,...` until a page decodes to nothing
    fn fetch_pages(
        &self,
        kind: ResourceKind,
        base_url: &str,
        decode_page: fn(&[u8]) -> serde_json::Result<Vec<Release>>,
    ) -> Result<Vec<Release>> {
        let mut releases = Vec::new();

        for page in 1..=self.max_pages {
            let url = format!("{}&page={}", base_url, page);
            let body = self.get(&url)?;
            let page_releases =
                decode_page(&body).map_err(|source| Error::Decode { kind, source })?;

            tracing::debug!(kind = %kind, page, count = page_releases.len(), "Fetched page");

            if page_releases.is_empty() {
                tracing::info!(kind = %kind, releases = releases.len(), pages = page, "Pagination complete");
                return Ok(releases);
            }
            releases.extend(page_releases);
        }

        Err(Error::PageLimit {
            kind,
            limit: self.max_pages,
        })
    }

    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let request = HttpRequest {
            url: url.to_string(),
            headers: vec![
                ("Authorization", format!("token {}", self.credentials.token)),
                ("Accept", ACCEPT_V3.to_string()),
            ],
        };

        self.requests.set(self.requests.get() + 1);
        let response = self.transport.get(&request)?;

        if !response.is_success() {
            return Err(Error::Status {
                url: request.url,
                status: response.status,
                message: error_message(&response.body),
            });
        }

        Ok(response.body)
    }
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// GitHub's `{"message": ...}` if present, else the start of the raw body
fn error_message(body: &[u8]) -> String {
    if let Ok(error) = serde_json::from_slice::<ApiError>(body) {
        return error.message;
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.chars().count() > MAX_ERROR_BODY {
        let truncated: String = text.chars().take(MAX_ERROR_BODY).collect();
        format!("{}...", truncated)
    } else if text.is_empty() {
        "empty response body".to_string()
    } else {
        text.to_string()
    }
}
