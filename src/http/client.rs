use reqwest::header::{HeaderName, HeaderValue};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

use super::request::OutboundRequest;
use super::response::HttpResponse;

/// Failure to obtain any HTTP response at all.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
    #[error("Invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Invalid header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("Request failed: {0}")]
    Send(String),
    #[error("Failed to read response: {0}")]
    Read(String),
}

pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + 'a>>;

/// Sends one request to the SUT. Any HTTP status is a response; only
/// network-level problems are errors.
pub trait HttpTransport: Send + Sync {
    fn send<'a>(&'a self, request: &'a OutboundRequest) -> TransportFuture<'a>;
}

/// `reqwest`-backed transport sharing one connection pool across the run.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send<'a>(&'a self, request: &'a OutboundRequest) -> TransportFuture<'a> {
        Box::pin(send_request(&self.client, request))
    }
}

async fn send_request(
    client: &reqwest::Client,
    request: &OutboundRequest,
) -> Result<HttpResponse, TransportError> {
    let method: reqwest::Method = request.method.into();
    let mut url = reqwest::Url::parse(&request.url).map_err(|e| TransportError::InvalidUrl {
        url: request.url.clone(),
        reason: e.to_string(),
    })?;

    if !request.query.is_empty() {
        let mut query_pairs = url.query_pairs_mut();
        for (key, value) in &request.query {
            query_pairs.append_pair(key, value);
        }
    }

    let mut req_builder = client.request(method, url);
    req_builder = apply_headers(req_builder, &request.headers)?;

    if let Some(body) = &request.body {
        req_builder = req_builder.json(body);
    }

    let response = req_builder
        .send()
        .await
        .map_err(|e| TransportError::Send(e.to_string()))?;
    let status = response.status().as_u16();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| TransportError::Read(e.to_string()))?;

    Ok(HttpResponse {
        status,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

fn apply_headers(
    mut req_builder: reqwest::RequestBuilder,
    headers: &[(String, String)],
) -> Result<reqwest::RequestBuilder, TransportError> {
    for (key, value) in headers {
        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        let header_name =
            HeaderName::from_bytes(key.as_bytes()).map_err(|e| TransportError::InvalidHeader {
                name: key.to_string(),
                reason: e.to_string(),
            })?;
        let header_value =
            HeaderValue::from_str(value.trim()).map_err(|e| TransportError::InvalidHeader {
                name: key.to_string(),
                reason: e.to_string(),
            })?;
        req_builder = req_builder.header(header_name, header_value);
    }

    Ok(req_builder)
}
