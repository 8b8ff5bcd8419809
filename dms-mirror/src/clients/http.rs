//! HTTP plumbing shared by the remote clients

use dms_mirror_common::ClientError;
use futures::StreamExt;
use reqwest::{RequestBuilder, Response, Url};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use super::ByteSink;

pub const USER_AGENT: &str = concat!("dms-mirror/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Optional basic-auth credentials
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub user: String,
    pub password: Option<String>,
}

impl Credentials {
    pub fn from_parts(user: Option<String>, password: Option<String>) -> Option<Self> {
        user.filter(|u| !u.is_empty())
            .map(|user| Self { user, password })
    }
}

pub fn parse_url(raw: &str) -> Result<Url, ClientError> {
    Url::parse(raw).map_err(|e| ClientError::Parse(format!("Invalid URL [{}]: {}", raw, e)))
}

pub fn required_url(label: &str, raw: Option<&str>) -> Result<Url, ClientError> {
    match raw.filter(|r| !r.is_empty()) {
        Some(raw) => parse_url(raw),
        None => Err(ClientError::MissingField(format!("{} is not configured", label))),
    }
}

/// Append path segments to `root`, percent-encoding each one
pub fn endpoint(root: &Url, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = root.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::Parse(format!("URL cannot be a base: [{}]", root)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Append a slash-separated relative path to `root` without re-encoding it
pub fn join_path(root: &Url, path: &str) -> Result<Url, ClientError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    endpoint(root, &segments)
}

/// Client keeping a connection pool
pub fn pooled_client() -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| ClientError::Connection(e.to_string()))
}

/// Client whose connections are closed after every call
pub fn oneshot_client() -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .pool_max_idle_per_host(0)
        .build()
        .map_err(|e| ClientError::Connection(e.to_string()))
}

pub fn with_basic_auth(request: RequestBuilder, credentials: Option<&Credentials>) -> RequestBuilder {
    match credentials {
        Some(c) => request.basic_auth(&c.user, c.password.as_deref()),
        None => request,
    }
}

pub fn transport_error(err: reqwest::Error) -> ClientError {
    if err.is_decode() {
        ClientError::Parse(err.to_string())
    } else {
        ClientError::Connection(err.to_string())
    }
}

/// Send a request, turning transport failures and non-success statuses into errors
pub async fn send(request: RequestBuilder) -> Result<Response, ClientError> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();

    if !status.is_success() {
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        let message = if body.is_empty() { url } else { format!("{}: {}", url, body) };
        return Err(ClientError::from_status(status.as_u16(), message));
    }

    Ok(response)
}

pub async fn send_json<T: serde::de::DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let response = send(request).await?;
    response
        .json()
        .await
        .map_err(|e| ClientError::Parse(e.to_string()))
}

/// Stream a response body into `sink`, returning the number of bytes written
pub async fn stream_into(response: Response, sink: &mut ByteSink<'_>) -> Result<u64, ClientError> {
    let mut written = 0u64;
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(transport_error)?;
        sink.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    sink.flush().await?;
    Ok(written)
}
