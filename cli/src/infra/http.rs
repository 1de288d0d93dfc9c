//! HTTP infrastructure — implements the `HttpClient` port with `ureq`.

use std::io::Read as _;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::application::ports::HttpClient;
use crate::domain::encoding::redact_url;

/// Overall timeout for a single transfer.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Blocking `ureq` agent driven from `spawn_blocking`.
#[derive(Clone)]
pub struct UreqHttpClient {
    agent: ureq::Agent,
}

impl UreqHttpClient {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("extcheck/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl Default for UreqHttpClient {
    fn default() -> Self {
        Self::new(HTTP_TIMEOUT)
    }
}

/// Read at most `limit` bytes; more than that is an error, not a truncation.
fn read_limited(reader: impl std::io::Read, limit: u64) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut data)
        .context("reading response body")?;
    anyhow::ensure!(
        data.len() as u64 <= limit,
        "response body exceeds the {limit} byte limit"
    );
    Ok(data)
}

/// `ureq` errors print the full URL; keep the query string out of messages.
fn redacted_error(method: &str, url: &str, err: ureq::Error) -> anyhow::Error {
    let redacted = redact_url(url);
    match err {
        ureq::Error::Status(code, response) => {
            anyhow::anyhow!("{method} {redacted}: status code {code} {}", response.status_text())
        }
        ureq::Error::Transport(t) => match t.message() {
            Some(msg) => anyhow::anyhow!("{method} {redacted}: {}: {msg}", t.kind()),
            None => anyhow::anyhow!("{method} {redacted}: {}", t.kind()),
        },
    }
}

fn fetch_sync(agent: &ureq::Agent, url: &str, limit: u64) -> Result<Vec<u8>> {
    let redacted = redact_url(url);
    let response = agent
        .get(url)
        .call()
        .map_err(|e| redacted_error("GET", url, e))?;
    if let Some(len) = response
        .header("Content-Length")
        .and_then(|v| v.parse::<u64>().ok())
    {
        anyhow::ensure!(
            len <= limit,
            "GET {redacted}: content length {len} exceeds the {limit} byte limit"
        );
    }
    read_limited(response.into_reader(), limit).with_context(|| format!("GET {redacted}"))
}

fn put_sync(agent: &ureq::Agent, url: &str, headers: &[(String, String)], body: &[u8]) -> Result<()> {
    let mut request = agent.put(url);
    for (name, value) in headers {
        request = request.set(name, value);
    }
    request
        .send_bytes(body)
        .map_err(|e| redacted_error("PUT", url, e))?;
    Ok(())
}

impl HttpClient for UreqHttpClient {
    async fn fetch(&self, url: &str, limit_bytes: u64) -> Result<Vec<u8>> {
        debug!(url = %redact_url(url), limit_bytes, "fetching");
        let agent = self.agent.clone();
        let url = url.to_owned();
        tokio::task::spawn_blocking(move || fetch_sync(&agent, &url, limit_bytes))
            .await
            .context("spawn_blocking for HTTP GET")?
    }

    async fn put(&self, url: &str, headers: &[(&str, &str)], body: Vec<u8>) -> Result<()> {
        debug!(url = %redact_url(url), bytes = body.len(), "uploading");
        let agent = self.agent.clone();
        let url = url.to_owned();
        let headers: Vec<(String, String)> = headers
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        tokio::task::spawn_blocking(move || put_sync(&agent, &url, &headers, &body))
            .await
            .context("spawn_blocking for HTTP PUT")?
    }
}
