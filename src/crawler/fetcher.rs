//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests for record pages and JSON APIs
//! - Error classification into timeout, status, and transport failures
//!
//! Nothing here retries: a failed request aborts the pipeline run, which
//! writes its snapshot so the next invocation resumes where this one stopped.

use crate::config::UserAgentConfig;
use crate::HarvestError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use genealogy_harvest::config::UserAgentConfig;
/// use genealogy_harvest::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns its body as text
pub async fn fetch_text(client: &Client, url: &str) -> Result<String, HarvestError> {
    let response = send(client, url).await?;
    response.text().await.map_err(|e| classify(url, e))
}

/// Fetches a URL and decodes its body as JSON
pub async fn fetch_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, HarvestError> {
    let response = send(client, url).await?;
    let body = response.bytes().await.map_err(|e| classify(url, e))?;
    serde_json::from_slice(&body).map_err(|e| HarvestError::MalformedResponse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

async fn send(client: &Client, url: &str) -> Result<reqwest::Response, HarvestError> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/html, application/json;q=0.9, */*;q=0.8")
        .send()
        .await
        .map_err(|e| classify(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(HarvestError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response)
}

/// Maps a transport error onto the crate error taxonomy
fn classify(url: &str, error: reqwest::Error) -> HarvestError {
    if error.is_timeout() {
        HarvestError::Timeout {
            url: url.to_string(),
        }
    } else {
        HarvestError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
