//! Data providers: fetch a job's raw items over HTTP.
//!
//! | Provider     | Response shape                          | Items            |
//! |--------------|-----------------------------------------|------------------|
//! | `kosis`      | top-level array of flat records         | the array        |
//! | `data_go_kr` | nested envelope (`response.body.items`) | via `item_path`  |
//!
//! Request building and response decoding are plain functions; only
//! [`HttpFetcher`] touches the network.

pub mod data_go_kr;
pub mod kosis;

use serde_json::Value;
use std::time::Duration;

use crate::config::Settings;
use crate::error::{FetchError, FetchResult};
use crate::jobs::JobSpec;
use crate::logs::log_warning;

/// Delay between retries in milliseconds
const RETRY_DELAY_MS: u64 = 1000;

/// Characters of a response body quoted in logs and errors
pub const BODY_HEAD_LEN: usize = 500;

/// Supported data sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Korean Statistical Information Service
    Kosis,
    /// Public data portal (apis.data.go.kr)
    DataGoKr,
}

impl Provider {
    /// Provider for a job's `provider` field; absent means KOSIS.
    pub fn parse(name: Option<&str>) -> Option<Self> {
        match name.map(str::trim) {
            None | Some("kosis") => Some(Provider::Kosis),
            Some("data_go_kr") => Some(Provider::DataGoKr),
            Some(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Kosis => "kosis",
            Provider::DataGoKr => "data_go_kr",
        }
    }
}

/// A received HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// GET client with timeout and retries.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_retries: u32,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64, max_retries: u32) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        Ok(Self {
            client,
            max_retries: max_retries.max(1),
        })
    }

    pub fn from_settings(settings: &Settings) -> FetchResult<Self> {
        Self::new(settings.timeout_secs, settings.max_retries)
    }

    /// GET `url` with query `params`, retrying transport errors and 5xx.
    pub async fn get(&self, url: &str, params: &[(String, String)]) -> FetchResult<HttpResponse> {
        let mut attempt = 1;
        loop {
            match self.try_get(url, params).await {
                Ok(response) => return Ok(response),
                Err(e) if is_retryable(&e) && attempt < self.max_retries => {
                    log_warning(format!(
                        "Attempt {}/{} failed: {}",
                        attempt, self.max_retries, e
                    ));
                    tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_get(&self, url: &str, params: &[(String, String)]) -> FetchResult<HttpResponse> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body_head(&body),
            });
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

fn is_retryable(err: &FetchError) -> bool {
    match err {
        FetchError::Http(_) => true,
        FetchError::Status { status, .. } => *status >= 500,
        _ => false,
    }
}

/// First [`BODY_HEAD_LEN`] characters of a body.
pub fn body_head(body: &str) -> String {
    body.chars().take(BODY_HEAD_LEN).collect()
}

/// Fetch a job's items from its provider.
pub async fn fetch_items(
    job: &JobSpec,
    provider: Provider,
    settings: &Settings,
    fetcher: &HttpFetcher,
) -> FetchResult<Vec<Value>> {
    match provider {
        Provider::Kosis => kosis::fetch(job, settings, fetcher).await,
        Provider::DataGoKr => data_go_kr::fetch(job, settings, fetcher).await,
    }
}
