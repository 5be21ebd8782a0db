//! Rekor HTTP client.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use tracing::debug;

use super::LogRecordSource;
use crate::error::{VerifyError, VerifyResult};
use crate::types::{RekorConfig, RemoteLogRecord};

const USER_AGENT_VALUE: &str = concat!("dsse-verify/", env!("CARGO_PKG_VERSION"));

/// Read-only client for the Rekor log-entry API. One request per lookup, no retries.
#[derive(Debug, Clone)]
pub struct RekorClient {
    client: reqwest::Client,
    base_url: String,
}

impl RekorClient {
    pub fn new(config: RekorConfig) -> VerifyResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(default_headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| VerifyError::Config {
            message: format!("failed to create HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_env() -> VerifyResult<Self> {
        Self::new(RekorConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/v1/log/entries?logIndex=N`. A 404 means the log has no such entry.
    pub async fn get_log_entry(&self, log_index: u64) -> VerifyResult<Option<RemoteLogRecord>> {
        let url = format!("{}/api/v1/log/entries", self.base_url);
        debug!(url = %url, log_index, "fetching log entry");

        let response = self
            .client
            .get(&url)
            .query(&[("logIndex", log_index)])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(log_index, "log entry not found (404)");
                return Ok(None);
            }
            status if !status.is_success() => {
                return Err(VerifyError::Transport {
                    message: format!("log returned HTTP {} for index {}", status, log_index),
                });
            }
            _ => {}
        }

        let entries: HashMap<String, RemoteLogRecord> =
            response.json().await.map_err(|e| VerifyError::Transport {
                message: format!("failed to parse log entry response: {}", e),
            })?;

        Ok(select_record(entries, log_index))
    }
}

#[async_trait]
impl LogRecordSource for RekorClient {
    async fn fetch_record(&self, log_index: u64) -> VerifyResult<Option<RemoteLogRecord>> {
        self.get_log_entry(log_index).await
    }
}

/// Responses are keyed by entry UUID on public Rekor and by index in some mirrors.
fn select_record(
    mut entries: HashMap<String, RemoteLogRecord>,
    log_index: u64,
) -> Option<RemoteLogRecord> {
    if let Some(record) = entries.remove(&log_index.to_string()) {
        return Some(record);
    }
    if entries.len() == 1 {
        return entries.into_values().next();
    }
    None
}
