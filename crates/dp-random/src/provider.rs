//! Randomness Provider
//!
//! Client side of the "give me N unique random integers in [0, max)" contract
//! served by the randomness proxy:
//!
//! ```text
//! POST {endpoint}   {"count": 3, "max": 3}
//! 200 OK            {"data": [2, 0, 1], "requestsLeft": 998}
//! ```
//!
//! Any non-2xx status or unreadable body counts as the provider being
//! unavailable. Requests outside the provider's batch limits are rejected
//! before anything goes on the wire.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RandomError;

/// Largest batch the provider accepts in one request
pub const MAX_PROVIDER_BATCH: usize = 10_000;

// ═══════════════════════════════════════════════════════════════════════════════
// REQUEST / RESPONSE
// ═══════════════════════════════════════════════════════════════════════════════

/// Validated request for `count` unique integers from `[0, max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderRequest {
    count: usize,
    max: usize,
}

impl ProviderRequest {
    pub fn new(count: usize, max: usize) -> Result<Self, RandomError> {
        if count < 1 || max < 1 {
            return Err(RandomError::InvalidParameters(format!(
                "count and max must be positive (count={count}, max={max})"
            )));
        }
        if count > max {
            return Err(RandomError::InvalidParameters(format!(
                "count {count} exceeds range size {max}"
            )));
        }
        if count > MAX_PROVIDER_BATCH {
            return Err(RandomError::InvalidParameters(format!(
                "count {count} exceeds provider batch limit {MAX_PROVIDER_BATCH}"
            )));
        }
        Ok(Self { count, max })
    }

    /// Request for a full permutation of `len` positions
    pub fn permutation(len: usize) -> Result<Self, RandomError> {
        Self::new(len, len)
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

/// Wire shape of a successful provider response
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderResponse {
    pub data: Vec<i64>,
    #[serde(rename = "requestsLeft", default)]
    pub requests_left: Option<i64>,
}

/// Checked provider output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderBatch {
    pub indices: Vec<usize>,
    /// Provider quota hint, when reported
    pub requests_left: Option<i64>,
}

impl ProviderBatch {
    /// Check a raw response against the request: exact length, in range, no repeats
    pub fn from_response(request: &ProviderRequest, response: ProviderResponse) -> Result<Self, RandomError> {
        if response.data.len() != request.count {
            return Err(RandomError::ProviderUnavailable(format!(
                "malformed response: expected {} integers, got {}",
                request.count,
                response.data.len()
            )));
        }

        let mut seen = HashSet::with_capacity(request.count);
        let mut indices = Vec::with_capacity(request.count);
        for value in response.data {
            let index = usize::try_from(value)
                .ok()
                .filter(|&i| i < request.max)
                .ok_or_else(|| {
                    RandomError::ProviderUnavailable(format!(
                        "malformed response: {} outside [0, {})",
                        value, request.max
                    ))
                })?;
            if !seen.insert(index) {
                return Err(RandomError::ProviderUnavailable(format!(
                    "malformed response: duplicate index {index}"
                )));
            }
            indices.push(index);
        }

        Ok(Self {
            indices,
            requests_left: response.requests_left,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROVIDER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// External true-random source
#[async_trait]
pub trait RandomProvider: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Draw `request.count()` unique integers from `[0, request.max())`
    async fn unique_indices(&self, request: ProviderRequest) -> Result<ProviderBatch, RandomError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// HTTP PROVIDER
// ═══════════════════════════════════════════════════════════════════════════════

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Consult the provider at all
    pub enabled: bool,
    /// Proxy endpoint URL
    pub endpoint: String,
    /// Transport timeout (ms); a timed-out request falls back locally
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://127.0.0.1:3000/api/random".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Randomness proxy reached over HTTP
pub struct HttpRandomProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRandomProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, RandomError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| RandomError::ProviderUnavailable(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RandomProvider for HttpRandomProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn unique_indices(&self, request: ProviderRequest) -> Result<ProviderBatch, RandomError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| RandomError::ProviderUnavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(RandomError::ProviderUnavailable(format!("status {status}: {detail}")));
        }

        let body: ProviderResponse = response
            .json()
            .await
            .map_err(|e| RandomError::ProviderUnavailable(format!("malformed response: {e}")))?;

        let batch = ProviderBatch::from_response(&request, body)?;
        if let Some(left) = batch.requests_left {
            log::debug!("[RandomSource] Provider quota: {} requests left", left);
        }
        Ok(batch)
    }
}
