//! Rate-limited, retrying Coinglass REST client.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

use super::envelope::{self, raw_snapshot};
use super::error::{CoinglassError, EnvelopeFailure};
use super::rate_limit::RateLimiter;
use super::retry::{AttemptFailure, RetryPolicy};
use super::transport::{HttpTransport, OutboundRequest, ReqwestTransport};
use crate::config::ClientConfig;

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "CG-API-KEY";

/// Query parameters for a request. Absent values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

/// Coinglass API client.
///
/// One instance should be shared (behind an `Arc`) by everything in the
/// process: the rate limiter lives inside it, so separate instances keep
/// separate cadences.
pub struct CoinglassClient {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl CoinglassClient {
    /// Create a client using `reqwest` and the default retry policy.
    pub fn new(config: ClientConfig) -> Result<Self, CoinglassError> {
        let transport = ReqwestTransport::new()
            .map_err(|e| CoinglassError::config(format!("{e:#}")))?;
        Ok(Self::with_transport(
            config,
            Arc::new(transport),
            RetryPolicy::default(),
        ))
    }

    /// Create a client over an arbitrary transport and retry policy.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        retry: RetryPolicy,
    ) -> Self {
        let limiter = RateLimiter::new(config.min_request_interval());
        Self {
            config,
            transport,
            limiter,
            retry,
        }
    }

    fn build_request(&self, path: &str, query: &Query) -> OutboundRequest {
        OutboundRequest {
            url: format!("{}{}", self.config.base_url(), path),
            query: query.pairs().to_vec(),
            headers: vec![
                ("accept", "application/json".to_string()),
                ("content-type", "application/json".to_string()),
                (API_KEY_HEADER, self.config.api_key().to_string()),
            ],
            timeout: self.config.request_timeout(),
        }
    }

    /// GET `path` and return the parsed JSON body.
    ///
    /// Every attempt waits for the shared rate limiter. Qualifying failures
    /// are retried per the injected [`RetryPolicy`]; the last failure is
    /// returned once retries run out.
    #[instrument(skip(self, query), fields(endpoint = %path))]
    pub async fn fetch(&self, path: &str, query: &Query) -> Result<Value, CoinglassError> {
        let request = self.build_request(path, query);
        let mut retry_number = 0;

        loop {
            self.limiter.acquire().await;
            debug!(attempt = retry_number + 1, "Dispatching Coinglass request");

            let failure = match self.transport.get(&request).await {
                Ok(response) if response.is_success() => {
                    return parse_body(path, &response.body);
                }
                Ok(response) => {
                    match response.status {
                        401 => error!(endpoint = path, "Unauthorized: invalid COINGLASS_API_KEY"),
                        429 => warn!(
                            endpoint = path,
                            "Coinglass rate limit hit; retrying/backing off"
                        ),
                        _ => {}
                    }
                    AttemptFailure::Status {
                        status: response.status,
                        body: response.body,
                    }
                }
                Err(failure) => AttemptFailure::Transport(failure),
            };

            if retry_number < self.retry.max_retries() && self.retry.should_retry(&failure) {
                retry_number += 1;
                let delay = self.retry.backoff(retry_number);
                debug!(
                    retry = retry_number,
                    delay_ms = delay.as_millis() as u64,
                    failure = ?failure,
                    "Retrying Coinglass request"
                );
                sleep(delay).await;
                continue;
            }

            return Err(into_error(path, failure));
        }
    }

    /// GET `path` and unwrap the envelope into `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
    ) -> Result<T, CoinglassError> {
        let raw = self.fetch(path, query).await?;
        envelope::unwrap(raw, path)
    }
}

fn parse_body(path: &str, body: &str) -> Result<Value, CoinglassError> {
    serde_json::from_str(body).map_err(|e| CoinglassError::Envelope {
        endpoint: path.to_string(),
        reason: EnvelopeFailure::NotJson(e.to_string()),
        upstream_message: None,
        raw: raw_snapshot(body),
    })
}

fn into_error(path: &str, failure: AttemptFailure) -> CoinglassError {
    match failure {
        AttemptFailure::Transport(source) => CoinglassError::Transport {
            endpoint: path.to_string(),
            source,
        },
        AttemptFailure::Status { status, body } => CoinglassError::HttpStatus {
            endpoint: path.to_string(),
            status,
            body,
        },
    }
}
