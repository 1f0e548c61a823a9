//! Request pacing and retry shared by the remote clients.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, warn};

use super::GatewayError;
use crate::config::GatewayConfig;

/// Bounded retries with a delay that grows with the attempt index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.retry_base_delay_ms),
        )
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Keeps consecutive requests at least `interval` apart.
#[derive(Debug, Clone)]
pub struct Pacer {
    interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Wait until the next request is allowed, then claim the slot.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.interval {
                let wait_time = self.interval - elapsed;
                debug!("Pacing: waiting {:?}", wait_time);
                sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// HTTP GET with pacing and retries, shared by both remote clients.
pub(super) struct HttpFetcher {
    client: Client,
    pacer: Pacer,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub(super) fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .build()
            .map_err(GatewayError::Client)?;

        Ok(Self {
            client,
            pacer: Pacer::new(config.pacing()),
            retry: RetryPolicy::from_config(config),
        })
    }

    /// Fetch the full body of `url`. Transport errors and non-2xx statuses are
    /// retried; the first complete 2xx body is returned immediately.
    pub(super) async fn get_bytes(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Bytes, GatewayError> {
        let mut attempt = 0;

        loop {
            self.pacer.wait().await;
            attempt += 1;

            let last_error = match self.try_get(url, query).await {
                Ok(body) => return Ok(body),
                Err(reason) => reason,
            };

            if attempt >= self.retry.max_attempts() {
                error!("{}: {}, too many retries", url, last_error);
                return Err(GatewayError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    last_error,
                });
            }

            let delay = self.retry.delay_for_attempt(attempt);
            warn!(
                "{}: {}, {} retry in {:?}",
                url,
                last_error,
                ordinal(attempt),
                delay
            );
            sleep(delay).await;
        }
    }

    async fn try_get(&self, url: &str, query: &[(&str, &str)]) -> Result<Bytes, String> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| format!("request failed ({})", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP status code {}", status.as_u16()));
        }

        response
            .bytes()
            .await
            .map_err(|e| format!("body read failed ({})", e))
    }
}

/// `1st`, `2nd`, `3rd`, `4th`, ..., `11th`, `21st`.
fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
