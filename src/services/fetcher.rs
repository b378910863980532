// src/services/fetcher.rs

//! HTTP fetcher with a per-failure-class retry policy.
//!
//! A fetch resolves to the page text or a permanent failure; transient
//! failures never surface to the caller. Two failure classes retry
//! indefinitely with fixed delays:
//!
//! - connection-level errors (DNS, connect, transport): short delay
//! - HTTP 403 (rate-limit or defensive block): long delay
//!
//! Every other non-2xx status is permanent within the run, 5xx
//! included; the cache-existence gate lets a later run retry those
//! words. There is no attempt cap and no request timeout, so a fetch
//! can block its worker for as long as the server keeps failing.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::sync::watch;

use crate::models::RetryConfig;

/// Resolution of a single logical fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx response body
    Success(String),

    /// Non-retryable response; the unit of work should be skipped.
    /// No status is available when the request could not be built.
    Permanent { status: Option<u16> },

    /// Shutdown was signaled while retrying
    Cancelled,
}

/// Fixed delays per retryable failure class. Attempts are unbounded.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub connect_delay: Duration,
    pub throttle_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            connect_delay: Duration::from_millis(config.connect_delay_ms),
            throttle_delay: Duration::from_millis(config.throttle_delay_ms),
        }
    }

    /// Zero-delay policy for tests.
    pub fn immediate() -> Self {
        Self {
            connect_delay: Duration::ZERO,
            throttle_delay: Duration::ZERO,
        }
    }
}

/// Performs logical GETs, absorbing transient failures.
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
    shutdown: watch::Receiver<bool>,
}

impl Fetcher {
    pub fn new(client: Client, policy: RetryPolicy, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            client,
            policy,
            shutdown,
        }
    }

    /// Fetch a URL, retrying transient failures until the request
    /// resolves, shutdown is signaled, or a permanent failure occurs.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        loop {
            if *self.shutdown.borrow() {
                return FetchOutcome::Cancelled;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        match response.text().await {
                            Ok(text) => return FetchOutcome::Success(text),
                            Err(e) => {
                                log::warn!("failed reading body of {url}: {e}");
                                if !self.wait(self.policy.connect_delay).await {
                                    return FetchOutcome::Cancelled;
                                }
                            }
                        }
                    } else if status == StatusCode::FORBIDDEN {
                        log::warn!("throttled ({status}) for {url}, backing off");
                        if !self.wait(self.policy.throttle_delay).await {
                            return FetchOutcome::Cancelled;
                        }
                    } else {
                        log::warn!("permanent failure {status} for {url}");
                        return FetchOutcome::Permanent {
                            status: Some(status.as_u16()),
                        };
                    }
                }
                Err(e) if e.is_builder() => {
                    log::error!("unbuildable request for {url}: {e}");
                    return FetchOutcome::Permanent { status: None };
                }
                Err(e) => {
                    log::warn!("connection failure for {url}: {e}");
                    if !self.wait(self.policy.connect_delay).await {
                        return FetchOutcome::Cancelled;
                    }
                }
            }
        }
    }

    /// Sleep between attempts; returns false if shutdown arrived first.
    async fn wait(&self, delay: Duration) -> bool {
        let mut shutdown = self.shutdown.clone();
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // Sender gone: no signal can ever arrive
                        sleep.as_mut().await;
                        return true;
                    }
                    if *shutdown.borrow() {
                        return false;
                    }
                }
            }
        }
    }
}
