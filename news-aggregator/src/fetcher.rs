use crate::types::{AggregatorError, FetchConfig, Result, FEED_ACCEPT};
use backoff::{backoff::Backoff, ExponentialBackoff, ExponentialBackoffBuilder};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// HTTP side of feed retrieval: one GET per call, bounded by the configured
/// timeout, retried only when `max_retries > 0`.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>> {
        self.fetch_feed_as(url, None).await
    }

    /// Same as [`Fetcher::fetch_feed`] but with a per-call User-Agent, for
    /// hosts that insist on a descriptive one.
    pub async fn fetch_feed_as(&self, url: &str, user_agent: Option<&str>) -> Result<Vec<u8>> {
        let start_time = Instant::now();
        let mut backoff = self.backoff();
        let mut attempt = 0;

        loop {
            match self.fetch_once(url, user_agent).await {
                Ok(body) => {
                    info!(
                        "Fetched {} ({} bytes in {}ms)",
                        url,
                        body.len(),
                        start_time.elapsed().as_millis()
                    );
                    return Ok(body);
                }
                Err(e) => {
                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            attempt += 1;
                            warn!("Attempt {} failed for {}, retrying in {:?}: {}", attempt, url, delay, e);
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn fetch_once(&self, url: &str, user_agent: Option<&str>) -> Result<Vec<u8>> {
        debug!("GET {}", url);

        let mut request = self.client.get(url).header(ACCEPT, FEED_ACCEPT);
        if let Some(agent) = user_agent {
            request = request.header(USER_AGENT, agent);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AggregatorError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    fn backoff(&self) -> ExponentialBackoff {
        let initial = Duration::from_millis(self.config.retry_delay_millis);
        ExponentialBackoffBuilder::new()
            .with_initial_interval(initial)
            .with_multiplier(2.0)
            .with_max_interval(initial * 32)
            .with_max_elapsed_time(Some(Duration::from_secs(self.config.timeout_seconds * 4)))
            .build()
    }
}
