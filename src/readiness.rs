use crate::types::{EvalError, Result};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

/// Polls a service's probe endpoint until it answers HTTP 200 or a deadline
/// elapses. Connection errors and non-200 statuses are both "not yet ready".
pub struct ReadinessGate {
    client: Client,
    poll_interval: Duration,
    probe_timeout: Duration,
}

impl ReadinessGate {
    pub fn new(client: Client, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
            probe_timeout: Duration::from_secs(2),
        }
    }

    /// Wait until `http://{address}{probe_path}` answers 200.
    ///
    /// With `timeout: None` this waits forever — acceptable for an offline
    /// batch job, but callers should supply a bound; a misconfigured
    /// dependency will otherwise hang the run.
    pub async fn wait_ready(
        &self,
        address: &str,
        probe_path: &str,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let url = Url::parse(&format!("http://{}{}", address, probe_path))?;
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match self
                .client
                .get(url.clone())
                .timeout(self.probe_timeout)
                .send()
                .await
            {
                Ok(response) if response.status() == StatusCode::OK => {
                    info!("{} ready after {} probes", address, attempts);
                    return Ok(());
                }
                Ok(response) => {
                    debug!("probe {} returned {}", url, response.status());
                }
                Err(e) => {
                    debug!("probe {} failed: {}", url, e);
                }
            }

            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    return Err(EvalError::ReadinessTimeout {
                        waited: started.elapsed(),
                    });
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
