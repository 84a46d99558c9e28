use crate::config::EvalConfig;
use crate::episode::EpisodeRunner;
use crate::limiter::ConcurrencyLimiter;
use crate::readiness::ReadinessGate;
use crate::sampler::TaskSampler;
use crate::traits::{ServiceBackend, ServiceHandle};
use crate::types::{BatchReport, EpisodeRequest, EpisodeResult, NetworkMode, Result};
use futures::future::join_all;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Drives one evaluation run end to end: service lifecycle, readiness,
/// sampling, concurrent dispatch, aggregation. Every service started gets
/// stopped exactly once, on every exit path.
pub struct BatchOrchestrator {
    config: EvalConfig,
    backend: Arc<dyn ServiceBackend>,
    client: Client,
}

impl BatchOrchestrator {
    pub fn new(config: EvalConfig, backend: Arc<dyn ServiceBackend>) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            config,
            backend,
            client,
        })
    }

    pub async fn run(&self) -> Result<BatchReport> {
        let mut handles: Vec<Box<dyn ServiceHandle>> = Vec::new();
        let outcome = self.run_inner(&mut handles).await;
        self.teardown(handles).await;
        outcome
    }

    /// Setup errors propagate out of here; `run` tears down whatever was
    /// started before surfacing them.
    async fn run_inner(&self, handles: &mut Vec<Box<dyn ServiceHandle>>) -> Result<BatchReport> {
        if let NetworkMode::Bridge { network } = &self.config.network {
            self.backend.ensure_network(network).await?;
        }

        let inference_spec = self.config.inference_spec();
        info!("starting inference server {}", inference_spec.image);
        handles.push(self.backend.start(&inference_spec).await?);

        let environment_spec = self.config.environment_spec();
        info!("starting environment server {}", environment_spec.image);
        handles.push(self.backend.start(&environment_spec).await?);

        let inference_address = handles[0].address().to_string();
        let environment_address = handles[1].address().to_string();

        let gate = ReadinessGate::new(
            self.client.clone(),
            Duration::from_secs(self.config.poll_interval_seconds),
        );
        gate.wait_ready(
            &inference_address,
            &self.config.probe_path,
            self.config.readiness_timeout_seconds.map(Duration::from_secs),
        )
        .await?;

        let domain = self.config.selected_domain()?;
        let task_ids = TaskSampler::new(self.config.seed).sample(domain, self.config.evaluations)?;
        info!("sampled {} tasks from {}", task_ids.len(), domain.name);

        let limiter = ConcurrencyLimiter::new(self.config.max_concurrency);
        let runner = EpisodeRunner::new(
            self.client.clone(),
            format!("http://{}/evaluate", environment_address),
            Duration::from_secs(self.config.episode_timeout_seconds),
        );
        let model = self.config.inference_model();
        let base_url = self.config.inference_base_url();

        info!(
            "dispatching {} episodes (max concurrent: {})",
            task_ids.len(),
            self.config.max_concurrency
        );
        let episodes = task_ids.iter().map(|&task_id| {
            let request = EpisodeRequest {
                model: model.clone(),
                base_url: base_url.clone(),
                task_id,
                temperature: self.config.temperature,
                seed: Some(self.config.seed),
                opponent: self.config.opponent.clone(),
                api_key: self.config.api_key.clone(),
            };
            let limiter = limiter.clone();
            let runner = runner.clone();
            async move {
                match limiter.acquire().await {
                    Ok(_permit) => runner.run(&request).await,
                    Err(e) => EpisodeResult::failed(request.task_id, 0.0, e.to_string()),
                }
            }
        });

        // Full barrier: aggregation starts only after every dispatched
        // request has produced a result. Collection order is dispatch order.
        let results = join_all(episodes).await;

        let report = BatchReport::from_results(results);
        info!(
            "aggregated {} episodes, average score {:.4}, average time {:.2}s",
            report.total, report.average_score, report.average_time
        );
        Ok(report)
    }

    async fn teardown(&self, handles: Vec<Box<dyn ServiceHandle>>) {
        for handle in &handles {
            info!("stopping {}", handle.name());
            handle.stop().await;
        }
    }
}
