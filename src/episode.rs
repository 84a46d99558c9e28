use crate::types::{EpisodeRequest, EpisodeResult, EvalError, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Evaluation fields recognized in a task server response, with the
/// defaults the protocol defines for absent fields.
#[derive(Debug, Deserialize)]
struct Evaluation {
    #[serde(default)]
    score: f64,
    #[serde(default)]
    time_taken: Option<f64>,
    #[serde(default)]
    task_name: Option<String>,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Executes one episode against the task server. Stateless across
/// invocations; any failure is absorbed into a failed [`EpisodeResult`] and
/// never aborts the batch.
#[derive(Clone)]
pub struct EpisodeRunner {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl EpisodeRunner {
    pub fn new(client: Client, endpoint: String, timeout: Duration) -> Self {
        Self {
            client,
            endpoint,
            timeout,
        }
    }

    pub async fn run(&self, request: &EpisodeRequest) -> EpisodeResult {
        let started = Instant::now();
        match self.evaluate(request).await {
            Ok(evaluation) => {
                let elapsed = started.elapsed().as_secs_f64();
                info!(
                    "task {} scored {} ({:.2}s)",
                    request.task_id, evaluation.score, elapsed
                );
                EpisodeResult {
                    task_id: request.task_id,
                    task_name: evaluation
                        .task_name
                        .unwrap_or_else(|| "unknown".to_string()),
                    score: evaluation.score,
                    success: evaluation.success,
                    time_taken: evaluation.time_taken.unwrap_or(elapsed),
                    error: evaluation.error,
                }
            }
            Err(e) => {
                warn!("task {} failed: {}", request.task_id, e);
                EpisodeResult::failed(
                    request.task_id,
                    started.elapsed().as_secs_f64(),
                    e.to_string(),
                )
            }
        }
    }

    async fn evaluate(&self, request: &EpisodeRequest) -> Result<Evaluation> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| extract_detail(&body))
                .unwrap_or_else(|| "no detail".to_string());
            return Err(EvalError::Evaluation {
                status: status.as_u16(),
                detail,
            });
        }

        parse_evaluation(response.json().await?)
    }
}

/// Normalize the two response shapes the task server produces: fields either
/// wrapped under `result` next to a top-level `status`, or flat. The wrapped
/// form wins when present. A body that fails the typed deserialization is an
/// episode failure, not a silently defaulted success.
fn parse_evaluation(body: Value) -> Result<Evaluation> {
    if let Some(inner) = body.get("result").filter(|v| v.is_object()) {
        let mut evaluation: Evaluation = serde_json::from_value(inner.clone())?;
        if !evaluation.success {
            evaluation.success =
                body.get("status").and_then(Value::as_str) == Some("success");
        }
        return Ok(evaluation);
    }
    Ok(serde_json::from_value(body)?)
}

fn extract_detail(body: &Value) -> Option<String> {
    body.get("detail")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
