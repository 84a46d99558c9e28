use serde::{Deserialize, Serialize};

/// How a service container attaches to the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NetworkMode {
    Host,
    Bridge { network: String },
}

/// Mapping from a container port to a host port.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PortBinding {
    pub container: u16,
    pub host: u16,
}

/// Immutable description of one externally-managed service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    pub image: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub network: NetworkMode,
    pub ports: Vec<PortBinding>,
    pub gpus: bool,
    pub shm_size: Option<String>,
}

impl ServiceSpec {
    /// Address the service is reachable at from the orchestrator host.
    pub fn host_address(&self) -> String {
        let port = match self.network {
            NetworkMode::Host => self.ports.first().map(|p| p.container).unwrap_or(80),
            NetworkMode::Bridge { .. } => self.ports.first().map(|p| p.host).unwrap_or(80),
        };
        format!("127.0.0.1:{}", port)
    }

    /// Address other containers on the same network reach the service at.
    pub fn internal_address(&self) -> String {
        match self.network {
            NetworkMode::Host => self.host_address(),
            NetworkMode::Bridge { .. } => format!(
                "{}:{}",
                self.name,
                self.ports.first().map(|p| p.container).unwrap_or(80)
            ),
        }
    }
}

/// A named game with a contiguous half-open range of task identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDomain {
    pub name: String,
    pub start: u64,
    pub end: u64,
}

impl TaskDomain {
    pub fn new(name: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    /// Number of distinct task identifiers in the domain.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, task_id: u64) -> bool {
        task_id >= self.start && task_id < self.end
    }
}

/// One evaluation unit, serialized as the evaluation RPC request body.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeRequest {
    pub model: String,
    pub base_url: String,
    pub task_id: u64,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Outcome of one episode, successful or failed. Exactly one is produced
/// per dispatched request.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeResult {
    pub task_id: u64,
    pub task_name: String,
    pub score: f64,
    pub success: bool,
    pub time_taken: f64,
    pub error: Option<String>,
}

impl EpisodeResult {
    /// Failed-path result: zero score, measured wall time, error populated.
    pub fn failed(task_id: u64, time_taken: f64, error: String) -> Self {
        Self {
            task_id,
            task_name: "unknown".to_string(),
            score: 0.0,
            success: false,
            time_taken,
            error: Some(error),
        }
    }
}

/// Aggregate over all episodes of one run, in dispatch order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub average_score: f64,
    pub average_time: f64,
    pub results: Vec<EpisodeResult>,
}

impl BatchReport {
    pub fn from_results(results: Vec<EpisodeResult>) -> Self {
        let total = results.len();
        let (average_score, average_time) = if total > 0 {
            let score_sum: f64 = results.iter().map(|r| r.score).sum();
            let time_sum: f64 = results.iter().map(|r| r.time_taken).sum();
            (score_sum / total as f64, time_sum / total as f64)
        } else {
            (0.0, 0.0)
        };

        Self {
            total,
            average_score,
            average_time,
            results,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service {name} failed to start: {reason}")]
    ServiceStart { name: String, reason: String },

    #[error("service not ready after {}s", .waited.as_secs())]
    ReadinessTimeout { waited: std::time::Duration },

    #[error("domain {domain} has {available} task ids, cannot sample {requested}")]
    InsufficientRange {
        domain: String,
        requested: usize,
        available: usize,
    },

    #[error("unknown task domain: {0}")]
    UnknownDomain(String),

    #[error("evaluation endpoint returned {status}: {detail}")]
    Evaluation { status: u16, detail: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("general error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, EvalError>;
