use crate::types::{EvalError, NetworkMode, PortBinding, Result, ServiceSpec, TaskDomain};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Container name for the model-inference server.
pub const INFERENCE_SERVICE: &str = "vllm-server";
/// Container name for the task/environment server.
pub const ENVIRONMENT_SERVICE: &str = "agentgym-server";
/// Model name presented to the task server when a fine-tune is loaded.
pub const FINE_TUNE_MODEL_NAME: &str = "trained_lora";

/// Immutable configuration for one evaluation run. Constructed before
/// orchestration begins and passed in by value; nothing reads ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Base model identifier, e.g. a HuggingFace repo.
    pub base_model: String,
    /// Optional fine-tune (LoRA) repo layered on the base model.
    pub fine_tune: Option<String>,
    pub inference_image: String,
    pub environment_image: String,
    pub network: NetworkMode,
    pub inference_port: PortBinding,
    pub environment_port: PortBinding,
    pub gpus: bool,
    pub shm_size: Option<String>,
    /// Number of episodes to dispatch.
    pub evaluations: usize,
    pub seed: u64,
    pub temperature: f64,
    /// Selected entry of `domains`.
    pub domain: String,
    pub domains: Vec<TaskDomain>,
    pub max_concurrency: usize,
    pub probe_path: String,
    pub poll_interval_seconds: u64,
    /// None waits forever on the readiness probe.
    pub readiness_timeout_seconds: Option<u64>,
    pub episode_timeout_seconds: u64,
    pub opponent: Option<String>,
    pub api_key: Option<String>,
    pub output_dir: PathBuf,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            base_model: "Qwen/Qwen2.5-3B-Instruct".to_string(),
            fine_tune: None,
            inference_image: "vllm/vllm-openai:latest".to_string(),
            environment_image: "diagonalge/openspiel:latest".to_string(),
            network: NetworkMode::Bridge {
                network: "agent_eval_net".to_string(),
            },
            inference_port: PortBinding {
                container: 8000,
                host: 50000,
            },
            environment_port: PortBinding {
                container: 8000,
                host: 50001,
            },
            gpus: true,
            shm_size: Some("4g".to_string()),
            evaluations: 100,
            seed: 42,
            temperature: 0.0,
            domain: "gin_rummy".to_string(),
            domains: default_domains(),
            max_concurrency: 1,
            probe_path: "/v1/models".to_string(),
            poll_interval_seconds: 5,
            readiness_timeout_seconds: Some(900),
            episode_timeout_seconds: 2500,
            opponent: None,
            api_key: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl EvalConfig {
    pub fn selected_domain(&self) -> Result<&TaskDomain> {
        self.domains
            .iter()
            .find(|d| d.name == self.domain)
            .ok_or_else(|| EvalError::UnknownDomain(self.domain.clone()))
    }

    /// Model identifier passed to the task server for inference.
    pub fn inference_model(&self) -> String {
        if self.fine_tune.is_some() {
            FINE_TUNE_MODEL_NAME.to_string()
        } else {
            self.base_model.clone()
        }
    }

    /// Inference endpoint as seen from inside the evaluation network.
    pub fn inference_base_url(&self) -> String {
        format!("http://{}/v1", self.inference_spec().internal_address())
    }

    pub fn inference_spec(&self) -> ServiceSpec {
        ServiceSpec {
            name: INFERENCE_SERVICE.to_string(),
            image: self.inference_image.clone(),
            args: self.inference_command(),
            env: Vec::new(),
            network: self.network.clone(),
            ports: vec![self.inference_port],
            gpus: self.gpus,
            shm_size: self.shm_size.clone(),
        }
    }

    pub fn environment_spec(&self) -> ServiceSpec {
        ServiceSpec {
            name: ENVIRONMENT_SERVICE.to_string(),
            image: self.environment_image.clone(),
            args: Vec::new(),
            env: Vec::new(),
            network: self.network.clone(),
            ports: vec![self.environment_port],
            gpus: false,
            shm_size: None,
        }
    }

    fn inference_command(&self) -> Vec<String> {
        let port = self.inference_port.container.to_string();
        let mut args = vec!["--model".to_string(), self.base_model.clone()];
        if let Some(fine_tune) = &self.fine_tune {
            args.extend([
                "--enable-lora".to_string(),
                "--lora-modules".to_string(),
                format!("{}={}", FINE_TUNE_MODEL_NAME, fine_tune),
                "--max-lora-rank".to_string(),
                "64".to_string(),
            ]);
        }
        args.extend([
            "--port".to_string(),
            port,
            "--trust-remote-code".to_string(),
        ]);
        args
    }
}

/// Task id ranges for the known game domains.
pub fn default_domains() -> Vec<TaskDomain> {
    vec![
        TaskDomain::new("goofspiel", 0, 99_999_999),
        TaskDomain::new("liars_dice", 100_000_000, 199_999_999),
        TaskDomain::new("leduc_poker", 200_000_000, 299_999_999),
        TaskDomain::new("gin_rummy", 300_000_000, 399_999_999),
        TaskDomain::new("othello", 400_000_000, 499_999_999),
        TaskDomain::new("backgammon", 500_000_000, 599_999_999),
        TaskDomain::new("hex", 600_000_000, 699_999_999),
        TaskDomain::new("clobber", 700_000_000, 799_999_999),
        TaskDomain::new("hearts", 800_000_000, 899_999_999),
        TaskDomain::new("euchre", 900_000_000, 999_999_999),
    ]
}
