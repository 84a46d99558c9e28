use clap::Parser;
use game_evaluator::{
    BatchOrchestrator, DockerBackend, EvalConfig, NetworkMode, PortBinding, ReportWriter,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "game-evaluator",
    about = "Evaluate a language model on a suite of game-playing tasks"
)]
struct Cli {
    /// Base model identifier (HuggingFace repo)
    #[arg(long, default_value = "Qwen/Qwen2.5-3B-Instruct")]
    base_model: String,

    /// Fine-tune (LoRA) repo layered on the base model
    #[arg(long)]
    fine_tune: Option<String>,

    #[arg(long, default_value = "vllm/vllm-openai:latest")]
    inference_image: String,

    #[arg(long, default_value = "diagonalge/openspiel:latest")]
    environment_image: String,

    /// Game domain to draw task ids from
    #[arg(long, default_value = "gin_rummy")]
    game: String,

    /// Number of episodes to run
    #[arg(long, default_value_t = 100)]
    evals: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, default_value_t = 0.0)]
    temperature: f64,

    /// Maximum episodes in flight at once
    #[arg(long, default_value_t = 1)]
    max_concurrent: usize,

    /// Opponent policy passed through to the task server
    #[arg(long)]
    opponent: Option<String>,

    /// API key forwarded to the inference endpoint
    #[arg(long)]
    api_key: Option<String>,

    /// Bridge network joining the two service containers
    #[arg(long, default_value = "agent_eval_net")]
    network: String,

    /// Run both containers on the host network instead of a bridge
    #[arg(long)]
    host_network: bool,

    #[arg(long, default_value_t = 50000)]
    inference_host_port: u16,

    #[arg(long, default_value_t = 50001)]
    environment_host_port: u16,

    /// Start the inference server without GPU access
    #[arg(long)]
    cpu_only: bool,

    /// Give up if the inference server is not ready after this many seconds
    #[arg(long, default_value_t = 900)]
    readiness_timeout: u64,

    /// Wait on the readiness probe forever instead of timing out
    #[arg(long)]
    wait_forever: bool,

    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

impl Cli {
    fn into_config(self) -> EvalConfig {
        let defaults = EvalConfig::default();
        let network = if self.host_network {
            NetworkMode::Host
        } else {
            NetworkMode::Bridge {
                network: self.network,
            }
        };
        EvalConfig {
            base_model: self.base_model,
            fine_tune: self.fine_tune,
            inference_image: self.inference_image,
            environment_image: self.environment_image,
            network,
            inference_port: PortBinding {
                container: defaults.inference_port.container,
                host: self.inference_host_port,
            },
            environment_port: PortBinding {
                container: defaults.environment_port.container,
                host: self.environment_host_port,
            },
            gpus: !self.cpu_only,
            evaluations: self.evals,
            seed: self.seed,
            temperature: self.temperature,
            domain: self.game,
            max_concurrency: self.max_concurrent,
            readiness_timeout_seconds: if self.wait_forever {
                None
            } else {
                Some(self.readiness_timeout)
            },
            opponent: self.opponent,
            api_key: self.api_key,
            output_dir: self.output_dir,
            ..defaults
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Cli::parse().into_config();
    let base_model = config.base_model.clone();
    let fine_tune = config.fine_tune.clone();
    let output_dir = config.output_dir.clone();

    info!(
        "evaluating {} on {} ({} episodes)",
        config.inference_model(),
        config.domain,
        config.evaluations
    );

    let orchestrator = BatchOrchestrator::new(config, Arc::new(DockerBackend::new()))?;
    let report = orchestrator.run().await?;

    let writer = ReportWriter::new(output_dir);
    let path = writer.write(&report, &base_model, fine_tune.as_deref())?;
    info!(
        "evaluation complete: {} tasks, average score {:.4}, report at {}",
        report.total,
        report.average_score,
        path.display()
    );
    Ok(())
}
