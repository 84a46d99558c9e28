use crate::traits::{ServiceBackend, ServiceHandle};
use crate::types::{EvalError, NetworkMode, Result, ServiceSpec};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Service backend driving the `docker` CLI.
pub struct DockerBackend;

impl DockerBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DockerBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceBackend for DockerBackend {
    async fn ensure_network(&self, name: &str) -> Result<()> {
        let inspect = Command::new("docker")
            .args(["network", "inspect", name])
            .output()
            .await?;
        if inspect.status.success() {
            debug!("network {} already exists", name);
            return Ok(());
        }

        let create = Command::new("docker")
            .args(["network", "create", "--driver", "bridge", name])
            .output()
            .await?;
        if !create.status.success() {
            return Err(EvalError::General(format!(
                "failed to create network {}: {}",
                name,
                String::from_utf8_lossy(&create.stderr).trim()
            )));
        }
        info!("created network {}", name);
        Ok(())
    }

    async fn start(&self, spec: &ServiceSpec) -> Result<Box<dyn ServiceHandle>> {
        // A container with this name may be left over from a crashed run;
        // remove it so relaunch is idempotent.
        remove_container(&spec.name).await;

        let output = Command::new("docker")
            .args(run_args(spec))
            .output()
            .await?;
        if !output.status.success() {
            return Err(EvalError::ServiceStart {
                name: spec.name.clone(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let container_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let address = spec.host_address();
        info!(
            "started {} ({}) as {} at {}",
            spec.name,
            spec.image,
            &container_id[..12.min(container_id.len())],
            address
        );

        Ok(Box::new(DockerHandle {
            name: spec.name.clone(),
            address,
            stopped: AtomicBool::new(false),
        }))
    }
}

fn run_args(spec: &ServiceSpec) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        spec.name.clone(),
    ];

    match &spec.network {
        NetworkMode::Host => {
            args.extend(["--network".to_string(), "host".to_string()]);
        }
        NetworkMode::Bridge { network } => {
            args.extend(["--network".to_string(), network.clone()]);
            for binding in &spec.ports {
                args.extend([
                    "-p".to_string(),
                    format!("{}:{}", binding.host, binding.container),
                ]);
            }
        }
    }

    if spec.gpus {
        args.extend(["--gpus".to_string(), "all".to_string()]);
    }
    if let Some(shm) = &spec.shm_size {
        args.extend(["--shm-size".to_string(), shm.clone()]);
    }
    for (key, value) in &spec.env {
        args.extend(["-e".to_string(), format!("{}={}", key, value)]);
    }

    args.push(spec.image.clone());
    args.extend(spec.args.iter().cloned());
    args
}

async fn remove_container(name: &str) {
    // Best effort; the container usually does not exist.
    let _ = Command::new("docker")
        .args(["rm", "-f", name])
        .output()
        .await;
}

struct DockerHandle {
    name: String,
    address: String,
    stopped: AtomicBool,
}

#[async_trait]
impl ServiceHandle for DockerHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> &str {
        &self.address
    }

    async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        match Command::new("docker")
            .args(["rm", "-f", &self.name])
            .output()
            .await
        {
            Ok(output) if output.status.success() => {
                info!("removed container {}", self.name);
            }
            Ok(output) => {
                warn!(
                    "failed to remove container {}: {}",
                    self.name,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            Err(e) => {
                warn!("failed to remove container {}: {}", self.name, e);
            }
        }
    }
}
