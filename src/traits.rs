use crate::types::{Result, ServiceSpec};
use async_trait::async_trait;

/// Handle to one running service.
#[async_trait]
pub trait ServiceHandle: Send + Sync {
    /// Name the service was started under.
    fn name(&self) -> &str;

    /// Host-reachable `host:port` for the service.
    fn address(&self) -> &str;

    /// Stop and remove the service. Safe to call more than once; removal
    /// failures are logged, never propagated.
    async fn stop(&self);
}

/// Capability to launch services described by a [`ServiceSpec`].
///
/// The orchestrator depends only on this seam, so tests can substitute a
/// fake backend and never touch a real container engine.
#[async_trait]
pub trait ServiceBackend: Send + Sync {
    /// Create the named bridge network if it does not exist yet.
    async fn ensure_network(&self, name: &str) -> Result<()>;

    /// Launch a service, replacing any stale instance with the same name.
    async fn start(&self, spec: &ServiceSpec) -> Result<Box<dyn ServiceHandle>>;
}
