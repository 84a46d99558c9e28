use crate::types::{EvalError, Result, TaskDomain};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::debug;

/// Deterministic task selection: the same (domain, count, seed) always
/// yields the same sequence, so runs against different model variants score
/// the same task instances.
///
/// The PRNG is pinned to ChaCha20 seeded with [`ChaCha20Rng::seed_from_u64`];
/// sampling is without replacement.
pub struct TaskSampler {
    seed: u64,
}

impl TaskSampler {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn sample(&self, domain: &TaskDomain, count: usize) -> Result<Vec<u64>> {
        let available = usize::try_from(domain.len()).map_err(|_| {
            EvalError::General(format!("domain {} range exceeds usize", domain.name))
        })?;
        if count > available {
            return Err(EvalError::InsufficientRange {
                domain: domain.name.clone(),
                requested: count,
                available,
            });
        }

        let mut rng = ChaCha20Rng::seed_from_u64(self.seed);
        let indices = rand::seq::index::sample(&mut rng, available, count);
        let task_ids: Vec<u64> = indices.iter().map(|i| domain.start + i as u64).collect();
        debug!(
            "sampled {} of {} ids from {} with seed {}",
            count, available, domain.name, self.seed
        );
        Ok(task_ids)
    }
}
