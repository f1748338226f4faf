use crate::error::{Error, Result};
use crate::hook::HookTargets;

/// Number of engine steps in each explore batch of a membership query.
pub const DEFAULT_BATCH_STEPS: usize = 18;

/// Oracle settings. Missing fields take their default values when deserialized.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Maximum engine steps per explore batch. The population is pruned after every batch.
    pub batch_steps: usize,

    /// Total steps a single query may take before it is aborted. `None` lets queries run until
    /// they complete on their own.
    pub step_limit: Option<usize>,

    /// Target routines the hooks are bound to
    pub hooks: HookTargets,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            batch_steps: DEFAULT_BATCH_STEPS,
            step_limit: None,
            hooks: HookTargets::default(),
        }
    }
}

impl OracleConfig {
    pub fn with_batch_steps(mut self, batch_steps: usize) -> Self {
        self.batch_steps = batch_steps;
        self
    }

    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = Some(step_limit);
        self
    }

    pub fn without_step_limit(mut self) -> Self {
        self.step_limit = None;
        self
    }

    pub fn with_hooks(mut self, hooks: HookTargets) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_steps == 0 {
            return Err(Error::InvalidConfig(
                "batch_steps must be at least 1".to_owned(),
            ));
        }

        if self.hooks.send_routine == self.hooks.receive_routine {
            return Err(Error::InvalidConfig(format!(
                "send and receive hooks cannot share routine {routine}",
                routine = self.hooks.send_routine
            )));
        }

        Ok(())
    }
}
