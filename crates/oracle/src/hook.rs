use crate::context::{PathContext, QueryKind};
use crate::engine::{ExplorationEngine, HookAction, Intercept};
use crate::error::{Error, Result};

/// Callback bound to one of the target's protocol routines. Each variant closes over the kind of
/// query it serves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolHook {
    /// Bound to the routine the target uses to write protocol data
    Send(QueryKind),

    /// Bound to the routine the target uses to read protocol data
    Receive(QueryKind),
}

impl SymbolHook {
    pub fn kind(&self) -> QueryKind {
        match self {
            Self::Send(kind) | Self::Receive(kind) => *kind,
        }
    }

    /// Apply the intercept to the path's context and decide how the routine proceeds.
    pub fn invoke(&self, context: &mut PathContext, intercept: Intercept<'_>) -> HookAction {
        if self.kind() != context.kind() {
            tracing::warn!(
                hook = ?self,
                context = ?context.kind(),
                "hook does not serve the query attached to this path"
            );
            return HookAction::Continue;
        }

        match (self, intercept) {
            (Self::Send(_), Intercept::Send(bytes)) => context.query_mut().on_send(bytes),
            (Self::Receive(_), Intercept::Receive) => context.query_mut().on_receive(),
            (hook, intercept) => {
                tracing::warn!(?hook, ?intercept, "intercept direction does not match hook");
                HookAction::Continue
            }
        }
    }
}

/// Names of the target routines the hooks are bound to.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HookTargets {
    /// Routine that writes protocol output
    pub send_routine: String,

    /// Routine that reads protocol input
    pub receive_routine: String,
}

impl Default for HookTargets {
    fn default() -> Self {
        Self {
            send_routine: "smtp_write".to_owned(),
            receive_routine: "smtp_read_aux".to_owned(),
        }
    }
}

/// The pair of hooks a query session binds for its lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HookConfiguration {
    kind: QueryKind,
    targets: HookTargets,
}

impl HookConfiguration {
    pub fn new(kind: QueryKind, targets: HookTargets) -> Self {
        Self { kind, targets }
    }

    pub fn membership(targets: HookTargets) -> Self {
        Self::new(QueryKind::Membership, targets)
    }

    pub fn probe(targets: HookTargets) -> Self {
        Self::new(QueryKind::Probe, targets)
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn targets(&self) -> &HookTargets {
        &self.targets
    }

    pub fn bindings(&self) -> [(&str, SymbolHook); 2] {
        [
            (self.targets.send_routine.as_str(), SymbolHook::Send(self.kind)),
            (self.targets.receive_routine.as_str(), SymbolHook::Receive(self.kind)),
        ]
    }

    /// Bind both hooks on the engine.
    pub fn install<E: ExplorationEngine>(&self, engine: &mut E) -> Result<()> {
        for (routine, hook) in self.bindings() {
            engine.bind_hook(routine, hook).map_err(Error::engine)?;
        }

        Ok(())
    }
}
