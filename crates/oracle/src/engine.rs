use std::fmt::Display;

use crate::hook::SymbolHook;

/// Identifier of an execution path owned by the exploration engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathId(u64);

impl PathId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl Display for PathId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "path#{}", self.0)
    }
}

/// Constraint solving discipline applied to a path when it branches.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SolvingMode {
    /// Branch conditions are not checked for satisfiability when the path forks. Infeasible
    /// paths survive until the population is pruned.
    Deferred,

    /// Every branch condition is checked when the path forks and infeasible successors are
    /// dropped immediately.
    Eager,
}

/// Data presented to a hook when the target reaches an intercepted routine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Intercept<'a> {
    /// The target attempts to write these bytes
    Send(&'a [u8]),

    /// The target attempts to read
    Receive,
}

/// Response of a hook to an intercept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HookAction {
    /// Let the intercepted routine return. A receive completes without data.
    Continue,

    /// Complete a receive with these bytes
    Supply(Vec<u8>),

    /// Keep the path parked at the intercept. The hook fires again on the next step of the path.
    Stall,
}

/// Receives the events the engine produces while stepping its population.
pub trait PathObserver {
    /// The engine forked `child` from `parent`. The child starts with a copy of the parent's state.
    fn forked(&mut self, parent: PathId, child: PathId);

    /// The path reached a routine bound to `hook`.
    fn intercepted(&mut self, path: PathId, hook: SymbolHook, intercept: Intercept<'_>)
        -> HookAction;

    /// The path finished executing and moved into the deadended set.
    fn deadended(&mut self, path: PathId);
}

/// The path exploration engine driving the target. Path creation, forking, feasibility checks
/// and the mapping of routines onto intercepts all belong to the engine; the oracle only decides
/// when to step, when to prune, and what to collect.
pub trait ExplorationEngine {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Bind a hook to the named target routine, replacing any previous binding of that routine.
    fn bind_hook(&mut self, routine: &str, hook: SymbolHook) -> Result<(), Self::Error>;

    /// Discard the current population and create a single entry path. When `solving` is `None`
    /// the engine keeps whatever solving mode its entry state is configured with.
    fn entry_path(&mut self, solving: Option<SolvingMode>) -> Result<PathId, Self::Error>;

    /// Snapshot of the paths that can still execute
    fn active(&self) -> Vec<PathId>;

    /// Snapshot of the paths whose execution has ended
    fn deadended(&self) -> Vec<PathId>;

    /// Advance every active path by a single step.
    fn step<O: PathObserver>(&mut self, observer: &mut O) -> Result<(), Self::Error>;

    /// Drop active paths whose constraints are unsatisfiable. Returns the number of paths removed.
    fn prune(&mut self) -> Result<usize, Self::Error>;

    fn set_solving_mode(&mut self, path: PathId, mode: SolvingMode) -> Result<(), Self::Error>;
}
