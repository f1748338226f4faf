use std::collections::BTreeMap;
use std::sync::Arc;

use symbolic_oracle::engine::{
    ExplorationEngine, HookAction, Intercept, PathId, PathObserver, SolvingMode,
};
use symbolic_oracle::hook::SymbolHook;

use crate::constraint::{Constraint, ConstraintSet};
use crate::program::{Instr, Program};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("label {0} is not defined")]
    UndefinedLabel(String),

    #[error("{0} is not part of the population")]
    UnknownPath(PathId),

    /// The population grew beyond the configured limit
    #[error("path limit of {limit} exceeded")]
    PathLimitExceeded { limit: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// A single execution of the model.
#[derive(Clone, Debug)]
pub struct ModelPath {
    id: PathId,
    pc: usize,
    input: Vec<u8>,
    output: Vec<u8>,
    constraints: ConstraintSet,
    solving: SolvingMode,
    exit_code: Option<i32>,
}

impl ModelPath {
    fn new(id: PathId, solving: SolvingMode) -> Self {
        Self {
            id,
            pc: 0,
            input: Vec::new(),
            output: Vec::new(),
            constraints: ConstraintSet::new(),
            solving,
            exit_code: None,
        }
    }

    pub fn id(&self) -> PathId {
        self.id
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Bytes returned by the most recent receive
    pub fn input(&self) -> &[u8] {
        &self.input
    }

    /// Every byte the path has written
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn solving_mode(&self) -> SolvingMode {
        self.solving
    }

    /// Exit code if the path terminated through an exit instruction
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }
}

enum Outcome {
    Running,
    Forked(ModelPath),
    Exited,
    Infeasible,
}

/// Exploration engine executing a [Program] over a population of paths.
pub struct ModelEngine {
    program: Arc<Program>,
    hooks: BTreeMap<String, SymbolHook>,
    default_solving: SolvingMode,
    path_limit: Option<usize>,
    active: Vec<ModelPath>,
    deadended: Vec<ModelPath>,
    next_id: u64,
    steps: usize,
    hook_binds: usize,
}

impl ModelEngine {
    pub fn new(program: Program) -> Self {
        Self {
            program: Arc::new(program),
            hooks: Default::default(),
            default_solving: SolvingMode::Eager,
            path_limit: None,
            active: Vec::new(),
            deadended: Vec::new(),
            next_id: 0,
            steps: 0,
            hook_binds: 0,
        }
    }

    /// Solving mode of entry paths created without an explicit mode
    pub fn with_default_solving(mut self, mode: SolvingMode) -> Self {
        self.default_solving = mode;
        self
    }

    /// Fail stepping once more than `limit` paths are active.
    pub fn with_path_limit(mut self, limit: usize) -> Self {
        self.path_limit = Some(limit);
        self
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn path(&self, id: PathId) -> Option<&ModelPath> {
        self.active
            .iter()
            .chain(self.deadended.iter())
            .find(|path| path.id == id)
    }

    pub fn active_paths(&self) -> &[ModelPath] {
        &self.active
    }

    pub fn deadended_paths(&self) -> &[ModelPath] {
        &self.deadended
    }

    pub fn hook(&self, routine: &str) -> Option<SymbolHook> {
        self.hooks.get(routine).copied()
    }

    /// Number of times a hook has been bound since the engine was created
    pub fn hook_binds(&self) -> usize {
        self.hook_binds
    }

    /// Steps taken since the last entry path was created
    pub fn steps(&self) -> usize {
        self.steps
    }

    fn new_id(&mut self) -> PathId {
        let id = PathId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn execute<O: PathObserver>(
        &mut self,
        path: &mut ModelPath,
        observer: &mut O,
    ) -> Result<Outcome> {
        let program = Arc::clone(&self.program);
        let Some(instr) = program.instruction(path.pc) else {
            // Fell off the end of the program
            return Ok(Outcome::Exited);
        };

        match instr {
            Instr::Receive { routine } => {
                let action = match self.hook(routine) {
                    Some(hook) => observer.intercepted(path.id, hook, Intercept::Receive),
                    None => HookAction::Continue,
                };

                match action {
                    HookAction::Supply(bytes) => {
                        path.input = bytes;
                        path.pc += 1;
                    }
                    HookAction::Continue => {
                        path.input.clear();
                        path.pc += 1;
                    }
                    HookAction::Stall => (),
                }
            }
            Instr::Send { routine, data } => {
                let action = match self.hook(routine) {
                    Some(hook) => observer.intercepted(path.id, hook, Intercept::Send(data)),
                    None => HookAction::Continue,
                };

                if action != HookAction::Stall {
                    path.output.extend_from_slice(data);
                    path.pc += 1;
                }
            }
            Instr::Match { arms, otherwise } => {
                let label = arms
                    .iter()
                    .find(|(bytes, _)| *bytes == path.input)
                    .map_or(otherwise, |(_, label)| label);
                path.pc = program.resolve(label)?;
            }
            Instr::Havoc { var } => {
                path.constraints.forget(*var);
                path.pc += 1;
            }
            Instr::BranchEq { var, value, target } => {
                let taken = Constraint::Equals(*var, *value);
                let fallthrough = Constraint::NotEquals(*var, *value);
                let target = program.resolve(target)?;

                let (take, fall) = match path.solving {
                    SolvingMode::Deferred => (true, true),
                    SolvingMode::Eager => (
                        path.constraints.is_satisfiable_with(taken),
                        path.constraints.is_satisfiable_with(fallthrough),
                    ),
                };

                match (take, fall) {
                    (true, true) => {
                        let mut child = path.clone();
                        child.id = self.new_id();
                        child.constraints.push(fallthrough);
                        child.pc += 1;

                        path.constraints.push(taken);
                        path.pc = target;

                        observer.forked(path.id, child.id);
                        return Ok(Outcome::Forked(child));
                    }
                    (true, false) => {
                        path.constraints.push(taken);
                        path.pc = target;
                    }
                    (false, true) => {
                        path.constraints.push(fallthrough);
                        path.pc += 1;
                    }
                    (false, false) => return Ok(Outcome::Infeasible),
                }
            }
            Instr::Jump(target) => {
                path.pc = program.resolve(target)?;
            }
            Instr::Exit(code) => {
                path.exit_code = Some(*code);
                return Ok(Outcome::Exited);
            }
        }

        Ok(Outcome::Running)
    }
}

impl ExplorationEngine for ModelEngine {
    type Error = Error;

    fn bind_hook(&mut self, routine: &str, hook: SymbolHook) -> Result<()> {
        self.hooks.insert(routine.to_owned(), hook);
        self.hook_binds += 1;
        Ok(())
    }

    fn entry_path(&mut self, solving: Option<SolvingMode>) -> Result<PathId> {
        self.active.clear();
        self.deadended.clear();
        self.next_id = 0;
        self.steps = 0;

        let id = self.new_id();
        self.active
            .push(ModelPath::new(id, solving.unwrap_or(self.default_solving)));

        Ok(id)
    }

    fn active(&self) -> Vec<PathId> {
        self.active.iter().map(ModelPath::id).collect()
    }

    fn deadended(&self) -> Vec<PathId> {
        self.deadended.iter().map(ModelPath::id).collect()
    }

    fn step<O: PathObserver>(&mut self, observer: &mut O) -> Result<()> {
        let paths = std::mem::take(&mut self.active);
        let mut forked = Vec::new();
        for mut path in paths {
            match self.execute(&mut path, observer)? {
                Outcome::Running => self.active.push(path),
                Outcome::Forked(child) => {
                    self.active.push(path);
                    forked.push(child);
                }
                Outcome::Exited => {
                    observer.deadended(path.id);
                    self.deadended.push(path);
                }
                Outcome::Infeasible => {
                    tracing::trace!(path = %path.id, "dropping infeasible path");
                }
            }
        }

        self.active.append(&mut forked);
        self.steps += 1;

        if let Some(limit) = self.path_limit {
            if self.active.len() > limit {
                return Err(Error::PathLimitExceeded { limit });
            }
        }

        Ok(())
    }

    fn prune(&mut self) -> Result<usize> {
        let before = self.active.len();
        self.active.retain(|path| path.constraints.is_satisfiable());
        Ok(before - self.active.len())
    }

    fn set_solving_mode(&mut self, id: PathId, mode: SolvingMode) -> Result<()> {
        let path = self
            .active
            .iter_mut()
            .chain(self.deadended.iter_mut())
            .find(|path| path.id == id)
            .ok_or(Error::UnknownPath(id))?;
        path.solving = mode;
        Ok(())
    }
}
