//! Reference [symbolic_oracle::engine::ExplorationEngine] that executes small protocol target
//! models instead of native code.
//!
//! A [program::Program] reads and writes protocol messages through named routines, branches on
//! the messages it reads, and branches on symbolic bytes of internal state. Symbolic branches
//! fork the path. Paths running with [symbolic_oracle::engine::SolvingMode::Deferred] keep both
//! sides of a branch regardless of feasibility until the population is pruned, while paths
//! running with [symbolic_oracle::engine::SolvingMode::Eager] drop infeasible successors at the
//! branch.

/// Path constraints over symbolic bytes.
pub mod constraint;

/// Path population and stepping.
pub mod engine;

/// Target model instructions.
pub mod program;

pub use engine::{Error, ModelEngine, ModelPath, Result};
pub use program::{Instr, Program, ProgramBuilder, Var};
