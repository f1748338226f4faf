//! This crate answers the queries of an active automata-learning algorithm about a protocol
//! implementation by driving a symbolic path exploration engine over the target rather than
//! running it natively.
//!
//! ### Queries
//!
//! A **membership** query asks whether the target consumes an entire input word and which output
//! symbols follow it. A **probe** query asks which output symbols may follow a prefix that is
//! already known to be feasible. Both are answered by [runner::QueryRunner].
//!
//! ### Engine
//!
//! The [engine::ExplorationEngine] trait must be implemented by the engine executing the target.
//! The engine owns every execution path: it forks paths on symbolic branches, checks their
//! feasibility and reports intercepted protocol reads and writes through the
//! [engine::PathObserver] trait. The runner attaches a [context::PathContext] to each path and
//! advances the population until every path has consumed the word and emitted its next symbol.

/// Protocol symbols and their byte encodings.
pub mod alphabet;

/// Oracle configuration.
pub mod config;

/// Per-path query state machines.
pub mod context;

/// Interface to the path exploration engine.
pub mod engine;

pub mod error;

/// Hooks bound to the target's protocol read and write routines.
pub mod hook;

/// Query contexts of the path population, keyed by path id.
pub mod population;

/// Membership and probe query driver.
pub mod runner;

pub use alphabet::{Alphabet, Symbol};
pub use config::OracleConfig;
pub use error::{Error, Result};
pub use runner::{MembershipOutcome, QueryRunner};

#[cfg(test)]
mod tests;
