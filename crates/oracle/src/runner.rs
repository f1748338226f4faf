use std::sync::Arc;

use crate::alphabet::{Alphabet, Symbol};
use crate::config::OracleConfig;
use crate::context::PathContext;
use crate::engine::{ExplorationEngine, PathId, SolvingMode};
use crate::error::{Error, Result};
use crate::hook::HookConfiguration;
use crate::population::PathContexts;

/// Answer to a membership query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipOutcome {
    accepted: bool,
    symbols: Option<Vec<Symbol>>,
}

impl MembershipOutcome {
    pub fn rejected() -> Self {
        Self {
            accepted: false,
            symbols: None,
        }
    }

    pub fn accepted(symbols: Vec<Symbol>) -> Self {
        Self {
            accepted: true,
            symbols: Some(symbols),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Symbols observed after the word. `None` exactly when the word was rejected.
    pub fn symbols(&self) -> Option<&[Symbol]> {
        self.symbols.as_deref()
    }

    pub fn into_parts(self) -> (bool, Option<Vec<Symbol>>) {
        (self.accepted, self.symbols)
    }
}

/// Counters describing the most recent query.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Engine steps taken
    pub steps: usize,

    /// Explore batches run before membership was decided
    pub batches: usize,

    /// Paths removed by pruning
    pub pruned: usize,

    /// Active paths when the query finished
    pub active: usize,

    /// Deadended paths when the query finished
    pub deadended: usize,
}

/// Answers membership and probe queries by driving an [ExplorationEngine] over the target.
pub struct QueryRunner<E: ExplorationEngine> {
    engine: E,
    config: OracleConfig,
    installed: Option<HookConfiguration>,
    contexts: PathContexts,
    stats: QueryStats,
}

impl<E: ExplorationEngine> QueryRunner<E> {
    pub fn new(engine: E, config: OracleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine,
            config,
            installed: None,
            contexts: PathContexts::new(),
            stats: QueryStats::default(),
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// The hooks currently bound on the engine, if any
    pub fn installed_hooks(&self) -> Option<&HookConfiguration> {
        self.installed.as_ref()
    }

    /// Query contexts of the population left behind by the most recent query
    pub fn contexts(&self) -> &PathContexts {
        &self.contexts
    }

    pub fn last_stats(&self) -> QueryStats {
        self.stats
    }

    pub fn set_membership_hooks(&mut self) -> Result<()> {
        self.install_hooks(HookConfiguration::membership(self.config.hooks.clone()))
    }

    pub fn set_probe_hooks(&mut self) -> Result<()> {
        self.install_hooks(HookConfiguration::probe(self.config.hooks.clone()))
    }

    /// Bind the hooks unless the same configuration is already bound.
    pub fn install_hooks(&mut self, hooks: HookConfiguration) -> Result<()> {
        if self.installed.as_ref() == Some(&hooks) {
            return Ok(());
        }

        self.installed = None;
        hooks.install(&mut self.engine)?;
        tracing::debug!(kind = ?hooks.kind(), targets = ?hooks.targets(), "hooks installed");
        self.installed = Some(hooks);

        Ok(())
    }

    /// Determine whether the target consumes `word` and which output symbols follow it.
    ///
    /// The population is explored with deferred constraint solving in batches of
    /// [OracleConfig::batch_steps] steps, pruning infeasible paths after each batch, until some
    /// path has consumed the whole word. All remaining paths are then brought to the end of the
    /// word, switched to eager solving and probed for their next output symbol.
    pub fn run_membership_query(
        &mut self,
        word: &[Symbol],
        alphabet: &Alphabet,
    ) -> Result<MembershipOutcome> {
        self.set_membership_hooks()?;
        alphabet.validate_word(word)?;
        self.stats = QueryStats::default();

        let entry = self
            .engine
            .entry_path(Some(SolvingMode::Deferred))
            .map_err(Error::engine)?;
        self.contexts.seed(
            entry,
            PathContext::membership(Arc::from(word), Arc::new(alphabet.clone())),
        );

        let batch_steps = self.config.batch_steps;
        while !self.engine.active().is_empty() && !self.membership_reached() {
            self.run_until(Some(batch_steps), |contexts, active, deadended| {
                contexts.any(active, PathContext::is_done_consuming)
                    || contexts.any(deadended, PathContext::is_done_consuming)
            })?;
            self.stats.batches += 1;
            self.prune()?;
        }

        if !self.membership_reached() {
            self.finish_stats();
            tracing::info!(word = ?word, "membership rejected");
            return Ok(MembershipOutcome::rejected());
        }

        tracing::debug!("membership reached, aligning paths at end of word");
        self.run_until(None, |contexts, active, _| {
            contexts.all(active, PathContext::is_done_consuming)
        })?;
        self.prune()?;

        for path in self.engine.active() {
            self.engine
                .set_solving_mode(path, SolvingMode::Eager)
                .map_err(Error::engine)?;
        }
        self.begin_probing();
        self.run_until(None, |contexts, active, _| {
            contexts.all(active, PathContext::done_probing)
        })?;

        let symbols = self.harvest();
        self.finish_stats();
        tracing::info!(word = ?word, symbols = ?symbols, "membership accepted");

        Ok(MembershipOutcome::accepted(symbols))
    }

    /// Determine which output symbols may follow `prefix`. The prefix is assumed to be feasible
    /// and the engine's default solving mode is used throughout.
    pub fn run_probe_query(
        &mut self,
        prefix: &[Symbol],
        alphabet: &Alphabet,
    ) -> Result<Vec<Symbol>> {
        self.set_probe_hooks()?;
        alphabet.validate_word(prefix)?;
        self.stats = QueryStats::default();

        let entry = self.engine.entry_path(None).map_err(Error::engine)?;
        self.contexts.seed(
            entry,
            PathContext::probe(Arc::from(prefix), Arc::new(alphabet.clone())),
        );

        self.run_until(None, |contexts, active, _| {
            contexts.all(active, PathContext::is_done_consuming)
        })?;

        self.begin_probing();
        self.run_until(None, |contexts, active, _| {
            contexts.all(active, PathContext::done_probing)
        })?;

        let symbols = self.harvest();
        self.finish_stats();
        tracing::info!(prefix = ?prefix, symbols = ?symbols, "probe finished");

        Ok(symbols)
    }

    fn membership_reached(&self) -> bool {
        let active = self.engine.active();
        let deadended = self.engine.deadended();
        self.contexts.any(&active, PathContext::is_done_consuming)
            || self.contexts.any(&deadended, PathContext::is_done_consuming)
    }

    /// Step the population until the predicate holds over a snapshot of the active and deadended
    /// paths, the active set empties, or `max_steps` steps have been taken.
    fn run_until(
        &mut self,
        max_steps: Option<usize>,
        predicate: impl Fn(&PathContexts, &[PathId], &[PathId]) -> bool,
    ) -> Result<()> {
        let mut taken = 0;
        loop {
            let active = self.engine.active();
            if active.is_empty() {
                break;
            }

            let deadended = self.engine.deadended();
            if predicate(&self.contexts, &active, &deadended) {
                break;
            }

            if max_steps.is_some_and(|max_steps| taken >= max_steps) {
                break;
            }

            if let Some(limit) = self.config.step_limit {
                if self.stats.steps >= limit {
                    return Err(Error::StepLimitExceeded { limit });
                }
            }

            self.engine.step(&mut self.contexts).map_err(Error::engine)?;
            taken += 1;
            self.stats.steps += 1;
        }

        Ok(())
    }

    fn prune(&mut self) -> Result<()> {
        let before = self.engine.active().len();
        let pruned = self.engine.prune().map_err(Error::engine)?;
        self.stats.pruned += pruned;
        tracing::debug!(before, after = before - pruned.min(before), "pruned active paths");

        Ok(())
    }

    fn begin_probing(&mut self) {
        for path in self.engine.active() {
            if let Some(context) = self.contexts.get_mut(path) {
                if !context.begin_probing() {
                    tracing::warn!(
                        %path,
                        phase = ?context.query().phase(),
                        "path not ready for probing"
                    );
                }
            }
        }
    }

    /// Collect probed symbols from completed active paths, completed deadended paths, and
    /// deadended paths that ended mid-probe.
    fn harvest(&mut self) -> Vec<Symbol> {
        let active = self.engine.active();
        let deadended = self.engine.deadended();

        let mut symbols: Vec<Symbol> = self
            .contexts
            .iter_for(&active)
            .filter(|(_, context)| context.done_probing())
            .filter_map(|(_, context)| context.probed_symbol().cloned())
            .collect();

        for path in deadended {
            let Some(context) = self.contexts.get_mut(path) else {
                continue;
            };

            if context.done_probing() {
                symbols.extend(context.probed_symbol().cloned());
            } else if context.probing_pending() {
                context.collect_pending_probe();
                if let Some(symbol) = context.probed_symbol() {
                    tracing::debug!(%path, %symbol, "recovered symbol from pending probe");
                    symbols.push(symbol.clone());
                }
            }
        }

        symbols
    }

    fn finish_stats(&mut self) {
        self.stats.active = self.engine.active().len();
        self.stats.deadended = self.engine.deadended().len();
        tracing::debug!(stats = ?self.stats, "query finished");
    }
}
