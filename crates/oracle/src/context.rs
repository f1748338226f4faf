use std::sync::Arc;

use crate::alphabet::{Alphabet, Symbol};
use crate::engine::HookAction;

/// Kind of query a context tracks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Membership,
    Probe,
}

/// Progress of a single path through a query.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Symbols of the word are being supplied to the target
    Consuming,

    /// The whole word has been consumed. The path is parked until probing starts.
    ConsumeComplete,

    /// Waiting for the target to emit the next output symbol
    Probing,

    /// Probing finished, with or without a symbol
    ProbeComplete,
}

/// Per-path query state. Contexts are copied when a path forks and diverge afterwards.
#[derive(Clone, Debug)]
pub struct QueryContext {
    word: Arc<[Symbol]>,
    alphabet: Arc<Alphabet>,
    position: usize,
    phase: Phase,
    output: Vec<u8>,
    probed_symbol: Option<Symbol>,
    probing_pending: bool,
}

impl QueryContext {
    pub fn new(word: Arc<[Symbol]>, alphabet: Arc<Alphabet>) -> Self {
        Self {
            word,
            alphabet,
            position: 0,
            phase: Phase::Consuming,
            output: Vec::new(),
            probed_symbol: None,
            probing_pending: false,
        }
    }

    pub fn word(&self) -> &[Symbol] {
        &self.word
    }

    /// Number of word symbols supplied so far
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn probed_symbol(&self) -> Option<&Symbol> {
        self.probed_symbol.as_ref()
    }

    /// Output bytes captured while probing that have not been resolved to a symbol
    pub fn pending_output(&self) -> &[u8] {
        &self.output
    }

    /// True if the path ended while probing, before a definitive symbol was recorded.
    pub fn probing_pending(&self) -> bool {
        self.probing_pending
    }

    pub fn done_probing(&self) -> bool {
        self.phase == Phase::ProbeComplete
    }

    /// True once the whole word has been consumed, including any later probing phases.
    pub fn is_done_consuming(&self) -> bool {
        self.phase != Phase::Consuming
    }

    /// Move a parked path into probing. Returns false if the path has not consumed its word or
    /// has already started probing.
    pub fn begin_probing(&mut self) -> bool {
        if self.phase == Phase::ConsumeComplete {
            self.phase = Phase::Probing;
            true
        } else {
            false
        }
    }

    /// Record that the path stopped executing.
    pub fn mark_deadended(&mut self) {
        if self.phase == Phase::Probing {
            self.probing_pending = true;
        }
    }

    /// Finalize a pending probe from whatever output the target produced before its path ended.
    /// Does nothing if the probe is not pending.
    pub fn collect_pending_probe(&mut self) {
        if !self.probing_pending {
            return;
        }

        self.probed_symbol = self.alphabet.recover(&self.output).cloned();
        self.output.clear();
        self.probing_pending = false;
        self.phase = Phase::ProbeComplete;
    }

    /// The target attempts to read.
    pub fn on_receive(&mut self) -> HookAction {
        match self.phase {
            Phase::Consuming => {
                if self.complete_if_consumed() {
                    return HookAction::Stall;
                }

                let symbol = &self.word[self.position];
                match self.alphabet.encode(symbol) {
                    Some(encoding) => {
                        let encoding = encoding.to_vec();
                        self.position += 1;
                        HookAction::Supply(encoding)
                    }
                    None => {
                        tracing::warn!("no encoding for {symbol}, input not supplied");
                        HookAction::Continue
                    }
                }
            }
            Phase::Probing => {
                // Target went back to reading without emitting anything
                self.finish_probe(None);
                HookAction::Stall
            }
            Phase::ConsumeComplete | Phase::ProbeComplete => HookAction::Stall,
        }
    }

    /// The target attempts to write `bytes`.
    pub fn on_send(&mut self, bytes: &[u8]) -> HookAction {
        match self.phase {
            Phase::Consuming => {
                if self.complete_if_consumed() {
                    HookAction::Stall
                } else {
                    // Output interleaved with input delivery does not affect consumption
                    HookAction::Continue
                }
            }
            Phase::Probing => {
                self.output.extend_from_slice(bytes);
                if let Some(symbol) = self.alphabet.decode(&self.output).cloned() {
                    self.finish_probe(Some(symbol));
                } else if !self.alphabet.is_partial(&self.output) {
                    // Bytes written past the end of a complete symbol are dropped
                    let symbol = self.alphabet.longest_prefix(&self.output).cloned();
                    if symbol.is_none() {
                        tracing::warn!(output = ?self.output, "output does not match any symbol");
                    }
                    self.finish_probe(symbol);
                }

                HookAction::Continue
            }
            Phase::ConsumeComplete | Phase::ProbeComplete => HookAction::Stall,
        }
    }

    fn complete_if_consumed(&mut self) -> bool {
        if self.position == self.word.len() {
            self.phase = Phase::ConsumeComplete;
            true
        } else {
            false
        }
    }

    fn finish_probe(&mut self, symbol: Option<Symbol>) {
        self.probed_symbol = symbol;
        self.output.clear();
        self.phase = Phase::ProbeComplete;
    }
}

/// Context of a path answering a membership query.
#[derive(Clone, Debug)]
pub struct MembershipContext(QueryContext);

impl MembershipContext {
    pub fn new(word: Arc<[Symbol]>, alphabet: Arc<Alphabet>) -> Self {
        Self(QueryContext::new(word, alphabet))
    }

    pub fn is_done_membership(&self) -> bool {
        self.0.is_done_consuming()
    }

    pub fn context(&self) -> &QueryContext {
        &self.0
    }

    pub fn context_mut(&mut self) -> &mut QueryContext {
        &mut self.0
    }
}

/// Context of a path answering a probe query.
#[derive(Clone, Debug)]
pub struct ProbeContext(QueryContext);

impl ProbeContext {
    pub fn new(prefix: Arc<[Symbol]>, alphabet: Arc<Alphabet>) -> Self {
        Self(QueryContext::new(prefix, alphabet))
    }

    pub fn is_done_prefix(&self) -> bool {
        self.0.is_done_consuming()
    }

    pub fn context(&self) -> &QueryContext {
        &self.0
    }

    pub fn context_mut(&mut self) -> &mut QueryContext {
        &mut self.0
    }
}

/// Query state attached to a single execution path.
#[derive(Clone, Debug)]
pub enum PathContext {
    Membership(MembershipContext),
    Probe(ProbeContext),
}

impl PathContext {
    pub fn membership(word: Arc<[Symbol]>, alphabet: Arc<Alphabet>) -> Self {
        Self::Membership(MembershipContext::new(word, alphabet))
    }

    pub fn probe(prefix: Arc<[Symbol]>, alphabet: Arc<Alphabet>) -> Self {
        Self::Probe(ProbeContext::new(prefix, alphabet))
    }

    pub fn kind(&self) -> QueryKind {
        match self {
            Self::Membership(_) => QueryKind::Membership,
            Self::Probe(_) => QueryKind::Probe,
        }
    }

    pub fn query(&self) -> &QueryContext {
        match self {
            Self::Membership(ctx) => ctx.context(),
            Self::Probe(ctx) => ctx.context(),
        }
    }

    pub fn query_mut(&mut self) -> &mut QueryContext {
        match self {
            Self::Membership(ctx) => ctx.context_mut(),
            Self::Probe(ctx) => ctx.context_mut(),
        }
    }

    /// Membership-complete for membership contexts, prefix-complete for probe contexts.
    pub fn is_done_consuming(&self) -> bool {
        match self {
            Self::Membership(ctx) => ctx.is_done_membership(),
            Self::Probe(ctx) => ctx.is_done_prefix(),
        }
    }

    pub fn done_probing(&self) -> bool {
        self.query().done_probing()
    }

    pub fn probing_pending(&self) -> bool {
        self.query().probing_pending()
    }

    pub fn probed_symbol(&self) -> Option<&Symbol> {
        self.query().probed_symbol()
    }

    pub fn begin_probing(&mut self) -> bool {
        self.query_mut().begin_probing()
    }

    pub fn mark_deadended(&mut self) {
        self.query_mut().mark_deadended()
    }

    pub fn collect_pending_probe(&mut self) {
        self.query_mut().collect_pending_probe()
    }
}
