use std::collections::BTreeMap;

use crate::context::PathContext;
use crate::engine::{HookAction, Intercept, PathId, PathObserver};
use crate::hook::SymbolHook;

/// Query contexts of every path in the population, keyed by path id.
#[derive(Clone, Debug, Default)]
pub struct PathContexts {
    contexts: BTreeMap<PathId, PathContext>,
}

impl PathContexts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a fresh context to an entry path, replacing any previous contents.
    pub fn seed(&mut self, path: PathId, context: PathContext) {
        self.contexts.clear();
        self.contexts.insert(path, context);
    }

    pub fn get(&self, path: PathId) -> Option<&PathContext> {
        self.contexts.get(&path)
    }

    pub fn get_mut(&mut self, path: PathId) -> Option<&mut PathContext> {
        self.contexts.get_mut(&path)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Contexts of the given paths. Paths without a context are skipped.
    pub fn iter_for<'a>(
        &'a self,
        paths: &'a [PathId],
    ) -> impl Iterator<Item = (PathId, &'a PathContext)> + 'a {
        paths
            .iter()
            .filter_map(|&path| self.contexts.get(&path).map(|context| (path, context)))
    }

    /// True if every listed path has a context satisfying the predicate. Paths without a context
    /// do not participate in the query and are ignored.
    pub fn all(&self, paths: &[PathId], predicate: impl Fn(&PathContext) -> bool) -> bool {
        self.iter_for(paths).all(|(_, context)| predicate(context))
    }

    pub fn any(&self, paths: &[PathId], predicate: impl Fn(&PathContext) -> bool) -> bool {
        self.iter_for(paths).any(|(_, context)| predicate(context))
    }
}

impl PathObserver for PathContexts {
    fn forked(&mut self, parent: PathId, child: PathId) {
        match self.contexts.get(&parent).cloned() {
            Some(context) => {
                tracing::trace!(%parent, %child, "path forked");
                self.contexts.insert(child, context);
            }
            None => tracing::warn!(%parent, %child, "forked path has no query context"),
        }
    }

    fn intercepted(
        &mut self,
        path: PathId,
        hook: SymbolHook,
        intercept: Intercept<'_>,
    ) -> HookAction {
        let Some(context) = self.contexts.get_mut(&path) else {
            tracing::warn!(%path, ?hook, "intercepted path has no query context");
            return HookAction::Continue;
        };

        let before = context.query().phase();
        let action = hook.invoke(context, intercept);
        let after = context.query().phase();
        if before != after {
            tracing::trace!(%path, ?before, ?after, "query phase changed");
        }

        action
    }

    fn deadended(&mut self, path: PathId) {
        if let Some(context) = self.contexts.get_mut(&path) {
            context.mark_deadended();
            tracing::trace!(%path, phase = ?context.query().phase(), "path deadended");
        }
    }
}
