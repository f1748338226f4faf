use std::collections::{BTreeMap, BTreeSet};

use crate::program::Var;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Constraint {
    Equals(Var, u8),
    NotEquals(Var, u8),
}

impl Constraint {
    pub fn var(&self) -> Var {
        match self {
            Self::Equals(var, _) | Self::NotEquals(var, _) => *var,
        }
    }
}

/// Conjunction of constraints accumulated along a path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Drop every constraint on `var`.
    pub fn forget(&mut self, var: Var) {
        self.constraints.retain(|constraint| constraint.var() != var);
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    /// Check whether some assignment of bytes to variables satisfies every constraint.
    pub fn is_satisfiable(&self) -> bool {
        #[derive(Default)]
        struct Domain {
            equals: BTreeSet<u8>,
            excluded: BTreeSet<u8>,
        }

        let mut domains: BTreeMap<Var, Domain> = BTreeMap::new();
        for constraint in &self.constraints {
            match *constraint {
                Constraint::Equals(var, value) => {
                    domains.entry(var).or_default().equals.insert(value);
                }
                Constraint::NotEquals(var, value) => {
                    domains.entry(var).or_default().excluded.insert(value);
                }
            }
        }

        domains.values().all(|domain| match domain.equals.len() {
            0 => domain.excluded.len() <= usize::from(u8::MAX),
            1 => domain
                .equals
                .iter()
                .all(|value| !domain.excluded.contains(value)),
            _ => false,
        })
    }

    /// Check satisfiability with an additional constraint without modifying the set.
    pub fn is_satisfiable_with(&self, constraint: Constraint) -> bool {
        let mut extended = self.clone();
        extended.push(constraint);
        extended.is_satisfiable()
    }
}
