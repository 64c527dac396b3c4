//! Queries against an encoded product.
//!
//! The driver always passes the encoding's fixed `m`/`t` literals as
//! assumptions, so the assertion stack only ever holds the fixpoint equations
//! plus whatever a scoped query adds temporarily.

use std::fmt;

use log::info;
use num_bigint::BigUint;

use crate::encoder::{AtomKind, Encoding};
use crate::error::{Error, Result};
use crate::oracle::{Model, ModelCounter, Oracle, SatResult};
use crate::product::{GlobalState, SynchronizedProduct};

/// Truth values of the four atoms of one local state.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LocalValues {
    pub retained: bool,
    pub marked: bool,
    pub coreachable: bool,
    pub forbidden: bool,
}

/// Per-component, per-local-state witness of a satisfiable query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    components: Vec<String>,
    states: Vec<Vec<String>>,
    values: Vec<Vec<LocalValues>>,
}

impl Assignment {
    /// Build an assignment by evaluating `f(component, local)` for every local state.
    pub fn from_fn(product: &SynchronizedProduct, mut f: impl FnMut(usize, usize) -> LocalValues) -> Self {
        let components = product.components();
        Self {
            components: components.iter().map(|c| c.name().to_string()).collect(),
            states: components
                .iter()
                .map(|c| c.states().map(str::to_string).collect())
                .collect(),
            values: components
                .iter()
                .enumerate()
                .map(|(i, c)| (0..c.num_states()).map(|s| f(i, s)).collect())
                .collect(),
        }
    }

    /// Read the values of every encoded atom from `model`.
    pub fn from_model<F: Copy>(product: &SynchronizedProduct, encoding: &Encoding<F>, model: &Model) -> Result<Self> {
        let lookup = |component: usize, local: usize, kind: AtomKind| -> Result<bool> {
            let names = encoding.names(component, local).ok_or(Error::LocalIndexOutOfRange {
                component,
                index: local,
                size: product.components().get(component).map_or(0, |c| c.num_states()),
            })?;
            let name = names.get(kind);
            model.get(name).ok_or_else(|| Error::IncompleteModel { atom: name.clone() })
        };

        let mut values = Vec::with_capacity(product.num_components());
        for (i, c) in product.components().iter().enumerate() {
            let mut row = Vec::with_capacity(c.num_states());
            for s in 0..c.num_states() {
                row.push(LocalValues {
                    retained: lookup(i, s, AtomKind::Retained)?,
                    marked: lookup(i, s, AtomKind::Marked)?,
                    coreachable: lookup(i, s, AtomKind::Coreachable)?,
                    forbidden: lookup(i, s, AtomKind::Forbidden)?,
                });
            }
            values.push(row);
        }

        let mut assignment = Assignment::from_fn(product, |_, _| LocalValues::default());
        assignment.values = values;
        Ok(assignment)
    }

    pub fn get(&self, component: usize, local: usize) -> Option<LocalValues> {
        self.values.get(component)?.get(local).copied()
    }

    /// Values for a local state given by name.
    pub fn by_name(&self, component: usize, state: &str) -> Option<LocalValues> {
        let local = self.states.get(component)?.iter().position(|s| s == state)?;
        self.get(component, local)
    }

    /// `(component, local, values)` for every local state.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, LocalValues)> + '_ {
        self.values
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().enumerate().map(move |(s, &v)| (i, s, v)))
    }

    pub fn retained_count(&self) -> usize {
        self.iter().filter(|(_, _, v)| v.retained).count()
    }

    pub fn coreachable_count(&self) -> usize {
        self.iter().filter(|(_, _, v)| v.coreachable).count()
    }

    /// Every local state is retained.
    pub fn retains_all(&self) -> bool {
        self.iter().all(|(_, _, v)| v.retained)
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bit = |b: bool| if b { 1 } else { 0 };
        for (i, row) in self.values.iter().enumerate() {
            writeln!(f, "{}:", self.components[i])?;
            for (s, v) in row.iter().enumerate() {
                writeln!(
                    f,
                    "  {:<8} x={} m={} c={} t={}",
                    self.states[i][s],
                    bit(v.retained),
                    bit(v.marked),
                    bit(v.coreachable),
                    bit(v.forbidden)
                )?;
            }
        }
        Ok(())
    }
}

/// Answer to a query: a witness, or the sentinel for "no such behaviour".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Unsatisfiable,
    Satisfiable(Assignment),
}

impl Verdict {
    pub fn is_sat(&self) -> bool {
        matches!(self, Verdict::Satisfiable(_))
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            Verdict::Satisfiable(assignment) => Some(assignment),
            Verdict::Unsatisfiable => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Unsatisfiable => write!(f, "UNSAT"),
            Verdict::Satisfiable(_) => write!(f, "SAT"),
        }
    }
}

/// One cell of [`QueryDriver::enumerate_by_cardinality`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardinalityOutcome {
    /// Exact number of true `x` atoms.
    pub retained: usize,
    /// Exact number of true `c` atoms.
    pub coreachable: usize,
    pub verdict: Verdict,
}

pub struct QueryDriver<'a, O: Oracle> {
    oracle: &'a mut O,
    product: &'a SynchronizedProduct,
    encoding: &'a Encoding<O::Formula>,
}

impl<'a, O: Oracle> QueryDriver<'a, O> {
    pub fn new(oracle: &'a mut O, product: &'a SynchronizedProduct, encoding: &'a Encoding<O::Formula>) -> Self {
        Self {
            oracle,
            product,
            encoding,
        }
    }

    pub fn oracle(&mut self) -> &mut O {
        &mut *self.oracle
    }

    fn assumptions(&self, extra: &[O::Formula]) -> Vec<O::Formula> {
        let mut all = self.encoding.assumptions().to_vec();
        all.extend_from_slice(extra);
        all
    }

    /// `X(state)`: every coordinate of `state` is retained.
    pub fn retained(&mut self, state: &GlobalState) -> Result<O::Formula> {
        self.product.validate(state)?;
        let atoms = self.encoding.at(AtomKind::Retained, state);
        Ok(self.oracle.and(&atoms))
    }

    /// Satisfiability under the fixed assumptions plus `extra`.
    pub fn check(&mut self, extra: &[O::Formula]) -> Result<Verdict> {
        let assumptions = self.assumptions(extra);
        match self.oracle.check_assuming(&assumptions)? {
            SatResult::Unsat => Ok(Verdict::Unsatisfiable),
            SatResult::Sat => {
                let model = self
                    .oracle
                    .model()
                    .ok_or_else(|| Error::IncompleteModel { atom: "<no model>".to_string() })?;
                let assignment = Assignment::from_model(self.product, self.encoding, model)?;
                Ok(Verdict::Satisfiable(assignment))
            }
        }
    }

    /// Is there a controllable non-blocking behaviour that retains `state`?
    pub fn is_controllable_from(&mut self, state: &GlobalState) -> Result<Verdict> {
        let x = self.retained(state)?;
        let verdict = self.check(&[x])?;
        info!("controllable from {}: {}", state, verdict);
        Ok(verdict)
    }

    /// Is there a solution of the equations that excludes `state`?
    pub fn excludes(&mut self, state: &GlobalState) -> Result<Verdict> {
        let x = self.retained(state)?;
        let not_x = self.oracle.not(x);
        let verdict = self.check(&[not_x])?;
        info!("excludable {}: {}", state, verdict);
        Ok(verdict)
    }

    /// Does the constraint system accept these `x` and `c` values?
    ///
    /// Marked and forbidden values of `assignment` are ignored; the fixed
    /// assumptions decide them.
    pub fn verify(&mut self, assignment: &Assignment) -> Result<bool> {
        let mut pinned = Vec::new();
        for (i, s, values) in assignment.iter() {
            let atoms = *self.encoding.atoms(i, s).ok_or(Error::LocalIndexOutOfRange {
                component: i,
                index: s,
                size: self.product.components().get(i).map_or(0, |c| c.num_states()),
            })?;
            for (atom, value) in [(atoms.retained, values.retained), (atoms.coreachable, values.coreachable)] {
                pinned.push(if value { atom } else { self.oracle.not(atom) });
            }
        }
        Ok(self.check(&pinned)?.is_sat())
    }

    /// Run `f` inside a fresh assertion scope which is popped on every exit path.
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        self.oracle.push()?;
        let res = f(self);
        let popped = self.oracle.pop();
        let value = res?;
        popped?;
        Ok(value)
    }

    /// Check every pair of exact counts `(#x, #c)` in `0..=slots`.
    ///
    /// `slots` is the number of local states over all components. Each pair is
    /// checked in its own scope under `extra` and the fixed assumptions.
    pub fn enumerate_by_cardinality(&mut self, extra: &[O::Formula]) -> Result<Vec<CardinalityOutcome>> {
        let slots = self.product.num_local_states();
        let xs = self.encoding.atoms_of(AtomKind::Retained);
        let cs = self.encoding.atoms_of(AtomKind::Coreachable);

        let mut outcomes = Vec::with_capacity((slots + 1) * (slots + 1));
        for retained in 0..=slots {
            for coreachable in 0..=slots {
                let verdict = self.scoped(|driver| {
                    let exactly_x = driver.oracle.exactly(&xs, retained)?;
                    driver.oracle.assert(exactly_x)?;
                    let exactly_c = driver.oracle.exactly(&cs, coreachable)?;
                    driver.oracle.assert(exactly_c)?;
                    driver.check(extra)
                })?;
                info!("cardinality x={} c={}: {}", retained, coreachable, verdict);
                outcomes.push(CardinalityOutcome {
                    retained,
                    coreachable,
                    verdict,
                });
            }
        }
        Ok(outcomes)
    }
}

impl<O: ModelCounter> QueryDriver<'_, O> {
    /// Number of solutions of the equations under the fixed assumptions.
    pub fn count_models(&mut self) -> Result<BigUint> {
        let assumptions = self.assumptions(&[]);
        Ok(self.oracle.count_models(&assumptions)?)
    }
}
