//! Boolean encoding of the supremal controllable non-blocking behaviour.
//!
//! Every (component, local state) pair owns four atoms:
//!
//! - `x`: the local state is retained by the supervisor,
//! - `m`: the local state is marked,
//! - `c`: the local state can reach a retained marked configuration,
//! - `t`: the local state is forbidden.
//!
//! A global state `s` reads these atoms at its coordinates: `X(s)`, `M(s)` and
//! `C(s)` are conjunctions over all components, while `T(s)` is a disjunction,
//! since one forbidden component already makes the configuration forbidden.
//! For every global state two equivalences are asserted:
//!
//! ```text
//! C(s)  <=>  (M(s) & X(s))  |  OR { C(s') & X(s')  :  s' in succ(s) }
//! ~X(s) <=>  T(s)  |  ~C(s)  |  OR { ~X(s')  :  s' in succU(s) }
//! ```
//!
//! The `m` and `t` atoms are not asserted; they are pinned through
//! [`Encoding::assumptions`], one literal per local atom.

use std::fmt;

use log::{debug, info};

use crate::error::Result;
use crate::oracle::Oracle;
use crate::product::{GlobalState, SynchronizedProduct};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AtomKind {
    Retained,
    Marked,
    Coreachable,
    Forbidden,
}

impl AtomKind {
    pub const ALL: [AtomKind; 4] = [
        AtomKind::Retained,
        AtomKind::Marked,
        AtomKind::Coreachable,
        AtomKind::Forbidden,
    ];

    pub fn prefix(self) -> char {
        match self {
            AtomKind::Retained => 'x',
            AtomKind::Marked => 'm',
            AtomKind::Coreachable => 'c',
            AtomKind::Forbidden => 't',
        }
    }
}

impl fmt::Display for AtomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Name of the atom of `kind` for local state `state` of component `component`.
pub fn atom_name(kind: AtomKind, component: usize, state: &str) -> String {
    format!("{}_{}_{}", kind.prefix(), component, state)
}

/// The four atoms of one local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomSet<T> {
    pub retained: T,
    pub marked: T,
    pub coreachable: T,
    pub forbidden: T,
}

impl<T> AtomSet<T> {
    pub fn get(&self, kind: AtomKind) -> &T {
        match kind {
            AtomKind::Retained => &self.retained,
            AtomKind::Marked => &self.marked,
            AtomKind::Coreachable => &self.coreachable,
            AtomKind::Forbidden => &self.forbidden,
        }
    }
}

/// The constraint system as handed to the oracle.
#[derive(Debug, Clone)]
pub struct Encoding<F> {
    /// `atoms[component][local]`
    atoms: Vec<Vec<AtomSet<F>>>,
    names: Vec<Vec<AtomSet<String>>>,
    assumptions: Vec<F>,
    num_constraints: usize,
}

impl<F: Copy> Encoding<F> {
    pub fn atoms(&self, component: usize, local: usize) -> Option<&AtomSet<F>> {
        self.atoms.get(component)?.get(local)
    }

    pub fn names(&self, component: usize, local: usize) -> Option<&AtomSet<String>> {
        self.names.get(component)?.get(local)
    }

    /// Literals fixing every `m` and `t` atom to the automata's static data.
    pub fn assumptions(&self) -> &[F] {
        &self.assumptions
    }

    /// Number of equivalences asserted (two per global state).
    pub fn num_constraints(&self) -> usize {
        self.num_constraints
    }

    /// All atoms of one kind, component by component.
    pub fn atoms_of(&self, kind: AtomKind) -> Vec<F> {
        self.atoms.iter().flatten().map(|set| *set.get(kind)).collect()
    }

    /// Atoms of `kind` at the coordinates of `state`.
    ///
    /// # Panics
    ///
    /// Panics if `state` does not fit the encoded product.
    pub fn at(&self, kind: AtomKind, state: &GlobalState) -> Vec<F> {
        state
            .coords()
            .iter()
            .enumerate()
            .map(|(i, &s)| *self.atoms[i][s].get(kind))
            .collect()
    }
}

/// Walks the product once and asserts the fixpoint equations.
///
/// [`encode`][FixpointEncoder::encode] consumes the encoder: encoding the same
/// product twice into one oracle would only duplicate constraints.
pub struct FixpointEncoder<'a> {
    product: &'a SynchronizedProduct,
}

impl<'a> FixpointEncoder<'a> {
    pub fn new(product: &'a SynchronizedProduct) -> Self {
        Self { product }
    }

    pub fn encode<O: Oracle>(self, oracle: &mut O) -> Result<Encoding<O::Formula>> {
        let product = self.product;
        info!(
            "Encoding {} global states over {} local states",
            product.size(),
            product.num_local_states()
        );

        let mut atoms = Vec::with_capacity(product.num_components());
        let mut names = Vec::with_capacity(product.num_components());
        let mut assumptions = Vec::new();

        for (i, component) in product.components().iter().enumerate() {
            let mut component_atoms = Vec::with_capacity(component.num_states());
            let mut component_names = Vec::with_capacity(component.num_states());
            for (s, state) in component.states().enumerate() {
                let set_names = AtomSet {
                    retained: atom_name(AtomKind::Retained, i, state),
                    marked: atom_name(AtomKind::Marked, i, state),
                    coreachable: atom_name(AtomKind::Coreachable, i, state),
                    forbidden: atom_name(AtomKind::Forbidden, i, state),
                };
                let set = AtomSet {
                    retained: oracle.atom(&set_names.retained),
                    marked: oracle.atom(&set_names.marked),
                    coreachable: oracle.atom(&set_names.coreachable),
                    forbidden: oracle.atom(&set_names.forbidden),
                };

                let marked = if component.is_marked(s) {
                    set.marked
                } else {
                    oracle.not(set.marked)
                };
                let forbidden = if component.is_unsafe(s) {
                    set.forbidden
                } else {
                    oracle.not(set.forbidden)
                };
                assumptions.push(marked);
                assumptions.push(forbidden);

                component_atoms.push(set);
                component_names.push(set_names);
            }
            atoms.push(component_atoms);
            names.push(component_names);
        }

        let mut encoding = Encoding {
            atoms,
            names,
            assumptions,
            num_constraints: 0,
        };

        for state in product.states() {
            let x = conj(oracle, &encoding, AtomKind::Retained, &state);
            let m = conj(oracle, &encoding, AtomKind::Marked, &state);
            let c = conj(oracle, &encoding, AtomKind::Coreachable, &state);
            let forbidden = encoding.at(AtomKind::Forbidden, &state);
            let t = oracle.or(&forbidden);

            // Co-reachability
            let mut reach = vec![oracle.and(&[m, x])];
            for next in product.successors(&state) {
                let c_next = conj(oracle, &encoding, AtomKind::Coreachable, &next);
                let x_next = conj(oracle, &encoding, AtomKind::Retained, &next);
                reach.push(oracle.and(&[c_next, x_next]));
            }
            let reach = oracle.or(&reach);
            let equation = oracle.iff(c, reach);
            oracle.assert(equation)?;

            // Retention
            let not_c = oracle.not(c);
            let mut exclusion = vec![t, not_c];
            for next in product.uncontrollable_successors(&state) {
                let x_next = conj(oracle, &encoding, AtomKind::Retained, &next);
                exclusion.push(oracle.not(x_next));
            }
            let exclusion = oracle.or(&exclusion);
            let not_x = oracle.not(x);
            let equation = oracle.iff(not_x, exclusion);
            oracle.assert(equation)?;

            encoding.num_constraints += 2;
            debug!("encoded state {}", state);
        }

        info!(
            "Encoded {} constraints and {} fixed assumptions",
            encoding.num_constraints,
            encoding.assumptions.len()
        );
        Ok(encoding)
    }
}

/// Conjunction of the `kind` atoms at the coordinates of `state`.
fn conj<O: Oracle>(oracle: &mut O, encoding: &Encoding<O::Formula>, kind: AtomKind, state: &GlobalState) -> O::Formula {
    let atoms = encoding.at(kind, state);
    oracle.and(&atoms)
}
