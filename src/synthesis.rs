//! Explicit supervisor synthesis over the enumerated product.
//!
//! This computes the greatest set of safe global states that is closed under
//! uncontrollable steps and from which every state can still reach a marked
//! state without leaving the set:
//!
//! ```text
//! νZ. safe ∧ E[Z U (Z ∧ marked)] ∧ AX_u Z
//! ```
//!
//! The outer greatest fixpoint alternates a least fixpoint (co-reachability
//! within `Z`) with the controllability cut. The result solves the equations
//! produced by [`FixpointEncoder`][crate::encoder::FixpointEncoder] for
//! single-component plants, so [`Supervisor::to_assignment`] can be handed to
//! [`QueryDriver::verify`][crate::query::QueryDriver::verify].

use std::collections::BTreeSet;

use log::{debug, info};

use crate::product::{GlobalState, SynchronizedProduct};
use crate::query::{Assignment, LocalValues};

/// The retained global states of a synthesized supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Supervisor {
    retained: BTreeSet<GlobalState>,
    iterations: usize,
}

impl Supervisor {
    pub fn contains(&self, state: &GlobalState) -> bool {
        self.retained.contains(state)
    }

    pub fn len(&self) -> usize {
        self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    pub fn retained(&self) -> &BTreeSet<GlobalState> {
        &self.retained
    }

    /// Number of rounds of the outer fixpoint.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Project onto per-component atom values.
    ///
    /// A local state is retained iff it is a coordinate of some retained global
    /// state, and co-reachable iff it is a coordinate of some global state that
    /// is retained and marked or has a retained successor.
    pub fn to_assignment(&self, product: &SynchronizedProduct) -> Assignment {
        let n = product.num_components();
        let mut retained = vec![BTreeSet::new(); n];
        let mut coreachable = vec![BTreeSet::new(); n];

        for state in product.states() {
            let kept = self.contains(&state);
            let co = (kept && product.is_marked(&state))
                || product.successors(&state).iter().any(|t| self.contains(t));
            for (i, &local) in state.coords().iter().enumerate() {
                if kept {
                    retained[i].insert(local);
                }
                if co {
                    coreachable[i].insert(local);
                }
            }
        }

        let components = product.components();
        Assignment::from_fn(product, |i, s| LocalValues {
            retained: retained[i].contains(&s),
            marked: components[i].is_marked(s),
            coreachable: coreachable[i].contains(&s),
            forbidden: components[i].is_unsafe(s),
        })
    }
}

/// States of `within` that can reach a marked state of `within` staying inside it.
///
/// Least fixpoint: µZ. (within ∧ marked) ∨ (within ∧ EX Z)
fn coreachable(product: &SynchronizedProduct, within: &BTreeSet<GlobalState>) -> BTreeSet<GlobalState> {
    let mut z: BTreeSet<GlobalState> = within.iter().filter(|s| product.is_marked(s)).cloned().collect();

    loop {
        let new: Vec<GlobalState> = within
            .iter()
            .filter(|s| !z.contains(*s))
            .filter(|s| product.successors(s).iter().any(|t| z.contains(t)))
            .cloned()
            .collect();

        if new.is_empty() {
            return z;
        }
        z.extend(new);
    }
}

/// Compute the maximally permissive safe, controllable and non-blocking supervisor.
pub fn synthesize(product: &SynchronizedProduct) -> Supervisor {
    info!("Synthesizing over {} global states", product.size());

    let mut z: BTreeSet<GlobalState> = product.states().filter(|s| !product.is_unsafe(s)).collect();
    let mut iterations = 0;

    loop {
        iterations += 1;
        let co = coreachable(product, &z);
        let new_z: BTreeSet<GlobalState> = co
            .iter()
            .filter(|s| product.uncontrollable_successors(s).iter().all(|t| co.contains(t)))
            .cloned()
            .collect();
        debug!("round {}: {} -> {} states", iterations, z.len(), new_z.len());

        if new_z == z {
            info!("Supervisor retains {} states after {} rounds", z.len(), iterations);
            return Supervisor { retained: z, iterations };
        }
        z = new_z;
    }
}
