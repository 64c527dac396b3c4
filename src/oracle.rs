//! Abstract constraint oracle.
//!
//! The encoder and the query driver only talk to the oracle through [`Oracle`]:
//! named Boolean atoms, formula construction, an assertion stack with scoped
//! push/pop, and satisfiability checks under assumptions.

use std::collections::BTreeMap;
use std::fmt::Debug;

use num_bigint::BigUint;

use crate::error::OracleError;

/// Result of a satisfiability check.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SatResult {
    Sat,
    Unsat,
}

/// Truth values of the atoms, keyed by atom name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    pub values: BTreeMap<String, bool>,
}

impl Model {
    pub fn get(&self, name: &str) -> Option<bool> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub trait Oracle {
    /// Handle to a formula owned by the oracle.
    type Formula: Copy + Eq + Debug;

    /// Get the atom with the given name, creating it on first use.
    fn atom(&mut self, name: &str) -> Self::Formula;

    fn constant(&mut self, value: bool) -> Self::Formula;

    fn not(&mut self, f: Self::Formula) -> Self::Formula;

    /// Conjunction; empty input is `true`.
    fn and(&mut self, fs: &[Self::Formula]) -> Self::Formula;

    /// Disjunction; empty input is `false`.
    fn or(&mut self, fs: &[Self::Formula]) -> Self::Formula;

    fn iff(&mut self, a: Self::Formula, b: Self::Formula) -> Self::Formula;

    /// Exactly `k` of `fs` hold.
    fn exactly(&mut self, fs: &[Self::Formula], k: usize) -> Result<Self::Formula, OracleError>;

    /// Add a constraint to the current scope.
    fn assert(&mut self, f: Self::Formula) -> Result<(), OracleError>;

    /// Open a new assertion scope.
    fn push(&mut self) -> Result<(), OracleError>;

    /// Discard the innermost scope and everything asserted in it.
    fn pop(&mut self) -> Result<(), OracleError>;

    /// Number of open scopes above the base.
    fn depth(&self) -> usize;

    /// Check the asserted constraints together with `assumptions`.
    ///
    /// Assumptions hold for this call only. On `Sat`, [`model`][Oracle::model]
    /// returns the witness until the next check.
    fn check_assuming(&mut self, assumptions: &[Self::Formula]) -> Result<SatResult, OracleError>;

    fn check(&mut self) -> Result<SatResult, OracleError> {
        self.check_assuming(&[])
    }

    /// Witness of the last successful check.
    fn model(&self) -> Option<&Model>;
}

/// Oracles that can count the models of their constraint system.
pub trait ModelCounter: Oracle {
    /// Number of assignments to all atoms satisfying the assertions and `assumptions`.
    fn count_models(&mut self, assumptions: &[Self::Formula]) -> Result<BigUint, OracleError>;
}
