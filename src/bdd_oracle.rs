//! [`Oracle`] implementation backed by the [`Bdd`] manager.
//!
//! Every scope of the assertion stack is a single diagram: the conjunction of
//! everything asserted so far. Checking conjoins the assumptions with the top
//! scope, and satisfiability is then a comparison against the zero terminal.

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use log::{debug, info};
use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::error::OracleError;
use crate::oracle::{Model, ModelCounter, Oracle, SatResult};
use crate::reference::Ref;

/// Resource settings for [`BddOracle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleConfig {
    /// Initial node capacity, as `2^storage_bits`.
    pub storage_bits: usize,
    /// Fail with [`OracleError::ResourceExhausted`] once the manager holds more nodes.
    pub max_nodes: Option<usize>,
    /// Fail with [`OracleError::Timeout`] once this much time has passed since
    /// construction or the last [`BddOracle::reset_deadline`].
    pub timeout: Option<Duration>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            storage_bits: 16,
            max_nodes: None,
            timeout: None,
        }
    }
}

pub struct BddOracle {
    bdd: Bdd,
    config: OracleConfig,
    /// Atom name to its variable node; variable id is position + 1.
    atoms: IndexMap<String, Ref>,
    /// `frames[0]` is the base scope.
    frames: Vec<Ref>,
    model: Option<Model>,
    started: Instant,
}

impl BddOracle {
    pub fn new(config: OracleConfig) -> Self {
        let bdd = Bdd::new(config.storage_bits);
        let base = bdd.one;
        Self {
            bdd,
            config,
            atoms: IndexMap::new(),
            frames: vec![base],
            model: None,
            started: Instant::now(),
        }
    }

    pub fn bdd(&self) -> &Bdd {
        &self.bdd
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// Restart the clock the timeout is measured against.
    pub fn reset_deadline(&mut self) {
        self.started = Instant::now();
    }

    /// Conjunction of all constraints visible in the current scope.
    pub fn constraints(&self) -> Ref {
        *self.frames.last().expect("base scope is never popped")
    }

    fn top_mut(&mut self) -> &mut Ref {
        self.frames.last_mut().expect("base scope is never popped")
    }

    fn guard(&self) -> Result<(), OracleError> {
        if let Some(limit) = self.config.max_nodes {
            let nodes = self.bdd.num_nodes();
            if nodes > limit {
                return Err(OracleError::ResourceExhausted { nodes, limit });
            }
        }
        if let Some(limit) = self.config.timeout {
            let elapsed = self.started.elapsed();
            if elapsed >= limit {
                return Err(OracleError::Timeout { elapsed, limit });
            }
        }
        Ok(())
    }

    fn constrained(&self, assumptions: &[Ref]) -> Ref {
        let top = self.constraints();
        self.bdd.apply_and_many(std::iter::once(top).chain(assumptions.iter().copied()))
    }
}

impl Default for BddOracle {
    fn default() -> Self {
        BddOracle::new(OracleConfig::default())
    }
}

impl Oracle for BddOracle {
    type Formula = Ref;

    fn atom(&mut self, name: &str) -> Ref {
        if let Some(&node) = self.atoms.get(name) {
            return node;
        }
        let v = self.atoms.len() as u32 + 1;
        let node = self.bdd.mk_var(v);
        debug!("atom `{}` is x{}", name, v);
        self.atoms.insert(name.to_string(), node);
        node
    }

    fn constant(&mut self, value: bool) -> Ref {
        if value {
            self.bdd.one
        } else {
            self.bdd.zero
        }
    }

    fn not(&mut self, f: Ref) -> Ref {
        self.bdd.apply_not(f)
    }

    fn and(&mut self, fs: &[Ref]) -> Ref {
        self.bdd.apply_and_many(fs.iter().copied())
    }

    fn or(&mut self, fs: &[Ref]) -> Ref {
        self.bdd.apply_or_many(fs.iter().copied())
    }

    fn iff(&mut self, a: Ref, b: Ref) -> Ref {
        self.bdd.apply_eq(a, b)
    }

    fn exactly(&mut self, fs: &[Ref], k: usize) -> Result<Ref, OracleError> {
        let f = self.bdd.mk_exactly(fs, k);
        self.guard()?;
        Ok(f)
    }

    fn assert(&mut self, f: Ref) -> Result<(), OracleError> {
        let top = self.constraints();
        let res = self.bdd.apply_and(top, f);
        *self.top_mut() = res;
        self.guard()
    }

    fn push(&mut self) -> Result<(), OracleError> {
        let top = self.constraints();
        self.frames.push(top);
        Ok(())
    }

    fn pop(&mut self) -> Result<(), OracleError> {
        if self.frames.len() == 1 {
            return Err(OracleError::ScopeUnderflow);
        }
        self.frames.pop();
        Ok(())
    }

    fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    fn check_assuming(&mut self, assumptions: &[Ref]) -> Result<SatResult, OracleError> {
        self.model = None;
        self.guard()?;

        let f = self.constrained(assumptions);
        self.guard()?;

        let Some(values) = self.bdd.max_sat(f, self.atoms.len()) else {
            info!("check({} assumptions) -> UNSAT", assumptions.len());
            return Ok(SatResult::Unsat);
        };

        let values = self.atoms.keys().cloned().zip(values).collect();
        self.model = Some(Model { values });
        info!(
            "check({} assumptions) -> SAT (diagram of {} nodes)",
            assumptions.len(),
            self.bdd.size(f)
        );
        Ok(SatResult::Sat)
    }

    fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }
}

impl ModelCounter for BddOracle {
    fn count_models(&mut self, assumptions: &[Ref]) -> Result<BigUint, OracleError> {
        self.guard()?;
        let f = self.constrained(assumptions);
        self.guard()?;
        Ok(self.bdd.sat_count(f, self.atoms.len()))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_atoms_are_keyed_by_name() {
        let mut oracle = BddOracle::default();

        let a = oracle.atom("a");
        let b = oracle.atom("b");
        assert_ne!(a, b);
        assert_eq!(oracle.atom("a"), a);
        assert_eq!(oracle.num_atoms(), 2);
    }

    #[test]
    fn test_check_and_model() {
        let mut oracle = BddOracle::default();

        let a = oracle.atom("a");
        let b = oracle.atom("b");
        let not_b = oracle.not(b);
        let f = oracle.and(&[a, not_b]);
        oracle.assert(f).unwrap();

        assert_eq!(oracle.check().unwrap(), SatResult::Sat);
        let model = oracle.model().unwrap();
        assert_eq!(model.get("a"), Some(true));
        assert_eq!(model.get("b"), Some(false));
        assert_eq!(model.get("c"), None);
    }

    #[test]
    fn test_assumptions_are_temporary() {
        let mut oracle = BddOracle::default();

        let a = oracle.atom("a");
        let b = oracle.atom("b");
        let f = oracle.iff(a, b);
        oracle.assert(f).unwrap();

        let not_b = oracle.not(b);
        assert_eq!(oracle.check_assuming(&[a, not_b]).unwrap(), SatResult::Unsat);
        assert!(oracle.model().is_none());
        assert_eq!(oracle.check_assuming(&[not_b]).unwrap(), SatResult::Sat);
        assert_eq!(oracle.model().unwrap().get("a"), Some(false));
        assert_eq!(oracle.check().unwrap(), SatResult::Sat);
        // unconstrained choice is resolved towards `true`
        assert_eq!(oracle.model().unwrap().get("a"), Some(true));
    }

    #[test]
    fn test_push_pop() {
        let mut oracle = BddOracle::default();

        let a = oracle.atom("a");
        let not_a = oracle.not(a);
        oracle.assert(a).unwrap();

        oracle.push().unwrap();
        assert_eq!(oracle.depth(), 1);
        oracle.assert(not_a).unwrap();
        assert_eq!(oracle.check().unwrap(), SatResult::Unsat);
        oracle.pop().unwrap();

        assert_eq!(oracle.depth(), 0);
        assert_eq!(oracle.check().unwrap(), SatResult::Sat);
        assert_eq!(oracle.pop(), Err(OracleError::ScopeUnderflow));
    }

    #[test]
    fn test_exactly() {
        let mut oracle = BddOracle::default();

        let atoms: Vec<Ref> = ["a", "b", "c"].iter().map(|n| oracle.atom(n)).collect();
        let two = oracle.exactly(&atoms, 2).unwrap();
        oracle.assert(two).unwrap();
        let not_a = oracle.not(atoms[0]);
        assert_eq!(oracle.check_assuming(&[not_a]).unwrap(), SatResult::Sat);
        let model = oracle.model().unwrap();
        assert_eq!(model.get("b"), Some(true));
        assert_eq!(model.get("c"), Some(true));
        assert_eq!(oracle.count_models(&[]).unwrap(), BigUint::from(3u32));
    }

    #[test]
    fn test_node_limit() {
        let mut oracle = BddOracle::new(OracleConfig {
            max_nodes: Some(2),
            ..OracleConfig::default()
        });

        let atoms: Vec<Ref> = (0..4).map(|i| oracle.atom(&format!("v{}", i))).collect();
        let f = oracle.or(&atoms);
        let err = oracle.assert(f).unwrap_err();
        assert!(matches!(err, OracleError::ResourceExhausted { limit: 2, .. }));
        assert!(matches!(oracle.check(), Err(OracleError::ResourceExhausted { .. })));
    }

    #[test]
    fn test_timeout() {
        let mut oracle = BddOracle::new(OracleConfig {
            timeout: Some(Duration::ZERO),
            ..OracleConfig::default()
        });

        let a = oracle.atom("a");
        assert!(matches!(oracle.assert(a), Err(OracleError::Timeout { .. })));
        assert!(matches!(oracle.check(), Err(OracleError::Timeout { .. })));
    }

    #[test]
    fn test_count_models() {
        let mut oracle = BddOracle::default();

        let a = oracle.atom("a");
        let b = oracle.atom("b");
        let _c = oracle.atom("c");
        let f = oracle.or(&[a, b]);
        oracle.assert(f).unwrap();
        assert_eq!(oracle.count_models(&[]).unwrap(), BigUint::from(6u32));
        assert_eq!(oracle.count_models(&[a]).unwrap(), BigUint::from(4u32));
    }
}
