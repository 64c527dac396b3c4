use std::collections::HashMap;

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::reference::Ref;
use crate::types::{Lit, Var};

impl Bdd {
    /// Returns one satisfying assignment for the BDD, if any exists.
    ///
    /// The assignment is returned as a vector of literals along the chosen path;
    /// variables not on the path are unconstrained.
    ///
    /// Returns `None` if the BDD represents the constant false function.
    pub fn one_sat(&self, node: Ref) -> Option<Vec<Lit>> {
        if self.is_zero(node) {
            return None;
        }

        let mut path = Vec::new();
        let mut current = node;

        // Walk down the BDD, always picking a satisfying branch
        while !self.is_one(current) {
            let var = Var::new(self.variable(current.index()));
            let high = self.high_node(current);
            let low = self.low_node(current);

            // Prefer high branch if satisfiable, otherwise take low
            if !self.is_zero(high) {
                path.push(var.pos());
                current = high;
            } else {
                path.push(var.neg());
                current = low;
            }
        }

        Some(path)
    }

    /// Total assignment over variables `1..=num_vars`, maximal w.r.t. the variable order.
    ///
    /// Follows [`one_sat`][Bdd::one_sat] and sets every variable off the path to `true`.
    /// Index `i` of the result holds the value of variable `i + 1`.
    pub fn max_sat(&self, node: Ref, num_vars: usize) -> Option<Vec<bool>> {
        let path = self.one_sat(node)?;
        let mut values = vec![true; num_vars];
        for lit in path {
            let i = lit.var().id() as usize - 1;
            assert!(i < num_vars, "variable {} is outside 1..={}", lit.var(), num_vars);
            values[i] = lit.is_positive();
        }
        Some(values)
    }

    /// Number of satisfying assignments over variables `1..=num_vars`.
    pub fn sat_count(&self, node: Ref, num_vars: usize) -> BigUint {
        let mut cache = HashMap::new();
        let max = BigUint::from(1u32) << num_vars;
        self.sat_count_(node, &max, &mut cache)
    }

    fn sat_count_(&self, node: Ref, max: &BigUint, cache: &mut HashMap<usize, BigUint>) -> BigUint {
        if self.is_zero(node) {
            return BigUint::ZERO;
        } else if self.is_one(node) {
            return max.clone();
        }

        // Counts are cached for the regular node; negation complements.
        let index = node.index();
        let count = if let Some(count) = cache.get(&index) {
            count.clone()
        } else {
            let low = self.sat_count_(self.low(index), max, cache);
            let high = self.sat_count_(self.high(index), max, cache);
            let count: BigUint = (low + high) >> 1;
            cache.insert(index, count.clone());
            count
        };

        if node.is_negated() {
            max - count
        } else {
            count
        }
    }

    /// Cardinality constraint: exactly `k` of `nodes` are true.
    ///
    /// Built bottom-up from `E(i, j) = ite(nodes[i], E(i+1, j-1), E(i+1, j))`.
    pub fn mk_exactly(&self, nodes: &[Ref], k: usize) -> Ref {
        let n = nodes.len();
        if k > n {
            return self.zero;
        }

        // row[j] = "exactly j of nodes[i..] are true"
        let mut row: Vec<Ref> = (0..=k).map(|j| if j == 0 { self.one } else { self.zero }).collect();
        for &f in nodes.iter().rev() {
            let mut next = Vec::with_capacity(k + 1);
            for j in 0..=k {
                let taken = if j == 0 { self.zero } else { row[j - 1] };
                next.push(self.apply_ite(f, taken, row[j]));
            }
            row = next;
        }
        row[k]
    }
}
