//! Reduced ordered BDD manager with complement edges.
//!
//! All diagrams live in one [`Bdd`] manager which hash-conses nodes, so two
//! equivalent functions always get the same [`Ref`]. Negation is free: it
//! only flips the sign of the handle. To keep the representation canonical,
//! the high edge of a stored node is never negated.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;

use log::debug;

use crate::cache::Cache;
use crate::reference::Ref;
use crate::utils::{pairing3, MyHash};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct Node {
    variable: u32,
    low: Ref,
    high: Ref,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct IteKey(Ref, Ref, Ref);

impl MyHash for IteKey {
    fn hash(&self) -> u64 {
        pairing3(self.0.as_lit(), self.1.as_lit(), self.2.as_lit())
    }
}

pub struct Bdd {
    nodes: RefCell<Vec<Node>>,
    unique: RefCell<HashMap<Node, u32>>,
    cache: RefCell<Cache<IteKey, Ref>>,
    pub zero: Ref,
    pub one: Ref,
}

impl Bdd {
    /// Create a manager with room for `2^storage_bits` nodes before reallocation.
    pub fn new(storage_bits: usize) -> Self {
        assert!(storage_bits <= 31, "Storage bits should be in the range 0..=31");

        let cache_bits = storage_bits.min(16);
        let capacity = 1usize << storage_bits;

        let mut nodes = Vec::with_capacity(capacity);
        // Slot 0 is a sentry, slot 1 is the terminal.
        let terminal = Node {
            variable: 0,
            low: Ref::ONE,
            high: Ref::ONE,
        };
        nodes.push(terminal);
        nodes.push(terminal);

        Self {
            nodes: RefCell::new(nodes),
            unique: RefCell::new(HashMap::with_capacity(capacity)),
            cache: RefCell::new(Cache::new(cache_bits)),
            zero: Ref::ZERO,
            one: Ref::ONE,
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new(16)
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.cache.borrow();
        f.debug_struct("Bdd")
            .field("nodes", &self.num_nodes())
            .field("cache_hits", &cache.hits())
            .field("cache_misses", &cache.misses())
            .finish()
    }
}

impl Bdd {
    /// Number of allocated internal nodes (terminal excluded).
    pub fn num_nodes(&self) -> usize {
        self.nodes.borrow().len() - 2
    }

    /// Hits and misses of the computed table.
    pub fn cache_stats(&self) -> (usize, usize) {
        let cache = self.cache.borrow();
        (cache.hits(), cache.misses())
    }

    pub fn variable(&self, index: usize) -> u32 {
        self.nodes.borrow()[index].variable
    }
    pub fn low(&self, index: usize) -> Ref {
        self.nodes.borrow()[index].low
    }
    pub fn high(&self, index: usize) -> Ref {
        self.nodes.borrow()[index].high
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.low(node.index());
        if node.is_negated() {
            -low
        } else {
            low
        }
    }
    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.high(node.index());
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == self.zero
    }
    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        node.index() == 1
    }

    /// Top variable of a non-terminal node, `None` for terminals.
    fn top_var(&self, node: Ref) -> Option<u32> {
        if self.is_terminal(node) {
            None
        } else {
            Some(self.variable(node.index()))
        }
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");

        // Handle canonicity
        if high.is_negated() {
            return -self.mk_node(v, -low, -high);
        }

        // Handle duplicates
        if low == high {
            return low;
        }

        let node = Node {
            variable: v,
            low,
            high,
        };
        if let Some(&index) = self.unique.borrow().get(&node) {
            return Ref::positive(index);
        }

        let mut nodes = self.nodes.borrow_mut();
        let index = nodes.len() as u32;
        nodes.push(node);
        self.unique.borrow_mut().insert(node, index);
        debug!("mk(v = {}, low = {}, high = {}) -> @{}", v, low, high, index);
        Ref::positive(index)
    }

    pub fn mk_var(&self, v: u32) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");
        self.mk_node(v, self.zero, self.one)
    }

    /// Conjunction of literals given as signed variable indices.
    pub fn mk_cube(&self, literals: impl IntoIterator<Item = i32>) -> Ref {
        let mut literals = literals.into_iter().collect::<Vec<_>>();
        literals.sort_by_key(|&v| std::cmp::Reverse(v.unsigned_abs()));
        let mut current = self.one;
        for lit in literals {
            assert_ne!(lit, 0, "Variable index should not be zero");
            let v = lit.unsigned_abs();
            current = if lit < 0 {
                self.mk_node(v, current, self.zero)
            } else {
                self.mk_node(v, self.zero, current)
            };
        }
        current
    }

    /// Cofactors of `node` with respect to `v`, which must not be below the top variable.
    pub fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        assert_ne!(v, 0, "Variable index should not be zero");

        match self.top_var(node) {
            Some(top) if top == v => (self.low_node(node), self.high_node(node)),
            Some(top) => {
                assert!(v < top, "cofactor variable x{} is below the top variable x{}", v, top);
                (node, node)
            }
            None => (node, node),
        }
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(x, y, z) = (x ∧ y) ∨ (¬x ∧ z)
    /// ```
    ///
    /// # Examples
    ///
    /// ```
    /// use supcon_rs::bdd::Bdd;
    ///
    /// let bdd = Bdd::default();
    /// let x = bdd.mk_var(1);
    /// let y = bdd.mk_var(2);
    /// let z = bdd.mk_var(3);
    /// let f = bdd.apply_ite(x, y, z);
    /// let x_and_y = bdd.apply_and(x, y);
    /// let not_x_and_z = bdd.apply_and(-x, z);
    /// assert_eq!(f, bdd.apply_or(x_and_y, not_x_and_z));
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,G,~F) => ite(F,G,1)
        let g = if g == f {
            self.one
        } else if g == -f {
            self.zero
        } else {
            g
        };
        let h = if h == f {
            self.zero
        } else if h == -f {
            self.one
        } else {
            h
        };

        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }

        // ite(~F,G,H) => ite(F,H,G)
        let (f, g, h) = if f.is_negated() { (-f, h, g) } else { (f, g, h) };

        // ite(F,~G,H) => ~ite(F,G,~H)
        let (g, h, negate) = if g.is_negated() {
            (-g, -h, true)
        } else {
            (g, h, false)
        };

        let key = IteKey(f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return if negate { -res } else { res };
        }

        // Determine the top variable:
        let m = [f, g, h]
            .into_iter()
            .filter_map(|node| self.top_var(node))
            .min()
            .expect("f is not terminal");

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.apply_ite(f0, g0, h0);
        let t = self.apply_ite(f1, g1, h1);

        let res = self.mk_node(m, e, t);
        self.cache.borrow_mut().insert(key, res);

        if negate {
            -res
        } else {
            res
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.zero)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, self.one, v)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, -v)
    }

    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        let mut res = self.one;
        for node in nodes {
            res = self.apply_and(res, node);
            if self.is_zero(res) {
                break;
            }
        }
        res
    }

    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        let mut res = self.zero;
        for node in nodes {
            res = self.apply_or(res, node);
            if self.is_one(res) {
                break;
            }
        }
        res
    }

    /// Indices of all nodes reachable from the given roots, terminal included.
    pub fn descendants(&self, nodes: impl IntoIterator<Item = Ref>) -> HashSet<usize> {
        let mut visited = HashSet::new();
        visited.insert(self.one.index());
        let mut queue = VecDeque::from_iter(nodes);

        while let Some(node) = queue.pop_front() {
            let i = node.index();
            if visited.insert(i) {
                queue.push_back(self.low(i));
                queue.push_back(self.high(i));
            }
        }

        visited
    }

    pub fn size(&self, f: Ref) -> usize {
        self.descendants([f]).len()
    }

    pub fn to_bracket_string(&self, node: Ref) -> String {
        if self.is_zero(node) {
            return "(0)".to_string();
        } else if self.is_one(node) {
            return "(1)".to_string();
        }

        let v = self.variable(node.index());
        let low = self.low_node(node);
        let high = self.high_node(node);

        format!(
            "{}:(x{}, {}, {})",
            node,
            v,
            self.to_bracket_string(high),
            self.to_bracket_string(low)
        )
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_var() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);

        assert_eq!(bdd.variable(x.index()), 1);
        assert_eq!(bdd.high_node(x), bdd.one);
        assert_eq!(bdd.low_node(x), bdd.zero);
    }

    #[test]
    fn test_not_var() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);
        let not_x = -x;

        assert_eq!(bdd.variable(not_x.index()), 1);
        assert_eq!(bdd.high_node(not_x), bdd.zero);
        assert_eq!(bdd.low_node(not_x), bdd.one);
    }

    #[test]
    fn test_terminal() {
        let bdd = Bdd::default();

        assert!(bdd.is_terminal(bdd.zero));
        assert!(bdd.is_zero(bdd.zero));
        assert!(!bdd.is_one(bdd.zero));

        assert!(bdd.is_terminal(bdd.one));
        assert!(!bdd.is_zero(bdd.one));
        assert!(bdd.is_one(bdd.one));
        assert_eq!(bdd.num_nodes(), 0);
    }

    #[test]
    fn test_hash_consing() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);
        let y = bdd.mk_var(1);
        assert_eq!(x, y);
        assert_eq!(bdd.num_nodes(), 1);
    }

    #[test]
    fn test_cube() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1);
        let x2 = bdd.mk_var(2);
        let x3 = bdd.mk_var(3);

        let f = bdd.apply_and(bdd.apply_and(x1, x2), x3);
        assert_eq!(f, bdd.mk_cube([1, 2, 3]));

        let f = bdd.apply_and(bdd.apply_and(x1, -x2), -x3);
        assert_eq!(f, bdd.mk_cube([-3, 1, -2]));
    }

    #[test]
    fn test_de_morgan() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);

        assert_eq!(-bdd.apply_and(x, y), bdd.apply_or(-x, -y));
        assert_eq!(-bdd.apply_or(x, y), bdd.apply_and(-x, -y));
    }

    #[test]
    fn test_eq() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let f = bdd.apply_and(x, y);

        assert_eq!(bdd.apply_eq(f, f), bdd.one);
        assert_eq!(bdd.apply_eq(f, -f), bdd.zero);
        let g = bdd.apply_eq(x, y);
        assert_eq!(g, bdd.apply_or(bdd.apply_and(x, y), bdd.apply_and(-x, -y)));
    }

    #[test]
    fn test_contradiction_and_tautology() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);

        let f = bdd.apply_and_many([x, y, -x]);
        assert!(bdd.is_zero(f));
        let g = bdd.apply_or_many([y, x, -x]);
        assert!(bdd.is_one(g));
    }

    #[test]
    fn test_ite_out_of_order_variables() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1);
        let x2 = bdd.mk_var(2);
        let x3 = bdd.mk_var(3);

        // f is rooted below g and h
        let f = bdd.apply_ite(x3, x1, x2);
        let expected = bdd.apply_or(bdd.apply_and(x3, x1), bdd.apply_and(-x3, x2));
        assert_eq!(f, expected);
        assert_eq!(bdd.size(f), 5);
    }

    #[test]
    fn test_size() {
        let bdd = Bdd::default();

        let f = bdd.mk_cube([1, 2]);
        // two internal nodes plus the terminal
        assert_eq!(bdd.size(f), 3);
        assert_eq!(bdd.size(bdd.one), 1);
        assert_eq!(bdd.to_bracket_string(bdd.zero), "(0)");
    }
}
