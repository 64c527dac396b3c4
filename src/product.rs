//! Synchronous product of component automata, explored lazily.
//!
//! Global states are tuples of local state indices. Successors are computed on
//! demand: an action shared by several components fires only if every owner
//! can fire it from its current coordinate, while components that do not know
//! the action keep their coordinate.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexSet;
use log::debug;

use crate::automaton::ComponentAutomaton;
use crate::error::{Error, Result};

/// A configuration of the whole network: one local state index per component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalState(Box<[usize]>);

impl GlobalState {
    pub fn new(coords: impl Into<Vec<usize>>) -> Self {
        GlobalState(coords.into().into_boxed_slice())
    }

    pub fn coords(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::ops::Index<usize> for GlobalState {
    type Output = usize;

    fn index(&self, component: usize) -> &usize {
        &self.0[component]
    }
}

impl From<Vec<usize>> for GlobalState {
    fn from(coords: Vec<usize>) -> Self {
        GlobalState::new(coords)
    }
}

impl<const N: usize> From<[usize; N]> for GlobalState {
    fn from(coords: [usize; N]) -> Self {
        GlobalState::new(coords.to_vec())
    }
}

impl fmt::Display for GlobalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, ")")
    }
}

/// Local move of one component: the first transition for an action.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Move {
    target: usize,
    controllable: bool,
}

/// A synchronized global transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub action: usize,
    pub target: GlobalState,
    /// Every participating component fired a controllable transition.
    pub controllable: bool,
}

/// Composition of an ordered list of components.
pub struct SynchronizedProduct {
    components: Vec<ComponentAutomaton>,
    /// Union of all component alphabets.
    alphabet: IndexSet<String>,
    /// For each action, the components whose alphabet contains it.
    owners: Vec<Vec<usize>>,
    /// For each component, `(local state, action) -> first matching move`.
    moves: Vec<HashMap<(usize, usize), Move>>,
}

impl SynchronizedProduct {
    pub fn new(components: Vec<ComponentAutomaton>) -> Self {
        let alphabet: IndexSet<String> = components
            .iter()
            .flat_map(|c| c.alphabet().iter().cloned())
            .collect();

        let owners = alphabet
            .iter()
            .map(|a| {
                components
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.alphabet().contains(a))
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect();

        let moves = components
            .iter()
            .map(|c| {
                let mut table = HashMap::new();
                for s in 0..c.num_states() {
                    for tr in c.transitions_from(s) {
                        let a = alphabet.get_index_of(&tr.action).expect("action is in the global alphabet");
                        table.entry((s, a)).or_insert(Move {
                            target: tr.target,
                            controllable: tr.controllable,
                        });
                    }
                }
                table
            })
            .collect();

        debug!(
            "product of {} components over {} actions",
            components.len(),
            alphabet.len()
        );

        Self {
            components,
            alphabet,
            owners,
            moves,
        }
    }

    pub fn components(&self) -> &[ComponentAutomaton] {
        &self.components
    }

    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// Number of global states (the product of the local state counts).
    pub fn size(&self) -> u128 {
        self.components.iter().map(|c| c.num_states() as u128).product()
    }

    /// Total number of (component, local state) pairs.
    pub fn num_local_states(&self) -> usize {
        self.components.iter().map(|c| c.num_states()).sum()
    }

    pub fn global_alphabet(&self) -> &IndexSet<String> {
        &self.alphabet
    }

    pub fn action_name(&self, action: usize) -> Option<&str> {
        self.alphabet.get_index(action).map(String::as_str)
    }

    pub fn initial(&self) -> GlobalState {
        GlobalState::new(self.components.iter().map(|c| c.initial()).collect::<Vec<_>>())
    }

    /// Build a global state from local state names, one per component.
    pub fn state_by_names(&self, names: &[&str]) -> Result<GlobalState> {
        if names.len() != self.components.len() {
            return Err(Error::ArityMismatch {
                expected: self.components.len(),
                found: names.len(),
            });
        }
        let coords = self
            .components
            .iter()
            .zip(names)
            .map(|(c, &name)| {
                c.index_of(name).ok_or_else(|| Error::UnknownState {
                    automaton: c.name().to_string(),
                    state: name.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(GlobalState::new(coords))
    }

    pub fn state_names(&self, state: &GlobalState) -> Vec<&str> {
        self.components
            .iter()
            .zip(state.coords())
            .map(|(c, &s)| c.state_name(s).unwrap_or("?"))
            .collect()
    }

    /// Check that `state` has one in-range coordinate per component.
    pub fn validate(&self, state: &GlobalState) -> Result<()> {
        if state.len() != self.components.len() {
            return Err(Error::ArityMismatch {
                expected: self.components.len(),
                found: state.len(),
            });
        }
        for (component, (c, &index)) in self.components.iter().zip(state.coords()).enumerate() {
            if index >= c.num_states() {
                return Err(Error::LocalIndexOutOfRange {
                    component,
                    index,
                    size: c.num_states(),
                });
            }
        }
        Ok(())
    }

    /// All components are in a marked local state.
    pub fn is_marked(&self, state: &GlobalState) -> bool {
        self.components
            .iter()
            .zip(state.coords())
            .all(|(c, &s)| c.is_marked(s))
    }

    /// At least one component is in an unsafe local state.
    pub fn is_unsafe(&self, state: &GlobalState) -> bool {
        self.components
            .iter()
            .zip(state.coords())
            .any(|(c, &s)| c.is_unsafe(s))
    }

    /// Iterate over every global state, last component varying fastest.
    pub fn states(&self) -> GlobalStates {
        GlobalStates {
            sizes: self.components.iter().map(|c| c.num_states()).collect(),
            next: Some(vec![0; self.components.len()]),
        }
    }

    /// Fire `action` from `state`, if every component owning it can.
    ///
    /// Returns `None` when some owner has no transition for the action from its
    /// current coordinate, or when no component owns the action at all.
    ///
    /// # Panics
    ///
    /// Panics if `state` has fewer coordinates than there are components.
    pub fn step(&self, state: &GlobalState, action: usize) -> Option<Step> {
        let owners = self.owners.get(action)?;
        if owners.is_empty() {
            return None;
        }

        let mut target = state.coords().to_vec();
        let mut controllable = true;
        for &i in owners {
            let mv = self.moves[i].get(&(state[i], action))?;
            target[i] = mv.target;
            controllable &= mv.controllable;
        }

        Some(Step {
            action,
            target: GlobalState::new(target),
            controllable,
        })
    }

    /// Fire the action with the given label from `state`.
    pub fn step_by_name(&self, state: &GlobalState, action: &str) -> Option<Step> {
        let action = self.alphabet.get_index_of(action)?;
        self.step(state, action)
    }

    /// All enabled synchronized steps from `state`, in alphabet order.
    pub fn steps<'a>(&'a self, state: &'a GlobalState) -> impl Iterator<Item = Step> + 'a {
        (0..self.alphabet.len()).filter_map(move |a| self.step(state, a))
    }

    pub fn controllable_successors(&self, state: &GlobalState) -> Vec<GlobalState> {
        self.steps(state)
            .filter(|step| step.controllable)
            .map(|step| step.target)
            .collect()
    }

    pub fn uncontrollable_successors(&self, state: &GlobalState) -> Vec<GlobalState> {
        self.steps(state)
            .filter(|step| !step.controllable)
            .map(|step| step.target)
            .collect()
    }

    /// Controllable and uncontrollable successors together; may contain duplicates.
    pub fn successors(&self, state: &GlobalState) -> Vec<GlobalState> {
        self.steps(state).map(|step| step.target).collect()
    }
}

/// Odometer over the Cartesian product of local state indices.
pub struct GlobalStates {
    sizes: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl Iterator for GlobalStates {
    type Item = GlobalState;

    fn next(&mut self) -> Option<GlobalState> {
        let current = self.next.take()?;
        let mut following = current.clone();
        let mut i = following.len();
        loop {
            if i == 0 {
                // wrapped around: `current` was the last state
                break;
            }
            i -= 1;
            following[i] += 1;
            if following[i] < self.sizes[i] {
                self.next = Some(following);
                break;
            }
            following[i] = 0;
        }
        Some(GlobalState::new(current))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    /// Two 2-state cycles: `s0 -shared-> s1 -shared!-> s0`.
    fn two_cycles() -> SynchronizedProduct {
        let mut a = ComponentAutomaton::new("A", "s0");
        a.add_transition("s0", "s1", true, "shared").unwrap();
        a.add_transition("s1", "s0", false, "shared").unwrap();
        let mut b = ComponentAutomaton::new("B", "s0");
        b.add_transition("s0", "s1", true, "shared").unwrap();
        b.add_transition("s1", "s0", false, "shared").unwrap();
        SynchronizedProduct::new(vec![a, b])
    }

    /// A and B share `a`; each has a private action.
    fn shared_and_private(with_b_shared: bool) -> SynchronizedProduct {
        let mut a = ComponentAutomaton::new("A", "p0");
        a.add_transition("p0", "p1", true, "a").unwrap();
        a.add_transition("p0", "p2", false, "x").unwrap();
        let mut b = ComponentAutomaton::new("B", "r0");
        if with_b_shared {
            b.add_transition("r0", "r1", true, "a").unwrap();
        } else {
            b.add_transition("r1", "r0", true, "a").unwrap();
        }
        b.add_transition("r0", "r2", true, "y").unwrap();
        SynchronizedProduct::new(vec![a, b])
    }

    #[test]
    fn test_enumeration() {
        let product = two_cycles();
        let states: Vec<GlobalState> = product.states().collect();
        assert_eq!(states.len(), 4);
        assert_eq!(
            states,
            [[0, 0], [0, 1], [1, 0], [1, 1]].map(GlobalState::from).to_vec()
        );
        assert_eq!(product.size(), 4);
        assert_eq!(product.num_local_states(), 4);
        assert_eq!(product.initial(), GlobalState::from([0, 0]));
    }

    #[test]
    fn test_enumeration_uneven_sizes() {
        let product = shared_and_private(true);
        assert_eq!(product.states().count(), 9);
        assert_eq!(product.states().last(), Some(GlobalState::from([2, 2])));
    }

    #[test]
    fn test_synchronized_controllability() {
        let product = two_cycles();

        let s = GlobalState::from([0, 0]);
        assert_eq!(product.controllable_successors(&s), vec![GlobalState::from([1, 1])]);
        assert!(product.uncontrollable_successors(&s).is_empty());

        let s = GlobalState::from([1, 1]);
        assert_eq!(product.uncontrollable_successors(&s), vec![GlobalState::from([0, 0])]);
        assert!(product.controllable_successors(&s).is_empty());

        // one participant fires an uncontrollable transition
        let s = GlobalState::from([0, 1]);
        assert_eq!(product.uncontrollable_successors(&s), vec![GlobalState::from([1, 0])]);
        assert!(product.controllable_successors(&s).is_empty());
    }

    #[test]
    fn test_shared_action_needs_every_owner() {
        let product = shared_and_private(true);
        let s = product.initial();

        let step = product.step_by_name(&s, "a").unwrap();
        assert_eq!(step.target, GlobalState::from([1, 1]));
        assert!(step.controllable);

        // removing B's `a` transition from r0 disables the rendezvous
        let product = shared_and_private(false);
        let s = product.state_by_names(&["p0", "r0"]).unwrap();
        assert!(product.step_by_name(&s, "a").is_none());
        assert!(!product.successors(&s).contains(&GlobalState::from([1, 1])));
    }

    #[test]
    fn test_private_actions_interleave() {
        let product = shared_and_private(true);
        let s = product.initial();

        let step = product.step_by_name(&s, "x").unwrap();
        assert_eq!(product.state_names(&step.target), ["p2", "r0"]);
        assert!(!step.controllable);

        let step = product.step_by_name(&s, "y").unwrap();
        assert_eq!(product.state_names(&step.target), ["p0", "r2"]);
        assert!(step.controllable);

        let mut successors = product.successors(&s);
        successors.sort();
        assert_eq!(successors.len(), 3);
    }

    #[test]
    fn test_foreign_action_has_no_successor() {
        let product = two_cycles();
        let s = product.initial();
        assert!(product.step_by_name(&s, "unknown").is_none());
        assert!(product.step(&s, 99).is_none());
    }

    #[test]
    fn test_dead_local_state_blocks_owned_actions() {
        let product = shared_and_private(true);
        // p1 has no outgoing transitions; B can still move privately.
        let s = product.state_by_names(&["p1", "r0"]).unwrap();
        assert!(product.step_by_name(&s, "a").is_none());
        assert!(product.step_by_name(&s, "x").is_none());
        assert_eq!(product.successors(&s), vec![product.state_by_names(&["p1", "r2"]).unwrap()]);
    }

    #[test]
    fn test_marking_is_all_and_safety_is_any() {
        let mut a = ComponentAutomaton::new("A", "a0");
        a.add_transition("a0", "a1", true, "t").unwrap();
        a.mark_state("a1").unwrap();
        a.set_unsafe("a0").unwrap();
        let mut b = ComponentAutomaton::new("B", "b0");
        b.add_transition("b0", "b1", true, "u").unwrap();
        b.mark_state("b1").unwrap();
        let product = SynchronizedProduct::new(vec![a, b]);

        assert!(product.is_marked(&GlobalState::from([1, 1])));
        assert!(!product.is_marked(&GlobalState::from([1, 0])));
        assert!(product.is_unsafe(&GlobalState::from([0, 1])));
        assert!(!product.is_unsafe(&GlobalState::from([1, 0])));
    }

    #[test]
    fn test_validate() {
        let product = two_cycles();
        assert!(product.validate(&GlobalState::from([1, 0])).is_ok());
        assert_eq!(
            product.validate(&GlobalState::from([0])),
            Err(Error::ArityMismatch { expected: 2, found: 1 })
        );
        assert_eq!(
            product.validate(&GlobalState::from([0, 2])),
            Err(Error::LocalIndexOutOfRange {
                component: 1,
                index: 2,
                size: 2
            })
        );
        assert!(matches!(
            product.state_by_names(&["s0", "zz"]),
            Err(Error::UnknownState { .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(GlobalState::from([3, 0, 1]).to_string(), "(3, 0, 1)");
    }
}
