//! A single discrete-event component: a labeled transition system whose
//! events are either controllable or uncontrollable.

use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexSet;
use log::{debug, warn};

use crate::error::{Error, Result};

/// Outgoing edge of a local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub target: usize,
    pub action: String,
    pub controllable: bool,
}

/// Component automaton with indexed local states.
///
/// States get consecutive indices in registration order, starting with the
/// initial state at index 0. The index is the coordinate used by global states.
///
/// # Examples
///
/// ```
/// use supcon_rs::automaton::ComponentAutomaton;
///
/// let mut k = ComponentAutomaton::new("K", "q0");
/// k.add_transition("q0", "q1", true, "start")?;
/// k.add_transition("q1", "q0", false, "done")?;
/// k.mark_state("q0")?;
///
/// assert_eq!(k.num_states(), 2);
/// assert!(k.mark_state("q7").is_err());
/// assert_eq!(k.alphabet().len(), 2);
/// # Ok::<(), supcon_rs::error::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ComponentAutomaton {
    name: String,
    states: IndexSet<String>,
    transitions: Vec<Vec<Transition>>,
    marked: BTreeSet<usize>,
    unsafe_states: BTreeSet<usize>,
    alphabet: OnceCell<BTreeSet<String>>,
}

impl ComponentAutomaton {
    /// Create an automaton whose initial state is `initial`.
    pub fn new(name: impl Into<String>, initial: impl Into<String>) -> Self {
        let mut automaton = Self {
            name: name.into(),
            states: IndexSet::new(),
            transitions: Vec::new(),
            marked: BTreeSet::new(),
            unsafe_states: BTreeSet::new(),
            alphabet: OnceCell::new(),
        };
        automaton.register(initial.into());
        automaton
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index of the initial state (always 0).
    pub fn initial(&self) -> usize {
        0
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// State names in index order.
    pub fn states(&self) -> impl Iterator<Item = &str> + '_ {
        self.states.iter().map(String::as_str)
    }

    pub fn state_name(&self, index: usize) -> Option<&str> {
        self.states.get_index(index).map(String::as_str)
    }

    pub fn index_of(&self, state: &str) -> Option<usize> {
        self.states.get_index_of(state)
    }

    fn register(&mut self, state: String) -> usize {
        let (index, inserted) = self.states.insert_full(state);
        if inserted {
            self.transitions.push(Vec::new());
        }
        index
    }

    fn lookup(&self, state: &str) -> Result<usize> {
        self.index_of(state).ok_or_else(|| Error::UnknownState {
            automaton: self.name.clone(),
            state: state.to_string(),
        })
    }

    /// Add `source -action-> target`, registering both states if they are new.
    ///
    /// Repeating an identical transition is accepted. Adding the same
    /// `(source, target, action)` with the opposite controllability fails with
    /// [`Error::ConflictingTransition`].
    pub fn add_transition(&mut self, source: &str, target: &str, controllable: bool, action: &str) -> Result<()> {
        if let (Some(s), Some(t)) = (self.index_of(source), self.index_of(target)) {
            for existing in self.transitions[s].iter().filter(|tr| tr.target == t && tr.action == action) {
                if existing.controllable != controllable {
                    return Err(Error::ConflictingTransition {
                        automaton: self.name.clone(),
                        source_state: source.to_string(),
                        target: target.to_string(),
                        action: action.to_string(),
                    });
                }
                warn!("{}: duplicate transition {} -{}-> {}", self.name, source, action, target);
            }
        }

        let s = self.register(source.to_string());
        let t = self.register(target.to_string());
        debug!(
            "{}: {} -{}-> {} ({})",
            self.name,
            source,
            action,
            target,
            if controllable { "controllable" } else { "uncontrollable" }
        );
        self.transitions[s].push(Transition {
            target: t,
            action: action.to_string(),
            controllable,
        });
        self.alphabet.take();
        Ok(())
    }

    /// Mark `state` as a task-complete state.
    pub fn mark_state(&mut self, state: &str) -> Result<()> {
        let index = self.lookup(state)?;
        self.marked.insert(index);
        Ok(())
    }

    /// Declare `state` forbidden.
    pub fn set_unsafe(&mut self, state: &str) -> Result<()> {
        let index = self.lookup(state)?;
        self.unsafe_states.insert(index);
        Ok(())
    }

    pub fn is_marked(&self, index: usize) -> bool {
        self.marked.contains(&index)
    }

    pub fn is_unsafe(&self, index: usize) -> bool {
        self.unsafe_states.contains(&index)
    }

    pub fn marked(&self) -> &BTreeSet<usize> {
        &self.marked
    }

    pub fn unsafe_states(&self) -> &BTreeSet<usize> {
        &self.unsafe_states
    }

    /// Outgoing transitions of a local state, in insertion order.
    pub fn transitions_from(&self, index: usize) -> &[Transition] {
        self.transitions.get(index).map_or(&[], Vec::as_slice)
    }

    /// The first transition labeled `action` leaving `index`, if any.
    pub fn first_transition(&self, index: usize, action: &str) -> Option<&Transition> {
        self.transitions_from(index).iter().find(|tr| tr.action == action)
    }

    /// All action labels used by the transitions, computed on first use.
    pub fn alphabet(&self) -> &BTreeSet<String> {
        self.alphabet.get_or_init(|| {
            self.transitions
                .iter()
                .flatten()
                .map(|tr| tr.action.clone())
                .collect()
        })
    }
}

impl fmt::Display for ComponentAutomaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "automaton {} (initial {})", self.name, self.states[0])?;
        for (s, edges) in self.transitions.iter().enumerate() {
            for tr in edges {
                writeln!(
                    f,
                    "  {} -{}{}-> {}",
                    self.states[s],
                    tr.action,
                    if tr.controllable { "" } else { "!" },
                    self.states[tr.target]
                )?;
            }
        }
        let names = |set: &BTreeSet<usize>| set.iter().map(|&i| self.states[i].as_str()).collect::<Vec<_>>().join(", ");
        writeln!(f, "  marked: {{{}}}", names(&self.marked))?;
        write!(f, "  unsafe: {{{}}}", names(&self.unsafe_states))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn fixture() -> ComponentAutomaton {
        let mut k = ComponentAutomaton::new("K1", "q0");
        k.add_transition("q0", "q1", true, "alpha").unwrap();
        k.add_transition("q1", "q2", false, "beta").unwrap();
        k.add_transition("q1", "q2", false, "theta").unwrap();
        k.add_transition("q2", "q0", true, "alpha").unwrap();
        k
    }

    #[test]
    fn test_states_are_indexed_in_registration_order() {
        let k = fixture();
        assert_eq!(k.states().collect::<Vec<_>>(), ["q0", "q1", "q2"]);
        assert_eq!(k.index_of("q2"), Some(2));
        assert_eq!(k.state_name(1), Some("q1"));
        assert_eq!(k.initial(), 0);
        assert_eq!(k.index_of("q9"), None);
    }

    #[test]
    fn test_transitions() {
        let k = fixture();
        assert_eq!(k.transitions_from(1).len(), 2);
        let tr = k.first_transition(1, "theta").unwrap();
        assert_eq!(tr.target, 2);
        assert!(!tr.controllable);
        assert!(k.first_transition(0, "beta").is_none());
        assert!(k.transitions_from(42).is_empty());
    }

    #[test]
    fn test_first_transition_wins() {
        let mut k = ComponentAutomaton::new("K", "a");
        k.add_transition("a", "b", true, "go").unwrap();
        k.add_transition("a", "c", true, "go").unwrap();
        assert_eq!(k.first_transition(0, "go").unwrap().target, 1);
    }

    #[test]
    fn test_marking() {
        let mut k = fixture();
        k.mark_state("q2").unwrap();
        k.set_unsafe("q1").unwrap();
        assert!(k.is_marked(2));
        assert!(!k.is_marked(0));
        assert!(k.is_unsafe(1));
        assert!(!k.is_unsafe(2));
    }

    #[test]
    fn test_unknown_state() {
        let mut k = fixture();
        assert_eq!(
            k.mark_state("q5"),
            Err(Error::UnknownState {
                automaton: "K1".to_string(),
                state: "q5".to_string(),
            })
        );
        assert!(matches!(k.set_unsafe("nope"), Err(Error::UnknownState { .. })));
    }

    #[test]
    fn test_conflicting_transition() {
        let mut k = fixture();
        let err = k.add_transition("q1", "q2", true, "beta").unwrap_err();
        assert!(matches!(err, Error::ConflictingTransition { .. }));
        // duplicates with the same controllability are accepted
        k.add_transition("q1", "q2", false, "beta").unwrap();
        assert_eq!(k.transitions_from(1).len(), 3);
    }

    #[test]
    fn test_alphabet_is_stable() {
        let k = fixture();
        let first = k.alphabet().clone();
        let second = k.alphabet().clone();
        assert_eq!(first, second);
        assert_eq!(first.into_iter().collect::<Vec<_>>(), ["alpha", "beta", "theta"]);
    }

    #[test]
    fn test_alphabet_is_invalidated() {
        let mut k = fixture();
        assert_eq!(k.alphabet().len(), 3);
        k.add_transition("q2", "q3", true, "gamma").unwrap();
        assert!(k.alphabet().contains("gamma"));
    }

    #[test]
    fn test_display() {
        let mut k = ComponentAutomaton::new("K", "a");
        k.add_transition("a", "b", false, "u").unwrap();
        k.mark_state("b").unwrap();
        assert_eq!(k.to_string(), "automaton K (initial a)\n  a -u!-> b\n  marked: {b}\n  unsafe: {}");
    }
}
