use std::time::Duration;

use thiserror::Error;

/// Failures reported by a constraint oracle.
///
/// None of these mean "unsatisfiable": a query that hits one of them has no verdict.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("oracle exceeded its node limit ({nodes} nodes, limit {limit})")]
    ResourceExhausted { nodes: usize, limit: usize },

    #[error("oracle exceeded its time limit ({elapsed:?} elapsed, limit {limit:?})")]
    Timeout { elapsed: Duration, limit: Duration },

    #[error("pop without a matching push")]
    ScopeUnderflow,

    #[error("oracle internal error: {0}")]
    Internal(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("state `{state}` is unknown to automaton `{automaton}`; add transitions before marking states")]
    UnknownState { automaton: String, state: String },

    #[error(
        "automaton `{automaton}` has `{source_state}` -{action}-> `{target}` as both controllable and uncontrollable"
    )]
    ConflictingTransition {
        automaton: String,
        source_state: String,
        target: String,
        action: String,
    },

    #[error("global state has {found} coordinates, expected {expected}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("local state index {index} is out of range for component {component} with {size} states")]
    LocalIndexOutOfRange {
        component: usize,
        index: usize,
        size: usize,
    },

    #[error("oracle model has no value for atom `{atom}`")]
    IncompleteModel { atom: String },

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_messages() {
        let err = Error::UnknownState {
            automaton: "K1".to_string(),
            state: "q9".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "state `q9` is unknown to automaton `K1`; add transitions before marking states"
        );

        let err: Error = OracleError::ScopeUnderflow.into();
        assert_eq!(err.to_string(), "pop without a matching push");
    }
}
