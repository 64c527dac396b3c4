//! # supcon-rs: Supervisory Control over Decision Diagrams
//!
//! **`supcon-rs`** computes maximally permissive supervisors for plants made of several
//! concurrently operating discrete-event components.
//!
//! ## The Problem
//!
//! Each component is a labeled transition system whose events are either *controllable*
//! (a supervisor may disable them) or *uncontrollable*. Components run in a synchronous
//! product: an action shared by several components fires only when all of them can fire it.
//! A supervisor keeps the system away from *unsafe* states, never blocks an uncontrollable
//! event, and keeps a *marked* ("task complete") state reachable from everywhere it allows.
//!
//! ## How It Works
//!
//! - The product is never built up front. [`SynchronizedProduct`][crate::product::SynchronizedProduct]
//!   computes successors of a global state on demand.
//! - [`FixpointEncoder`][crate::encoder::FixpointEncoder] asserts, for every global state, two
//!   Boolean equations over per-component atoms: one defining co-reachability to a marked
//!   state, one defining exclusion from the supervisor.
//! - [`QueryDriver`][crate::query::QueryDriver] asks questions about the solutions through an
//!   [`Oracle`][crate::oracle::Oracle]. The shipped oracle is [`BddOracle`][crate::bdd_oracle::BddOracle],
//!   a reduced ordered BDD engine with complement edges.
//! - [`synthesize`][crate::synthesis::synthesize] computes the same supervisor explicitly, as a
//!   greatest fixpoint, for cross-checking.
//!
//! ## Basic Usage
//!
//! ```rust
//! use supcon_rs::automaton::ComponentAutomaton;
//! use supcon_rs::bdd_oracle::BddOracle;
//! use supcon_rs::encoder::FixpointEncoder;
//! use supcon_rs::product::SynchronizedProduct;
//! use supcon_rs::query::QueryDriver;
//!
//! let mut k = ComponentAutomaton::new("K", "idle");
//! k.add_transition("idle", "busy", true, "start")?;
//! k.add_transition("busy", "idle", false, "finish")?;
//! k.mark_state("idle")?;
//! let product = SynchronizedProduct::new(vec![k]);
//!
//! let mut oracle = BddOracle::default();
//! let encoding = FixpointEncoder::new(&product).encode(&mut oracle)?;
//! let mut driver = QueryDriver::new(&mut oracle, &product, &encoding);
//!
//! let verdict = driver.is_controllable_from(&product.initial())?;
//! assert!(verdict.assignment().unwrap().retains_all());
//! # Ok::<(), supcon_rs::error::Error>(())
//! ```
//!
//! ## Core Components
//!
//! - **[`automaton`]** and **[`product`]**: the plant model.
//! - **[`encoder`]** and **[`query`]**: the constraint system and the questions asked of it.
//! - **[`bdd`]** and **[`sat`]**: the decision diagram manager behind the oracle.
//! - **[`synthesis`]**: the explicit fixpoint computation.

pub mod automaton;
pub mod bdd;
pub mod bdd_oracle;
pub mod cache;
pub mod encoder;
pub mod error;
pub mod oracle;
pub mod product;
pub mod query;
pub mod reference;
pub mod sat;
pub mod synthesis;
pub mod types;
pub mod utils;
