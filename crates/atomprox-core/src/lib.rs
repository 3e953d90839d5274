//! # atomprox
//!
//! Per-model spatial proximity search over molecular model sets.
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same three layers throughout:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`ModelSet`, `Atom`, `Bond`,
//!   `AtomBitSet`), van der Waals radius tables and policies, and the spatial partition
//!   interface with its KD-tree implementation.
//!
//! - **[`engine`]: The Logic Core.** The stateful `ProximityCursor` that filters partition
//!   candidates by self atom, index ordering, and selection; the bulk collector that
//!   applies per-pair radius thresholds; and the multi-model cursor.
//!
//! - **[`workflows`]: The Public API.** Ready-made queries such as "all atoms within 3 Å
//!   of this selection" or "every close pair in a model", plus distance-based covalent
//!   and hydrogen bond detection.

pub mod core;
pub mod engine;
pub mod workflows;
