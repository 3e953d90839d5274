//! # Workflows Module
//!
//! Whole-model-set queries built on the engine cursors. Each workflow sets up the
//! cursor configuration it needs, drives the search, and releases the cursor before
//! returning.
//!
//! - **Within** ([`within`]) - atoms near a set of atoms or a point, and close atom pairs.
//! - **Bonding** ([`bonding`]) - covalent bonds derived from bonding radii.
//! - **Hydrogen Bonds** ([`hbonds`]) - N/O hydrogen bonds with optional energies.

pub mod bonding;
pub mod hbonds;
pub mod within;
