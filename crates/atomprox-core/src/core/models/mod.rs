//! # Core Models Module
//!
//! The minimal molecular data model that proximity queries need: atoms as
//! point-index records, models as contiguous index ranges, bonds as compact
//! records whose chemistry is derived from an order plus a few flags, and the
//! bitset used for selections and results.
//!
//! ## Key Components
//!
//! - [`ids`] - The [`ModelId`](ids::ModelId) identifier
//! - [`atom_set`] - [`AtomBitSet`](atom_set::AtomBitSet), ordered bitset of atom indices
//! - [`atom`] - [`Atom`](atom::Atom), coordinates plus identity and display counters
//! - [`bond`] - [`Bond`](bond::Bond), bond orders, and hydrogen-bond energetics
//! - [`model_set`] - [`ModelSet`](model_set::ModelSet), the owner of all of the above
//!
//! ## Usage
//!
//! ```ignore
//! use atomprox::core::models::model_set::ModelSet;
//! use atomprox::core::radius::policy::VdwClass;
//!
//! let mut set = ModelSet::new();
//! let model = set.add_model(VdwClass::Jmol);
//! let oxygen = set.add_atom(model, 8, Point3::new(0.0, 0.0, 0.0))?;
//! let hydrogen = set.add_atom(model, 1, Point3::new(0.96, 0.0, 0.0))?;
//! set.add_bond(oxygen, hydrogen, BondOrder::Single)?;
//! ```

pub mod atom;
pub mod atom_set;
pub mod bond;
pub mod ids;
pub mod model_set;
