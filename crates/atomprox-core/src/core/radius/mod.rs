//! # Radius Module
//!
//! Everything needed to turn a base distance into the radius a proximity query
//! actually compares against.
//!
//! - [`elements`] - Element symbols and the tabulated van der Waals radii
//! - [`policy`] - [`RadiusPolicy`](policy::RadiusPolicy): fixed, additive, or
//!   multiplicative radius rules, optionally evaluated per atom pair from van der
//!   Waals radii
//! - [`params`] - User-supplied per-element van der Waals radii loaded from CSV
//!
//! A policy without a van der Waals class transforms the query radius once, at
//! bind time. A policy with a class cannot be reduced to a single number: the
//! acceptance threshold is the sum of the two atoms' radii, so the search is
//! widened when the cursor is bound and the exact test runs per candidate.

pub mod elements;
pub mod params;
pub mod policy;
