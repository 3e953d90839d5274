//! # Engine Module
//!
//! Filtered proximity search on top of a spatial partition.
//!
//! ## Overview
//!
//! A [`cursor::ProximityCursor`] is bound to one model and a center point. It pulls
//! raw candidates from the model's partition cursor and reports only those that pass
//! self-exclusion, the optional greater-index ordering, and the optional selection.
//! The [`collector::BulkCollector`] extension drains any cursor into an
//! [`AtomBitSet`](crate::core::models::atom_set::AtomBitSet), applying fixed or
//! van der Waals aware distance thresholds per candidate.
//! [`multi_model::MultiModelCursor`] runs the same query across several models.
//!
//! - **Configuration** ([`config`]) - per-cursor flags and van der Waals search margins
//! - **Error Handling** ([`error`]) - errors surfaced by the higher-level workflows

pub mod collector;
pub mod config;
pub mod cursor;
pub mod error;
pub mod multi_model;

#[cfg(test)]
pub(crate) mod testing;
