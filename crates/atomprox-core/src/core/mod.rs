//! # Core Module
//!
//! Stateless building blocks of the proximity engine.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, models, bonds, and atom sets
//! - **Radius Rules** ([`radius`]) - Van der Waals tables and radius policies
//! - **Spatial Partitioning** ([`spatial`]) - The partition provider interface consumed by
//!   the engine, and a KD-tree implementation of it
//!
//! Nothing in this layer keeps query state; cursors and their caches live in
//! [`crate::engine`].

pub mod models;
pub mod radius;
pub mod spatial;
