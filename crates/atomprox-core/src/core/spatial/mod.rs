//! # Spatial Partition Interface
//!
//! The proximity engine never builds or mutates a spatial index itself. It asks a
//! [`PartitionProvider`] for a [`PartitionCursor`] over one model and pulls raw
//! candidates from it; selection, ordering, self-exclusion, and radius rules are
//! applied on top by [`crate::engine::cursor::ProximityCursor`].
//!
//! [`kdtree::KdTreePartition`] is the bundled provider.

pub mod kdtree;

use crate::core::models::ids::ModelId;
use nalgebra::Point3;

/// A candidate produced by a partition cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointRecord {
    /// Global atom index.
    pub index: usize,
    pub position: Point3<f64>,
}

/// Traversal handle over one model's spatial index.
pub trait PartitionCursor {
    /// Restarts the traversal to enumerate points within `radius` of `center`.
    ///
    /// With `hemisphere_only`, only points with `x >= center.x` are produced.
    fn initialize(&mut self, center: &Point3<f64>, radius: f64, hemisphere_only: bool);

    /// Whether another candidate is available.
    fn has_more(&self) -> bool;

    /// Returns the next candidate, unfiltered by selection or ordering.
    fn next_point(&mut self) -> Option<PointRecord>;

    /// Squared distance from the last returned candidate to the query center.
    fn found_distance_squared(&self) -> Option<f64>;

    /// Drops any traversal state; the cursor must be initialized again before reuse.
    fn release(&mut self);
}

/// Hands out partition cursors per model.
pub trait PartitionProvider {
    type Cursor: PartitionCursor;

    /// Returns a cursor over `model`, or `None` if the model is not indexed.
    ///
    /// Providers that pool cursors must hand out an unshared one when `fresh` is set.
    fn cursor(&self, model: ModelId, fresh: bool) -> Option<Self::Cursor>;
}
