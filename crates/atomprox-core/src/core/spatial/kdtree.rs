use super::{PartitionCursor, PartitionProvider, PointRecord};
use crate::core::models::ids::ModelId;
use crate::core::models::model_set::ModelSet;
use kiddo::SquaredEuclidean;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use nalgebra::Point3;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Relative padding of the KD-tree query; exact inclusion is decided afterwards.
const QUERY_PADDING: f64 = 1e-9;

/// Bulk-built and balanced, so any number of atoms may share a coordinate value.
type ModelKdTree = ImmutableKdTree<f64, u64, 3, 32>;

struct ModelTree {
    /// `None` for a model without atoms.
    tree: Option<ModelKdTree>,
    points: Vec<PointRecord>,
}

impl ModelTree {
    fn build(points: Vec<PointRecord>) -> Self {
        let coordinates: Vec<[f64; 3]> = points
            .iter()
            .map(|point| {
                let p = &point.position;
                [p.x, p.y, p.z]
            })
            .collect();
        let tree = (!coordinates.is_empty()).then(|| ModelKdTree::new_from_slice(&coordinates));
        Self { tree, points }
    }
}

impl fmt::Debug for ModelTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelTree")
            .field("points", &self.points.len())
            .finish_non_exhaustive()
    }
}

/// A [`PartitionProvider`] backed by one KD-tree per model.
///
/// Trees are immutable once built and shared between cursors, so every cursor is
/// independent and the `fresh` request needs no special handling. Rebuild the
/// partition after editing atom coordinates or indices.
#[derive(Debug, Default)]
pub struct KdTreePartition {
    models: Vec<Arc<ModelTree>>,
}

impl KdTreePartition {
    /// Indexes every model of `model_set`.
    pub fn from_model_set(model_set: &ModelSet) -> Self {
        let models: Vec<Arc<ModelTree>> = model_set
            .models()
            .iter()
            .map(|model| {
                let points = model_set.atoms()[model.atom_range()]
                    .iter()
                    .map(|atom| PointRecord {
                        index: atom.index,
                        position: atom.position,
                    })
                    .collect();
                Arc::new(ModelTree::build(points))
            })
            .collect();
        debug!(
            models = models.len(),
            atoms = model_set.atom_count(),
            "Built KD-tree partition."
        );
        Self { models }
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }
}

impl PartitionProvider for KdTreePartition {
    type Cursor = KdTreeCursor;

    fn cursor(&self, model: ModelId, fresh: bool) -> Option<KdTreeCursor> {
        let tree = self.models.get(model.0)?;
        trace!(%model, fresh, "Issuing KD-tree cursor.");
        Some(KdTreeCursor {
            tree: Arc::clone(tree),
            hits: Vec::new(),
            position: 0,
            last_distance_squared: None,
        })
    }
}

/// Cursor over one model's KD-tree. Candidates come out in ascending atom index order.
#[derive(Debug)]
pub struct KdTreeCursor {
    tree: Arc<ModelTree>,
    hits: Vec<(usize, f64)>,
    position: usize,
    last_distance_squared: Option<f64>,
}

impl PartitionCursor for KdTreeCursor {
    fn initialize(&mut self, center: &Point3<f64>, radius: f64, hemisphere_only: bool) {
        self.hits.clear();
        self.position = 0;
        self.last_distance_squared = None;
        if radius.is_nan() || radius < 0.0 {
            return;
        }
        let Some(tree) = self.tree.tree.as_ref() else {
            return;
        };

        let radius_squared = radius * radius;
        let padded = radius_squared * (1.0 + QUERY_PADDING) + QUERY_PADDING;
        let points = &self.tree.points;
        self.hits.extend(
            tree.within_unsorted::<SquaredEuclidean>(&[center.x, center.y, center.z], padded)
                .into_iter()
                .filter_map(|neighbour| {
                    let point = &points[neighbour.item as usize];
                    if hemisphere_only && point.position.x < center.x {
                        return None;
                    }
                    let d2 = (point.position - center).norm_squared();
                    (d2 <= radius_squared).then_some((neighbour.item as usize, d2))
                }),
        );
        self.hits.sort_unstable_by_key(|&(local, _)| local);
    }

    fn has_more(&self) -> bool {
        self.position < self.hits.len()
    }

    fn next_point(&mut self) -> Option<PointRecord> {
        let &(local, d2) = self.hits.get(self.position)?;
        self.position += 1;
        self.last_distance_squared = Some(d2);
        Some(self.tree.points[local])
    }

    fn found_distance_squared(&self) -> Option<f64> {
        self.last_distance_squared
    }

    fn release(&mut self) {
        self.hits.clear();
        self.position = 0;
        self.last_distance_squared = None;
    }
}
