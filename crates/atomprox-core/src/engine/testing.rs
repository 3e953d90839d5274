use crate::core::models::ids::ModelId;
use crate::core::spatial::{PartitionCursor, PartitionProvider, PointRecord};
use nalgebra::Point3;
use std::cell::Cell;

/// Brute-force partition that counts how often cursors are requested.
///
/// Candidates come out in descending index order so that nothing downstream can
/// depend on the order a real index happens to produce.
pub(crate) struct CountingProvider {
    models: Vec<Vec<PointRecord>>,
    requests: Cell<usize>,
    fresh_requests: Cell<usize>,
}

impl CountingProvider {
    pub(crate) fn new(models: Vec<Vec<Point3<f64>>>) -> Self {
        let mut next_index = 0;
        let models = models
            .into_iter()
            .map(|positions| {
                positions
                    .into_iter()
                    .map(|position| {
                        let record = PointRecord {
                            index: next_index,
                            position,
                        };
                        next_index += 1;
                        record
                    })
                    .collect()
            })
            .collect();
        Self {
            models,
            requests: Cell::new(0),
            fresh_requests: Cell::new(0),
        }
    }

    pub(crate) fn requests(&self) -> usize {
        self.requests.get()
    }

    pub(crate) fn fresh_requests(&self) -> usize {
        self.fresh_requests.get()
    }
}

impl PartitionProvider for CountingProvider {
    type Cursor = ScanCursor;

    fn cursor(&self, model: ModelId, fresh: bool) -> Option<ScanCursor> {
        let points = self.models.get(model.0)?;
        self.requests.set(self.requests.get() + 1);
        if fresh {
            self.fresh_requests.set(self.fresh_requests.get() + 1);
        }
        Some(ScanCursor {
            points: points.clone(),
            hits: Vec::new(),
            last: None,
        })
    }
}

pub(crate) struct ScanCursor {
    points: Vec<PointRecord>,
    hits: Vec<(PointRecord, f64)>,
    last: Option<f64>,
}

impl PartitionCursor for ScanCursor {
    fn initialize(&mut self, center: &Point3<f64>, radius: f64, hemisphere_only: bool) {
        self.last = None;
        self.hits = self
            .points
            .iter()
            .filter(|p| !hemisphere_only || p.position.x >= center.x)
            .map(|p| (*p, (p.position - center).norm_squared()))
            .filter(|(_, d2)| radius >= 0.0 && *d2 <= radius * radius)
            .collect();
    }

    fn has_more(&self) -> bool {
        !self.hits.is_empty()
    }

    fn next_point(&mut self) -> Option<PointRecord> {
        let (point, d2) = self.hits.pop()?;
        self.last = Some(d2);
        Some(point)
    }

    fn found_distance_squared(&self) -> Option<f64> {
        self.last
    }

    fn release(&mut self) {
        self.hits.clear();
        self.last = None;
    }
}

/// Points `0, 1, ..., n-1` Angstroms along the x axis.
pub(crate) fn line(n: usize) -> Vec<Point3<f64>> {
    (0..n).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect()
}
