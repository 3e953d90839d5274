use super::config::SearchConfig;
use super::cursor::{AtomIndexCursor, ProximityCursor, QueryRadius};
use crate::core::models::atom_set::AtomBitSet;
use crate::core::models::ids::ModelId;
use crate::core::radius::policy::{RadiusPolicy, VdwRadiusSource};
use crate::core::spatial::PartitionProvider;
use nalgebra::Point3;
use tracing::debug;

/// Runs one proximity search across several models, visiting them in ascending order.
///
/// A fresh partition cursor is acquired for every model. Indices are always global,
/// so a zero-based configuration is ignored.
pub struct MultiModelCursor<'a, P: PartitionProvider> {
    inner: ProximityCursor<'a, P>,
    models: Vec<ModelId>,
    position: usize,
    center: Point3<f64>,
    radius: f64,
}

impl<'a, P: PartitionProvider> MultiModelCursor<'a, P> {
    pub fn new(
        provider: &'a P,
        mut config: SearchConfig,
        models: impl IntoIterator<Item = ModelId>,
    ) -> Self {
        let mut models: Vec<ModelId> = models.into_iter().collect();
        models.sort_unstable();
        models.dedup();
        if config.zero_based {
            debug!("Zero-based indexing is not supported across models; reporting global indices.");
            config.zero_based = false;
        }
        let position = models.len();
        Self {
            inner: ProximityCursor::new(provider, config),
            models,
            position,
            center: Point3::origin(),
            radius: 0.0,
        }
    }

    pub fn with_selection(mut self, selection: &'a AtomBitSet) -> Self {
        self.inner = self.inner.with_selection(selection);
        self
    }

    pub fn with_radii(mut self, radii: &'a (dyn VdwRadiusSource + Sync)) -> Self {
        self.inner = self.inner.with_radii(radii);
        self
    }

    pub fn models(&self) -> &[ModelId] {
        &self.models
    }

    /// The model currently being traversed.
    pub fn current_model(&self) -> Option<ModelId> {
        self.models.get(self.position).copied()
    }

    /// Sets the self atom and radius rule, then (unless deferred) starts the search.
    pub fn bind(
        &mut self,
        self_index: Option<usize>,
        center: Point3<f64>,
        radius: QueryRadius,
        policy: Option<RadiusPolicy>,
    ) {
        self.inner.set_query(self_index, policy);
        match radius {
            QueryRadius::Within(distance) => {
                let search_radius = self.inner.search_radius(distance, policy);
                self.set_center(center, search_radius);
            }
            QueryRadius::Deferred => {
                self.center = center;
                self.inner.release();
                self.position = self.models.len();
            }
        }
    }

    /// Restarts the search from the first model around a new center.
    pub fn set_center(&mut self, center: Point3<f64>, radius: f64) {
        self.center = center;
        self.radius = radius;
        self.activate_from(0);
    }

    pub fn has_next(&mut self) -> bool {
        if self.position >= self.models.len() {
            return false;
        }
        loop {
            if self.inner.has_next() {
                return true;
            }
            if !self.activate_from(self.position + 1) {
                return false;
            }
        }
    }

    pub fn next_index(&mut self) -> Option<usize> {
        self.inner.next_index()
    }

    pub fn found_distance_squared(&self) -> Option<f64> {
        self.inner.found_distance_squared()
    }

    pub fn release(&mut self) {
        self.inner.release();
        self.position = self.models.len();
    }

    fn activate_from(&mut self, start: usize) -> bool {
        for position in start..self.models.len() {
            if self.inner.attach(self.models[position], true) {
                self.inner.rebind(self.center, self.radius);
                self.position = position;
                return true;
            }
        }
        self.release();
        false
    }
}

impl<P: PartitionProvider> AtomIndexCursor for MultiModelCursor<'_, P> {
    fn has_next(&mut self) -> bool {
        MultiModelCursor::has_next(self)
    }

    fn next_index(&mut self) -> Option<usize> {
        MultiModelCursor::next_index(self)
    }

    fn found_distance_squared(&self) -> Option<f64> {
        MultiModelCursor::found_distance_squared(self)
    }

    fn acceptance_threshold_squared(&self) -> Option<f64> {
        self.inner.acceptance_threshold_squared()
    }

    fn release(&mut self) {
        MultiModelCursor::release(self)
    }
}
