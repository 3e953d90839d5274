use super::config::SearchConfig;
use crate::core::models::atom_set::AtomBitSet;
use crate::core::models::ids::ModelId;
use crate::core::radius::policy::{RadiusPolicy, VdwClass, VdwRadiusSource};
use crate::core::spatial::{PartitionCursor, PartitionProvider};
use nalgebra::Point3;
use tracing::{debug, trace, warn};

/// Radius supplied when binding a cursor to a model.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum QueryRadius {
    /// Bind the model and query parameters only; [`ProximityCursor::rebind`] starts the search.
    #[default]
    Deferred,
    /// Search within this radius immediately.
    Within(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderConstraint {
    #[default]
    None,
    /// Only atoms with a global index greater than the self atom are reported.
    StrictlyGreater,
}

/// Common protocol of the single- and multi-model cursors.
///
/// `next_index` may only be called after `has_next` returned `true`.
pub trait AtomIndexCursor {
    fn has_next(&mut self) -> bool;

    /// Index of the candidate found by the last successful `has_next`.
    fn next_index(&mut self) -> Option<usize>;

    /// Squared distance from the query center to the current candidate.
    fn found_distance_squared(&self) -> Option<f64>;

    /// Squared acceptance distance for the current candidate under the bound radius rule.
    fn acceptance_threshold_squared(&self) -> Option<f64>;

    fn release(&mut self);
}

struct BoundPartition<C> {
    model: ModelId,
    cursor: C,
}

#[derive(Debug, Clone, Copy)]
struct VdwBinding {
    policy: RadiusPolicy,
    class: VdwClass,
    self_radius: f64,
}

/// Filtered neighbour search around a center point within one model.
///
/// The cursor pulls raw candidates from a [`PartitionProvider`] and drops the bound
/// self atom, atoms outside the selection, and (in greater-only mode) atoms with a
/// lower index. The partition cursor of the last bound model is kept and reused when
/// the same model is bound again, unless the configuration is thread safe.
pub struct ProximityCursor<'a, P: PartitionProvider> {
    provider: &'a P,
    config: SearchConfig,
    selection: Option<&'a AtomBitSet>,
    radii: Option<&'a (dyn VdwRadiusSource + Sync)>,
    partition: Option<BoundPartition<P::Cursor>>,
    zero_base: usize,
    self_index: Option<usize>,
    order: OrderConstraint,
    vdw: Option<VdwBinding>,
    center: Point3<f64>,
    radius_squared: Option<f64>,
    lookahead: Option<usize>,
    current: Option<usize>,
    current_distance_squared: Option<f64>,
}

impl<'a, P: PartitionProvider> ProximityCursor<'a, P> {
    pub fn new(provider: &'a P, config: SearchConfig) -> Self {
        Self {
            provider,
            config,
            selection: None,
            radii: None,
            partition: None,
            zero_base: 0,
            self_index: None,
            order: OrderConstraint::None,
            vdw: None,
            center: Point3::origin(),
            radius_squared: None,
            lookahead: None,
            current: None,
            current_distance_squared: None,
        }
    }

    /// Restricts results to atoms in `selection`.
    pub fn with_selection(mut self, selection: &'a AtomBitSet) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Source of per-atom radii, required for van der Waals policies.
    pub fn with_radii(mut self, radii: &'a (dyn VdwRadiusSource + Sync)) -> Self {
        self.radii = Some(radii);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The model whose partition cursor is currently held.
    pub fn bound_model(&self) -> Option<ModelId> {
        self.partition.as_ref().map(|bound| bound.model)
    }

    pub fn order_constraint(&self) -> OrderConstraint {
        self.order
    }

    pub fn center(&self) -> Point3<f64> {
        self.center
    }

    /// Binds the cursor to `model` and, unless `radius` is deferred, starts a search.
    ///
    /// `first_atom_index` is the model's first global atom index, subtracted from
    /// reported indices in zero-based mode. A van der Waals `policy` replaces the
    /// given radius with a widened search bound and filters each candidate by its
    /// own pair threshold; any other policy transforms the radius directly.
    pub fn bind_model(
        &mut self,
        model: ModelId,
        first_atom_index: usize,
        self_index: Option<usize>,
        center: Point3<f64>,
        radius: QueryRadius,
        policy: Option<RadiusPolicy>,
    ) {
        let fresh = self.config.thread_safe;
        self.attach(model, fresh);
        self.zero_base = if self.config.zero_based {
            first_atom_index
        } else {
            0
        };
        self.set_query(self_index, policy);
        self.center = center;
        self.radius_squared = None;
        if let QueryRadius::Within(distance) = radius {
            let search_radius = self.search_radius(distance, policy);
            self.rebind(center, search_radius);
        }
    }

    /// Restarts the traversal around a new center with a new fixed radius.
    ///
    /// Keeps the bound model, self atom, ordering, and van der Waals binding.
    /// Does nothing if no partition cursor is held.
    pub fn rebind(&mut self, center: Point3<f64>, radius: f64) {
        self.lookahead = None;
        self.current = None;
        self.current_distance_squared = None;
        let Some(bound) = self.partition.as_mut() else {
            return;
        };
        bound
            .cursor
            .initialize(&center, radius, self.config.hemisphere_only);
        self.center = center;
        self.radius_squared = Some(radius * radius);
        trace!(model = %bound.model, radius, "Proximity search started.");
    }

    /// Releases the held partition cursor. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(mut bound) = self.partition.take() {
            bound.cursor.release();
        }
        self.lookahead = None;
        self.current = None;
        self.current_distance_squared = None;
        self.radius_squared = None;
    }

    pub fn has_next(&mut self) -> bool {
        self.lookahead = None;
        let Some(bound) = self.partition.as_mut() else {
            return false;
        };
        let self_index = self.self_index;
        let order = self.order;
        let selection = self.selection;
        while let Some(point) = bound.cursor.next_point() {
            let index = point.index;
            let accepted = match self_index {
                Some(own) => {
                    index != own && (order == OrderConstraint::None || index > own)
                }
                None => true,
            } && selection.is_none_or(|s| s.contains(index));
            if accepted {
                self.lookahead = Some(index);
                return true;
            }
        }
        false
    }

    /// Index of the candidate found by the last successful [`Self::has_next`].
    ///
    /// In zero-based mode the index is relative to the bound model's first atom.
    pub fn next_index(&mut self) -> Option<usize> {
        debug_assert!(
            self.lookahead.is_some(),
            "next_index called without a successful has_next"
        );
        let index = self.lookahead.take()?;
        self.current = Some(index);
        self.current_distance_squared = self
            .partition
            .as_ref()
            .and_then(|bound| bound.cursor.found_distance_squared());
        index.checked_sub(self.zero_base)
    }

    /// Squared distance of the candidate last returned by [`Self::next_index`].
    ///
    /// Unaffected by candidates that a later [`Self::has_next`] skipped.
    pub fn found_distance_squared(&self) -> Option<f64> {
        self.current_distance_squared
    }

    /// Squared acceptance distance for the candidate last returned by [`Self::next_index`].
    pub fn acceptance_threshold_squared(&self) -> Option<f64> {
        match &self.vdw {
            Some(vdw) => {
                let index = self.current?;
                let radius = self.radii?.vdw_radius(index, vdw.class)?;
                Some(vdw.policy.pair_threshold_squared(vdw.self_radius, radius))
            }
            None => self.radius_squared,
        }
    }

    /// Makes sure a partition cursor for `model` is held; returns whether one is.
    pub(crate) fn attach(&mut self, model: ModelId, fresh: bool) -> bool {
        self.lookahead = None;
        self.current = None;
        self.current_distance_squared = None;
        let reusable = !fresh && self.bound_model() == Some(model);
        if reusable {
            return true;
        }
        if let Some(mut old) = self.partition.take() {
            old.cursor.release();
        }
        match self.provider.cursor(model, fresh) {
            Some(cursor) => {
                debug!(%model, fresh, "Acquired partition cursor.");
                self.partition = Some(BoundPartition { model, cursor });
                true
            }
            None => {
                warn!(%model, "No spatial partition for model; cursor stays unbound.");
                false
            }
        }
    }

    pub(crate) fn set_query(&mut self, self_index: Option<usize>, policy: Option<RadiusPolicy>) {
        self.self_index = self_index;
        self.order = if self.config.greater_only && self_index.is_some() {
            OrderConstraint::StrictlyGreater
        } else {
            OrderConstraint::None
        };
        self.vdw = policy.and_then(|policy| {
            let class = policy.vdw_class?;
            let Some(radii) = self.radii else {
                warn!(%class, "Van der Waals policy bound without a radius source; using the plain radius.");
                return None;
            };
            let self_radius = self_index
                .and_then(|i| radii.vdw_radius(i, class))
                .unwrap_or(0.0);
            Some(VdwBinding {
                policy,
                class,
                self_radius,
            })
        });
    }

    pub(crate) fn search_radius(&self, distance: f64, policy: Option<RadiusPolicy>) -> f64 {
        match (policy, &self.vdw) {
            (Some(policy), Some(_)) => policy.search_radius(&self.config.vdw_margins),
            (Some(policy), None) if !policy.is_vdw() => policy.apply_to(distance),
            _ => distance,
        }
    }
}

impl<P: PartitionProvider> AtomIndexCursor for ProximityCursor<'_, P> {
    fn has_next(&mut self) -> bool {
        ProximityCursor::has_next(self)
    }

    fn next_index(&mut self) -> Option<usize> {
        ProximityCursor::next_index(self)
    }

    fn found_distance_squared(&self) -> Option<f64> {
        ProximityCursor::found_distance_squared(self)
    }

    fn acceptance_threshold_squared(&self) -> Option<f64> {
        ProximityCursor::acceptance_threshold_squared(self)
    }

    fn release(&mut self) {
        ProximityCursor::release(self)
    }
}

impl<P: PartitionProvider> Iterator for ProximityCursor<'_, P> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.has_next() {
            if let Some(index) = self.next_index() {
                return Some(index);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::model_set::ModelSet;
    use crate::core::spatial::kdtree::KdTreePartition;
    use crate::engine::multi_model::MultiModelCursor;
    use crate::engine::testing::{CountingProvider, line};
    use itertools::Itertools;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn drain<P: PartitionProvider>(cursor: &mut ProximityCursor<'_, P>) -> Vec<usize> {
        let mut found: Vec<usize> = cursor.by_ref().collect();
        found.sort_unstable();
        found
    }

    fn random_points(rng: &mut StdRng, n: usize) -> Vec<Point3<f64>> {
        (0..n)
            .map(|_| {
                Point3::new(
                    rng.gen_range(0.0..10.0),
                    rng.gen_range(0.0..10.0),
                    rng.gen_range(0.0..10.0),
                )
            })
            .collect()
    }

    #[test]
    fn excludes_self_atom() {
        let provider = CountingProvider::new(vec![line(5)]);
        let mut cursor = ProximityCursor::new(&provider, SearchConfig::default());
        cursor.bind_model(
            ModelId(0),
            0,
            Some(2),
            Point3::new(2.0, 0.0, 0.0),
            QueryRadius::Within(1.0),
            None,
        );
        assert_eq!(drain(&mut cursor), vec![1, 3]);
    }

    #[test]
    fn point_query_without_self_reports_everything_in_range() {
        let provider = CountingProvider::new(vec![line(5)]);
        let mut cursor = ProximityCursor::new(&provider, SearchConfig::default());
        cursor.bind_model(
            ModelId(0),
            0,
            None,
            Point3::new(2.0, 0.0, 0.0),
            QueryRadius::Within(1.0),
            None,
        );
        assert_eq!(drain(&mut cursor), vec![1, 2, 3]);
    }

    #[test]
    fn greater_only_requires_a_self_atom() {
        let provider = CountingProvider::new(vec![line(5)]);
        let config = SearchConfig::builder().greater_only(true).build().unwrap();
        let mut cursor = ProximityCursor::new(&provider, config);
        let center = Point3::new(2.0, 0.0, 0.0);

        cursor.bind_model(ModelId(0), 0, Some(2), center, QueryRadius::Within(2.0), None);
        assert_eq!(cursor.order_constraint(), OrderConstraint::StrictlyGreater);
        assert_eq!(drain(&mut cursor), vec![3, 4]);

        cursor.bind_model(ModelId(0), 0, None, center, QueryRadius::Within(2.0), None);
        assert_eq!(cursor.order_constraint(), OrderConstraint::None);
        assert_eq!(drain(&mut cursor), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn greater_only_union_covers_every_close_pair_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let points = random_points(&mut rng, 60);
        let provider = CountingProvider::new(vec![points.clone()]);
        let config = SearchConfig::builder().greater_only(true).build().unwrap();
        let mut cursor = ProximityCursor::new(&provider, config);
        let radius = 2.5;

        let mut pairs = Vec::new();
        for (i, p) in points.iter().enumerate() {
            cursor.bind_model(ModelId(0), 0, Some(i), *p, QueryRadius::Within(radius), None);
            pairs.extend(drain(&mut cursor).into_iter().map(|j| (i, j)));
        }
        let expected: Vec<(usize, usize)> = (0..points.len())
            .tuple_combinations()
            .filter(|&(i, j)| (points[i] - points[j]).norm_squared() <= radius * radius)
            .collect();
        pairs.sort_unstable();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn results_stay_inside_selection() {
        let mut rng = StdRng::seed_from_u64(11);
        let points = random_points(&mut rng, 80);
        let provider = CountingProvider::new(vec![points]);
        let selection: AtomBitSet = (0..80).filter(|_| rng.gen_bool(0.4)).collect();
        let mut cursor =
            ProximityCursor::new(&provider, SearchConfig::default()).with_selection(&selection);

        for self_index in [None, Some(3)] {
            cursor.bind_model(
                ModelId(0),
                0,
                self_index,
                Point3::new(5.0, 5.0, 5.0),
                QueryRadius::Within(6.0),
                None,
            );
            let found = drain(&mut cursor);
            assert!(!found.is_empty());
            assert!(found.iter().all(|&i| selection.contains(i)));
        }
    }

    #[test]
    fn zero_based_indices_are_relative_to_model_start() {
        let provider = CountingProvider::new(vec![line(4), line(4)]);
        let config = SearchConfig::builder().zero_based(true).build().unwrap();
        let mut cursor = ProximityCursor::new(&provider, config);
        cursor.bind_model(
            ModelId(1),
            4,
            Some(5),
            Point3::new(1.0, 0.0, 0.0),
            QueryRadius::Within(1.0),
            None,
        );
        assert_eq!(drain(&mut cursor), vec![0, 2]);
    }

    #[test]
    fn partition_cursor_is_reused_across_rebinds() {
        let provider = CountingProvider::new(vec![line(6), line(6)]);
        let mut cursor = ProximityCursor::new(&provider, SearchConfig::default());

        cursor.bind_model(ModelId(0), 0, None, Point3::origin(), QueryRadius::Deferred, None);
        cursor.rebind(Point3::new(1.0, 0.0, 0.0), 1.0);
        assert_eq!(drain(&mut cursor), vec![0, 1, 2]);
        cursor.rebind(Point3::new(4.0, 0.0, 0.0), 1.0);
        assert_eq!(drain(&mut cursor), vec![3, 4, 5]);
        assert_eq!(provider.requests(), 1);

        cursor.bind_model(ModelId(0), 0, None, Point3::origin(), QueryRadius::Within(0.5), None);
        assert_eq!(provider.requests(), 1);

        cursor.bind_model(ModelId(1), 6, None, Point3::origin(), QueryRadius::Within(0.5), None);
        assert_eq!(provider.requests(), 2);
        assert_eq!(cursor.bound_model(), Some(ModelId(1)));
        assert_eq!(drain(&mut cursor), vec![6]);
    }

    #[test]
    fn thread_safe_cursor_acquires_fresh_partition_every_bind() {
        let provider = CountingProvider::new(vec![line(3)]);
        let config = SearchConfig::builder().thread_safe(true).build().unwrap();
        let mut cursor = ProximityCursor::new(&provider, config);
        for _ in 0..3 {
            cursor.bind_model(ModelId(0), 0, None, Point3::origin(), QueryRadius::Within(1.0), None);
        }
        assert_eq!(provider.requests(), 3);
        assert_eq!(provider.fresh_requests(), 3);
    }

    #[test]
    fn unbound_cursor_is_empty() {
        let provider = CountingProvider::new(vec![line(3)]);
        let mut cursor = ProximityCursor::new(&provider, SearchConfig::default());
        cursor.rebind(Point3::origin(), 10.0);
        assert!(!cursor.has_next());
        assert_eq!(cursor.found_distance_squared(), None);

        cursor.bind_model(ModelId(9), 0, None, Point3::origin(), QueryRadius::Within(10.0), None);
        assert!(!cursor.has_next());
        assert_eq!(cursor.bound_model(), None);
    }

    #[test]
    fn deferred_radius_binds_without_searching() {
        let provider = CountingProvider::new(vec![line(3)]);
        let mut cursor = ProximityCursor::new(&provider, SearchConfig::default());
        cursor.bind_model(ModelId(0), 0, Some(0), Point3::origin(), QueryRadius::Deferred, None);
        assert_eq!(cursor.bound_model(), Some(ModelId(0)));
        assert!(!cursor.has_next());

        cursor.rebind(Point3::origin(), 2.0);
        assert_eq!(drain(&mut cursor), vec![1, 2]);
    }

    #[test]
    fn release_is_idempotent() {
        let provider = CountingProvider::new(vec![line(3)]);
        let mut cursor = ProximityCursor::new(&provider, SearchConfig::default());
        cursor.bind_model(ModelId(0), 0, None, Point3::origin(), QueryRadius::Within(5.0), None);
        assert!(cursor.has_next());
        cursor.release();
        cursor.release();
        assert!(!cursor.has_next());
        assert_eq!(cursor.bound_model(), None);

        cursor.bind_model(ModelId(0), 0, None, Point3::origin(), QueryRadius::Within(5.0), None);
        assert_eq!(provider.requests(), 2);
    }

    #[test]
    fn found_distance_matches_candidate() {
        let provider = CountingProvider::new(vec![line(4)]);
        let mut cursor = ProximityCursor::new(&provider, SearchConfig::default());
        cursor.bind_model(ModelId(0), 0, None, Point3::origin(), QueryRadius::Within(3.0), None);
        while cursor.has_next() {
            let index = cursor.next_index().unwrap();
            let expected = (index * index) as f64;
            assert_eq!(cursor.found_distance_squared(), Some(expected));
            assert_eq!(cursor.acceptance_threshold_squared(), Some(9.0));
        }
    }

    #[test]
    fn found_distance_survives_filtered_candidates() {
        // Candidates arrive 4, 3, 2, 1, 0; only 4 and 3 pass the greater-only filter.
        let provider = CountingProvider::new(vec![line(5)]);
        let config = SearchConfig::builder().greater_only(true).build().unwrap();
        let mut cursor = ProximityCursor::new(&provider, config);
        cursor.bind_model(
            ModelId(0),
            0,
            Some(2),
            Point3::new(2.0, 0.0, 0.0),
            QueryRadius::Within(2.0),
            None,
        );
        assert!(cursor.has_next());
        assert_eq!(cursor.next_index(), Some(4));
        assert!(cursor.has_next());
        assert_eq!(cursor.next_index(), Some(3));
        assert!(!cursor.has_next());
        assert_eq!(cursor.found_distance_squared(), Some(1.0));

        cursor.rebind(Point3::new(2.0, 0.0, 0.0), 2.0);
        assert_eq!(cursor.found_distance_squared(), None);
    }

    #[test]
    fn cursor_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ProximityCursor<'static, KdTreePartition>>();
        assert_send::<MultiModelCursor<'static, KdTreePartition>>();
    }

    #[test]
    fn thread_safe_cursors_share_one_partition_across_threads() {
        let mut rng = StdRng::seed_from_u64(23);
        let mut set = ModelSet::new();
        let model = set.add_model(VdwClass::Jmol);
        for point in random_points(&mut rng, 200) {
            set.add_atom(model, 6, point).unwrap();
        }
        let partition = KdTreePartition::from_model_set(&set);
        let config = SearchConfig::builder()
            .greater_only(true)
            .thread_safe(true)
            .build()
            .unwrap();
        let policy = RadiusPolicy::factor(1.0).with_vdw(VdwClass::Jmol);

        let pairs_in = |atoms: std::ops::Range<usize>| {
            let mut cursor = ProximityCursor::new(&partition, config).with_radii(&set);
            let mut pairs = Vec::new();
            for i in atoms {
                let position = set.atoms()[i].position;
                cursor.bind_model(model, 0, Some(i), position, QueryRadius::Within(0.0), Some(policy));
                while cursor.has_next() {
                    let Some(j) = cursor.next_index() else { continue };
                    let (Some(d2), Some(limit)) = (
                        cursor.found_distance_squared(),
                        cursor.acceptance_threshold_squared(),
                    ) else {
                        continue;
                    };
                    if d2 <= limit {
                        pairs.push((i, j));
                    }
                }
            }
            cursor.release();
            pairs.sort_unstable();
            pairs
        };

        let sequential = pairs_in(0..200);
        let (left, right) = std::thread::scope(|scope| {
            let left = scope.spawn(|| pairs_in(0..100));
            let right = scope.spawn(|| pairs_in(100..200));
            (left.join().unwrap(), right.join().unwrap())
        });
        assert!(!sequential.is_empty());
        assert_eq!([left, right].concat(), sequential);
    }

    #[test]
    fn non_vdw_policy_transforms_radius() {
        let provider = CountingProvider::new(vec![line(6)]);
        let mut cursor = ProximityCursor::new(&provider, SearchConfig::default());
        cursor.bind_model(
            ModelId(0),
            0,
            Some(0),
            Point3::origin(),
            QueryRadius::Within(2.0),
            Some(RadiusPolicy::offset(1.0)),
        );
        assert_eq!(drain(&mut cursor), vec![1, 2, 3]);

        cursor.bind_model(
            ModelId(0),
            0,
            Some(0),
            Point3::origin(),
            QueryRadius::Within(2.0),
            Some(RadiusPolicy::factor(2.0)),
        );
        assert_eq!(drain(&mut cursor), vec![1, 2, 3, 4]);
    }

    #[test]
    fn hemisphere_only_drops_points_behind_center() {
        let provider = CountingProvider::new(vec![line(5)]);
        let config = SearchConfig::builder().hemisphere_only(true).build().unwrap();
        let mut cursor = ProximityCursor::new(&provider, config);
        cursor.bind_model(
            ModelId(0),
            0,
            None,
            Point3::new(2.0, 0.0, 0.0),
            QueryRadius::Within(2.0),
            None,
        );
        assert_eq!(drain(&mut cursor), vec![2, 3, 4]);
    }
}
