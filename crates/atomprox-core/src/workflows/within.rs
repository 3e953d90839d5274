use crate::core::models::atom_set::AtomBitSet;
use crate::core::models::ids::ModelId;
use crate::core::models::model_set::ModelSet;
use crate::core::radius::policy::RadiusPolicy;
use crate::core::spatial::PartitionProvider;
use crate::engine::collector::BulkCollector;
use crate::engine::config::SearchConfig;
use crate::engine::cursor::{ProximityCursor, QueryRadius};
use crate::engine::error::EngineError;
use crate::engine::multi_model::MultiModelCursor;
use nalgebra::Point3;
use tracing::{info, instrument};

/// Which models are searched around each input atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Only the atom's own model. The input atoms are part of the result.
    #[default]
    SameModel,
    /// Every model of the set.
    AllModels,
}

/// Collects every atom within `distance` of any atom in `atoms`.
///
/// With a `policy`, the distance is transformed by it, or for van der Waals policies
/// replaced by a per-pair threshold built from both atoms' radii.
///
/// # Errors
///
/// Returns [`EngineError::AtomNotFound`] if `atoms` names an atom the set does not hold.
#[instrument(skip_all, name = "atoms_within_radius")]
pub fn atoms_within_radius<P: PartitionProvider>(
    model_set: &ModelSet,
    provider: &P,
    distance: f64,
    atoms: &AtomBitSet,
    scope: SearchScope,
    policy: Option<RadiusPolicy>,
) -> Result<AtomBitSet, EngineError> {
    let mut result = match scope {
        SearchScope::SameModel => atoms.clone(),
        SearchScope::AllModels => AtomBitSet::new(),
    };
    let mut cursor = ProximityCursor::new(provider, SearchConfig::default()).with_radii(model_set);

    for index in atoms.iter() {
        let atom = model_set
            .atom(index)
            .ok_or(EngineError::AtomNotFound(index))?;
        let models = match scope {
            SearchScope::SameModel => std::slice::from_ref(
                model_set
                    .model(atom.model)
                    .ok_or(EngineError::ModelNotFound(atom.model))?,
            ),
            SearchScope::AllModels => model_set.models(),
        };
        for model in models {
            cursor.bind_model(
                model.id,
                model.first_atom_index,
                Some(index),
                atom.position,
                QueryRadius::Within(distance),
                policy,
            );
            cursor.add_atoms(&mut result);
        }
    }
    cursor.release();

    info!(
        inputs = atoms.len(),
        found = result.len(),
        distance,
        ?scope,
        "Collected atoms within radius."
    );
    Ok(result)
}

/// Collects every atom within `distance` of `center`, in one model or, with `None`, all models.
#[instrument(skip_all, name = "atoms_within_point")]
pub fn atoms_within_point<P: PartitionProvider>(
    model_set: &ModelSet,
    provider: &P,
    distance: f64,
    center: Point3<f64>,
    model: Option<ModelId>,
) -> Result<AtomBitSet, EngineError> {
    let models: Vec<ModelId> = match model {
        Some(id) => {
            model_set.model(id).ok_or(EngineError::ModelNotFound(id))?;
            vec![id]
        }
        None => model_set.models().iter().map(|m| m.id).collect(),
    };

    let mut cursor = MultiModelCursor::new(provider, SearchConfig::default(), models);
    cursor.set_center(center, distance);
    let result = cursor.collect_atoms();
    cursor.release();

    info!(found = result.len(), distance, "Collected atoms around point.");
    Ok(result)
}

/// Lists every unordered pair `(i, j)` with `i < j` of atoms in `model` closer than
/// or exactly at `distance`, sorted. With a `selection`, both atoms must be in it.
#[instrument(skip_all, name = "close_pairs")]
pub fn close_pairs<P: PartitionProvider>(
    model_set: &ModelSet,
    provider: &P,
    model: ModelId,
    distance: f64,
    selection: Option<&AtomBitSet>,
) -> Result<Vec<(usize, usize)>, EngineError> {
    let record = model_set
        .model(model)
        .ok_or(EngineError::ModelNotFound(model))?;
    let config = SearchConfig::builder().greater_only(true).build()?;
    let mut cursor = ProximityCursor::new(provider, config);
    if let Some(selection) = selection {
        cursor = cursor.with_selection(selection);
    }

    let mut pairs = Vec::new();
    for atom in &model_set.atoms()[record.atom_range()] {
        if selection.is_some_and(|s| !s.contains(atom.index)) {
            continue;
        }
        cursor.bind_model(
            model,
            record.first_atom_index,
            Some(atom.index),
            atom.position,
            QueryRadius::Within(distance),
            None,
        );
        let start = pairs.len();
        pairs.extend(cursor.by_ref().map(|other| (atom.index, other)));
        pairs[start..].sort_unstable();
    }
    cursor.release();

    info!(%model, pairs = pairs.len(), distance, "Enumerated close pairs.");
    Ok(pairs)
}
