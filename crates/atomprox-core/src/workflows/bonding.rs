use crate::core::models::atom_set::AtomBitSet;
use crate::core::models::bond::BondOrder;
use crate::core::models::model_set::{ModelError, ModelSet};
use crate::core::radius::elements::bonding_radius;
use crate::core::spatial::PartitionProvider;
use crate::engine::config::{BondingConfig, SearchConfig};
use crate::engine::cursor::{ProximityCursor, QueryRadius};
use crate::engine::error::EngineError;
use tracing::{debug, info, instrument, warn};

/// Whether two atoms with bonding radii `radius1` and `radius2` are close enough to bond.
///
/// Atoms without a bonding radius never bond, and neither do atoms closer than the
/// configured minimum distance.
pub fn is_bondable(
    radius1: f64,
    radius2: f64,
    distance_squared: f64,
    config: &BondingConfig,
) -> bool {
    if radius1 == 0.0 || radius2 == 0.0 {
        return false;
    }
    if distance_squared < config.min_distance * config.min_distance {
        return false;
    }
    let limit = radius1 + radius2 + config.tolerance;
    distance_squared <= limit * limit
}

/// Lists the sorted atom pairs `(i, j)`, `i < j`, that satisfy [`is_bondable`].
///
/// Only atoms of the same model are paired. With `atoms`, both atoms of a pair must
/// be in it. Pairs that are already bonded are included.
///
/// # Errors
///
/// Returns [`EngineError::AtomNotFound`] for an input atom the set does not hold, and
/// [`EngineError::Model`] if the partition reports an atom the set does not hold.
#[instrument(skip_all, name = "find_covalent_bonds")]
pub fn find_covalent_bonds<P: PartitionProvider>(
    model_set: &ModelSet,
    provider: &P,
    atoms: Option<&AtomBitSet>,
    config: &BondingConfig,
) -> Result<Vec<(usize, usize)>, EngineError> {
    let all_atoms;
    let candidates = match atoms {
        Some(atoms) => atoms,
        None => {
            all_atoms = AtomBitSet::from_range(0..model_set.atom_count());
            &all_atoms
        }
    };
    let max_radius = candidates
        .iter()
        .filter_map(|i| model_set.atom(i))
        .map(|a| bonding_radius(a.element))
        .fold(0.0, f64::max);

    // Each pair is seen from the atom with the smaller x; ties are seen twice.
    let search = SearchConfig::builder().hemisphere_only(true).build()?;
    let mut cursor = ProximityCursor::new(provider, search);
    if let Some(atoms) = atoms {
        cursor = cursor.with_selection(atoms);
    }

    let mut pairs = Vec::new();
    for index in candidates.iter() {
        let atom = model_set
            .atom(index)
            .ok_or(EngineError::AtomNotFound(index))?;
        let radius = bonding_radius(atom.element);
        if radius == 0.0 {
            continue;
        }
        let model = model_set
            .model(atom.model)
            .ok_or(EngineError::ModelNotFound(atom.model))?;
        cursor.bind_model(
            model.id,
            model.first_atom_index,
            Some(index),
            atom.position,
            QueryRadius::Within(radius + max_radius + config.tolerance),
            None,
        );
        while cursor.has_next() {
            let Some(other) = cursor.next_index() else {
                continue;
            };
            let Some(distance_squared) = cursor.found_distance_squared() else {
                continue;
            };
            let partner = model_set.atom(other).ok_or(ModelError::AtomOutOfRange {
                index: other,
                count: model_set.atom_count(),
            })?;
            if is_bondable(radius, bonding_radius(partner.element), distance_squared, config) {
                pairs.push((index.min(other), index.max(other)));
            }
        }
    }
    cursor.release();

    pairs.sort_unstable();
    pairs.dedup();
    debug!(atoms = candidates.len(), pairs = pairs.len(), "Found bondable pairs.");
    Ok(pairs)
}

/// Adds a new single bond for every bondable pair that is not bonded yet.
///
/// An atom that already holds more covalent bonds than
/// [`BondingConfig::max_bonds_per_atom`] gets no new ones. New bonds are marked with
/// [`Bond::mark_new`](crate::core::models::bond::Bond::mark_new).
///
/// # Return
///
/// Indices of the added bonds, in ascending pair order.
#[instrument(skip_all, name = "auto_bond")]
pub fn auto_bond<P: PartitionProvider>(
    model_set: &mut ModelSet,
    provider: &P,
    atoms: Option<&AtomBitSet>,
    config: &BondingConfig,
) -> Result<Vec<usize>, EngineError> {
    let pairs = find_covalent_bonds(model_set, provider, atoms, config)?;

    let mut added = Vec::new();
    let mut limit_reported = false;
    for &(atom1, atom2) in &pairs {
        if model_set.is_bonded(atom1, atom2) {
            continue;
        }
        if model_set.covalent_bond_count(atom1) > config.max_bonds_per_atom
            || model_set.covalent_bond_count(atom2) > config.max_bonds_per_atom
        {
            if !limit_reported {
                warn!(
                    limit = config.max_bonds_per_atom,
                    atom1,
                    atom2,
                    "Maximum bond count reached; saturated atoms get no new bonds."
                );
                limit_reported = true;
            }
            continue;
        }
        let bond = model_set.add_bond(atom1, atom2, BondOrder::Single)?;
        if let Some(bond) = model_set.bond_mut(bond) {
            bond.mark_new();
        }
        added.push(bond);
    }

    info!(candidates = pairs.len(), added = added.len(), "Auto-bonded atoms.");
    Ok(added)
}
