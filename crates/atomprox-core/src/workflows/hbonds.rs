use crate::core::models::atom_set::AtomBitSet;
use crate::core::models::bond::{HydrogenBondKind, hydrogen_bond_energy_from_positions};
use crate::core::models::model_set::ModelSet;
use crate::core::spatial::PartitionProvider;
use crate::engine::config::{HydrogenBondConfig, SearchConfig};
use crate::engine::cursor::{ProximityCursor, QueryRadius};
use crate::engine::error::EngineError;
use nalgebra::Vector3;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

const HYDROGEN: u8 = 1;
const NITROGEN: u8 = 7;
const OXYGEN: u8 = 8;

fn is_polar(element: u8) -> bool {
    element == NITROGEN || element == OXYGEN
}

/// A hydrogen bond found from geometry, not yet added to the model set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HydrogenBondCandidate {
    /// The hydrogen, or the donor N/O when the search runs without hydrogens.
    pub donor: usize,
    pub acceptor: usize,
    /// `Calculated` when the energy could be evaluated, otherwise `Regular`.
    pub kind: HydrogenBondKind,
    /// kcal/mol; zero for `Regular` bonds.
    pub energy: f64,
}

/// Outcome of the attached-angle test at one end of a hydrogen bond.
enum Attached {
    /// A covalent neighbour makes too small an angle with the bond.
    Blocked,
    /// The covalent neighbour with the smallest angle, if there is one.
    Nearest(Option<usize>),
}

fn attached_neighbour(
    model_set: &ModelSet,
    atom_index: usize,
    toward: &Vector3<f64>,
    min_angle: f64,
    include_hydrogens: bool,
) -> Attached {
    let atoms = model_set.atoms();
    let origin = atoms[atom_index].position;
    let mut nearest: Option<(usize, f64)> = None;
    for partner in model_set.covalent_partners(atom_index) {
        if !include_hydrogens && atoms[partner].element == HYDROGEN {
            continue;
        }
        let angle = (origin - atoms[partner].position).angle(toward);
        if angle < min_angle {
            return Attached::Blocked;
        }
        if nearest.is_none_or(|(_, smallest)| angle < smallest) {
            nearest = Some((partner, angle));
        }
    }
    Attached::Nearest(nearest.map(|(partner, _)| partner))
}

/// Finds hydrogen bonds from atoms in `from` to acceptors in `to`.
///
/// If `from` holds any hydrogen, only hydrogens covalently bound to N or O act as
/// donors and the hydrogen-acceptor distance is tested. Otherwise N and O atoms in
/// `from` are paired with N and O atoms in `to` by their heavy-atom distance. Already
/// bonded pairs are skipped, and each unordered pair is reported once.
///
/// With a non-zero attached angle, a pair is rejected if a covalent neighbour of
/// either end sits closer than that angle to the bond. A hydrogen bond whose donor
/// and acceptor both have a covalent neighbour gets a calculated energy.
///
/// # Errors
///
/// Returns [`EngineError::AtomNotFound`] if `from` or the partition names an atom the
/// set does not hold.
#[instrument(skip_all, name = "find_hydrogen_bonds")]
pub fn find_hydrogen_bonds<P: PartitionProvider>(
    model_set: &ModelSet,
    provider: &P,
    from: &AtomBitSet,
    to: &AtomBitSet,
    config: &HydrogenBondConfig,
) -> Result<Vec<HydrogenBondCandidate>, EngineError> {
    let with_hydrogens = from
        .iter()
        .any(|i| model_set.atom(i).is_some_and(|a| a.element == HYDROGEN));
    let (min_distance, max_distance) = if with_hydrogens {
        (
            config.min_hydrogen_acceptor_distance,
            config.max_hydrogen_acceptor_distance,
        )
    } else {
        (
            config.min_donor_acceptor_distance,
            config.max_donor_acceptor_distance,
        )
    };
    let (min_squared, max_squared) = (min_distance * min_distance, max_distance * max_distance);
    let min_angle = config.min_attached_angle_degrees.to_radians();

    let mut cursor = ProximityCursor::new(provider, SearchConfig::default()).with_selection(to);
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for index in from.iter() {
        let atom = model_set
            .atom(index)
            .ok_or(EngineError::AtomNotFound(index))?;
        let is_hydrogen = atom.element == HYDROGEN;
        if is_hydrogen {
            let on_polar_atom = model_set
                .covalent_partners(index)
                .any(|p| is_polar(model_set.atoms()[p].element));
            if !on_polar_atom {
                continue;
            }
        } else if with_hydrogens || !is_polar(atom.element) {
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
            QueryRadius::Within(max_distance),
            None,
        );
        while cursor.has_next() {
            let Some(other) = cursor.next_index() else {
                continue;
            };
            let Some(distance_squared) = cursor.found_distance_squared() else {
                continue;
            };
            let partner = model_set
                .atom(other)
                .ok_or(EngineError::AtomNotFound(other))?;
            let wrong_partner = if is_hydrogen {
                partner.element == HYDROGEN
            } else {
                !is_polar(partner.element)
            };
            if wrong_partner
                || distance_squared < min_squared
                || distance_squared > max_squared
                || model_set.is_bonded(index, other)
            {
                continue;
            }

            let mut kind = HydrogenBondKind::Regular;
            let mut energy = 0.0;
            if min_angle > 0.0 {
                let toward = atom.position - partner.position;
                let Attached::Nearest(donor) =
                    attached_neighbour(model_set, index, &toward, min_angle, with_hydrogens)
                else {
                    continue;
                };
                let Attached::Nearest(carbonyl) =
                    attached_neighbour(model_set, other, &(-toward), min_angle, with_hydrogens)
                else {
                    continue;
                };
                if let (true, Some(donor), Some(carbonyl)) = (is_hydrogen, donor, carbonyl) {
                    let atoms = model_set.atoms();
                    if let Some(e) = hydrogen_bond_energy_from_positions(
                        &partner.position,
                        &atoms[carbonyl].position,
                        &atoms[donor].position,
                        &atom.position,
                    ) {
                        kind = HydrogenBondKind::Calculated;
                        energy = e;
                    }
                }
            }

            if seen.insert((index.min(other), index.max(other))) {
                found.push(HydrogenBondCandidate {
                    donor: index,
                    acceptor: other,
                    kind,
                    energy,
                });
            }
        }
    }
    cursor.release();

    found.sort_by_key(|c| (c.donor, c.acceptor));
    debug!(with_hydrogens, found = found.len(), "Found hydrogen bonds.");
    Ok(found)
}

/// Runs [`find_hydrogen_bonds`] and adds every result as a hydrogen bond.
///
/// # Return
///
/// Indices of the added bonds.
#[instrument(skip_all, name = "add_hydrogen_bonds")]
pub fn add_hydrogen_bonds<P: PartitionProvider>(
    model_set: &mut ModelSet,
    provider: &P,
    from: &AtomBitSet,
    to: &AtomBitSet,
    config: &HydrogenBondConfig,
) -> Result<Vec<usize>, EngineError> {
    let candidates = find_hydrogen_bonds(model_set, provider, from, to, config)?;
    let added = candidates
        .iter()
        .map(|c| model_set.add_hydrogen_bond(c.donor, c.acceptor, c.kind, c.energy))
        .collect::<Result<Vec<_>, _>>()?;

    let calculated = candidates
        .iter()
        .filter(|c| c.kind == HydrogenBondKind::Calculated)
        .count();
    info!(added = added.len(), calculated, "Added hydrogen bonds.");
    Ok(added)
}
