use super::atom::Atom;
use super::atom_set::AtomBitSet;
use super::bond::{Bond, BondOrder, HydrogenBondKind, VisibilityChange};
use super::ids::ModelId;
use crate::core::radius::params::UserVdwRadii;
use crate::core::radius::policy::{VdwClass, VdwRadiusSource, vdw_radius};
use nalgebra::Point3;
use std::ops::Range;
use thiserror::Error;

const SULFUR: u8 = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Unknown model: {0}")]
    UnknownModel(ModelId),

    #[error("Atom index {index} is out of range (atom count: {count})")]
    AtomOutOfRange { index: usize, count: usize },

    #[error("Cannot append atoms to {model}: atoms of a model must be contiguous and {last} was added after it")]
    NonContiguousAtoms { model: ModelId, last: ModelId },

    #[error("Cannot bond atom {0} to itself")]
    SelfBond(usize),

    #[error("Bond index {0} is out of range")]
    BondOutOfRange(usize),
}

/// One model of a [`ModelSet`]: a contiguous block of atom indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub id: ModelId,
    /// Lowest global atom index belonging to this model.
    pub first_atom_index: usize,
    pub atom_count: usize,
    /// Class used when an atom of this model is queried with [`VdwClass::Auto`].
    pub default_vdw: VdwClass,
}

impl Model {
    pub fn atom_range(&self) -> Range<usize> {
        self.first_atom_index..self.first_atom_index + self.atom_count
    }

    pub fn contains_atom(&self, atom_index: usize) -> bool {
        self.atom_range().contains(&atom_index)
    }
}

/// The atoms, models, and bonds that proximity queries run against.
///
/// Atoms are numbered globally and each model owns a contiguous index range, so
/// atoms have to be added model by model.
#[derive(Debug, Clone, Default)]
pub struct ModelSet {
    atoms: Vec<Atom>,
    models: Vec<Model>,
    bonds: Vec<Bond>,
    /// Bond indices touching each atom.
    atom_bonds: Vec<Vec<usize>>,
    user_radii: UserVdwRadii,
}

impl ModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an empty model whose atoms will start at the current atom count.
    pub fn add_model(&mut self, default_vdw: VdwClass) -> ModelId {
        let id = ModelId(self.models.len());
        self.models.push(Model {
            id,
            first_atom_index: self.atoms.len(),
            atom_count: 0,
            default_vdw,
        });
        id
    }

    /// Appends an atom to `model`, which must be the most recently added model.
    ///
    /// # Return
    ///
    /// Returns the global index of the new atom.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownModel`] if the model does not exist, or
    /// [`ModelError::NonContiguousAtoms`] if a later model has already been added.
    pub fn add_atom(
        &mut self,
        model: ModelId,
        element: u8,
        position: Point3<f64>,
    ) -> Result<usize, ModelError> {
        let last = self
            .models
            .last()
            .map(|m| m.id)
            .ok_or(ModelError::UnknownModel(model))?;
        if model.0 >= self.models.len() {
            return Err(ModelError::UnknownModel(model));
        }
        if model != last {
            return Err(ModelError::NonContiguousAtoms { model, last });
        }

        let index = self.atoms.len();
        self.atoms.push(Atom::new(index, model, element, position));
        self.atom_bonds.push(Vec::new());
        self.models[model.0].atom_count += 1;
        Ok(index)
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn atom_mut(&mut self, index: usize) -> Option<&mut Atom> {
        self.atoms.get_mut(index)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.get(id.0)
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Atoms of one model, in global index order.
    pub fn model_atoms(&self, id: ModelId) -> Option<&[Atom]> {
        self.model(id).map(|m| &self.atoms[m.atom_range()])
    }

    /// All atom indices of one model as a set.
    pub fn model_atom_set(&self, id: ModelId) -> Option<AtomBitSet> {
        self.model(id).map(|m| AtomBitSet::from_range(m.atom_range()))
    }

    /// The models that own at least one atom of `atoms`, ascending.
    pub fn models_of(&self, atoms: &AtomBitSet) -> Vec<ModelId> {
        let mut models: Vec<ModelId> = atoms
            .iter()
            .filter_map(|i| self.atoms.get(i).map(|a| a.model))
            .collect();
        models.dedup();
        models
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn bond(&self, index: usize) -> Option<&Bond> {
        self.bonds.get(index)
    }

    /// Mutable access to a bond. Endpoints and order are fixed once added.
    pub fn bond_mut(&mut self, index: usize) -> Option<&mut Bond> {
        self.bonds.get_mut(index)
    }

    /// Indices of every bond that has `atom_index` as an endpoint, in insertion order.
    pub fn atom_bonds(&self, atom_index: usize) -> &[usize] {
        self.atom_bonds.get(atom_index).map_or(&[], Vec::as_slice)
    }

    /// Atoms joined to `atom_index` by a covalent bond.
    pub fn covalent_partners(&self, atom_index: usize) -> impl Iterator<Item = usize> + '_ {
        self.atom_bonds(atom_index).iter().filter_map(move |&b| {
            let bond = &self.bonds[b];
            if bond.is_covalent() {
                bond.other_atom(atom_index)
            } else {
                None
            }
        })
    }

    pub fn covalent_bond_count(&self, atom_index: usize) -> usize {
        self.covalent_partners(atom_index).count()
    }

    /// Index of a bond of any kind between the two atoms.
    pub fn bond_between(&self, atom1: usize, atom2: usize) -> Option<usize> {
        self.atom_bonds(atom1)
            .iter()
            .copied()
            .find(|&b| self.bonds[b].other_atom(atom1) == Some(atom2))
    }

    pub fn is_bonded(&self, atom1: usize, atom2: usize) -> bool {
        self.bond_between(atom1, atom2).is_some()
    }

    /// Adds a covalent (or other non-hydrogen) bond and returns its index.
    ///
    /// Disulfide bonds are flagged automatically from the endpoint elements.
    pub fn add_bond(
        &mut self,
        atom1: usize,
        atom2: usize,
        order: BondOrder,
    ) -> Result<usize, ModelError> {
        self.check_bond_endpoints(atom1, atom2)?;
        let mut bond = match order {
            BondOrder::Hydrogen(kind) => Bond::hydrogen(atom1, atom2, kind, 0.0),
            order => Bond::new(atom1, atom2, order),
        };
        bond.set_sulfur(
            self.atoms[atom1].element == SULFUR && self.atoms[atom2].element == SULFUR,
        );
        Ok(self.push_bond(bond))
    }

    /// Adds a hydrogen bond with a precomputed energy (kcal/mol) and returns its index.
    pub fn add_hydrogen_bond(
        &mut self,
        atom1: usize,
        atom2: usize,
        kind: HydrogenBondKind,
        energy: f64,
    ) -> Result<usize, ModelError> {
        self.check_bond_endpoints(atom1, atom2)?;
        Ok(self.push_bond(Bond::hydrogen(atom1, atom2, kind, energy)))
    }

    /// Sets a bond's rendered width and keeps both endpoints' displayed-bond counts in step.
    ///
    /// # Return
    ///
    /// The visibility transition that occurred, if any.
    pub fn set_bond_width(
        &mut self,
        bond_index: usize,
        width: u16,
    ) -> Result<Option<VisibilityChange>, ModelError> {
        let bond = self
            .bonds
            .get_mut(bond_index)
            .ok_or(ModelError::BondOutOfRange(bond_index))?;
        let change = bond.set_width(width);
        if let Some(change) = change {
            let (a1, a2) = bond.atom_indices();
            let is_visible = change == VisibilityChange::Shown;
            self.atoms[a1].add_displayed_bond(is_visible);
            self.atoms[a2].add_displayed_bond(is_visible);
        }
        Ok(change)
    }

    pub fn user_vdw_radii(&self) -> &UserVdwRadii {
        &self.user_radii
    }

    pub fn set_user_vdw_radii(&mut self, radii: UserVdwRadii) {
        self.user_radii = radii;
    }

    /// Overrides (or, with `None`, restores) the van der Waals radius of one atom.
    pub fn set_atom_vdw_radius(
        &mut self,
        atom_index: usize,
        radius: Option<f64>,
    ) -> Result<(), ModelError> {
        let count = self.atoms.len();
        let atom = self
            .atoms
            .get_mut(atom_index)
            .ok_or(ModelError::AtomOutOfRange {
                index: atom_index,
                count,
            })?;
        atom.user_vdw_radius = radius;
        Ok(())
    }

    fn push_bond(&mut self, bond: Bond) -> usize {
        let index = self.bonds.len();
        let (a1, a2) = bond.atom_indices();
        self.atom_bonds[a1].push(index);
        self.atom_bonds[a2].push(index);
        self.bonds.push(bond);
        index
    }

    fn check_bond_endpoints(&self, atom1: usize, atom2: usize) -> Result<(), ModelError> {
        let count = self.atoms.len();
        for index in [atom1, atom2] {
            if index >= count {
                return Err(ModelError::AtomOutOfRange { index, count });
            }
        }
        if atom1 == atom2 {
            return Err(ModelError::SelfBond(atom1));
        }
        Ok(())
    }
}

impl VdwRadiusSource for ModelSet {
    fn vdw_radius(&self, atom_index: usize, class: VdwClass) -> Option<f64> {
        let atom = self.atoms.get(atom_index)?;
        if let Some(radius) = atom.user_vdw_radius {
            return Some(radius);
        }
        let class = match class {
            VdwClass::Auto => self
                .models
                .get(atom.model.0)
                .map_or(VdwClass::Jmol, |m| m.default_vdw),
            other => other,
        };
        Some(vdw_radius(atom.element, class, &self.user_radii))
    }
}
