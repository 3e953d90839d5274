use super::ids::ModelId;
use crate::core::radius::elements::element_symbol;
use nalgebra::Point3;

/// A point-index record: one atom's coordinates plus its identity.
///
/// `index` is unique across the whole [`ModelSet`](super::model_set::ModelSet)
/// but is not stable across structural edits; anything that caches indices must
/// re-resolve them after atoms are removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Global index of the atom within its model set.
    pub index: usize,
    /// The model this atom belongs to.
    pub model: ModelId,
    /// Atomic number; 0 for unknown or dummy atoms.
    pub element: u8,
    /// Cartesian coordinates in Angstroms.
    pub position: Point3<f64>,
    /// Explicit van der Waals radius, overriding every tabulated class.
    pub user_vdw_radius: Option<f64>,
    displayed_bond_count: u32,
}

impl Atom {
    /// Creates a new atom with no displayed bonds and no radius override.
    ///
    /// # Arguments
    ///
    /// * `index` - The global atom index.
    /// * `model` - The owning model.
    /// * `element` - The atomic number.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(index: usize, model: ModelId, element: u8, position: Point3<f64>) -> Self {
        Self {
            index,
            model,
            element,
            position,
            user_vdw_radius: None,
            displayed_bond_count: 0,
        }
    }

    pub fn element_symbol(&self) -> &'static str {
        element_symbol(self.element)
    }

    /// Number of currently visible bonds attached to this atom.
    pub fn displayed_bond_count(&self) -> u32 {
        self.displayed_bond_count
    }

    pub fn has_displayed_bond(&self) -> bool {
        self.displayed_bond_count > 0
    }

    #[inline]
    pub fn distance_squared(&self, point: &Point3<f64>) -> f64 {
        (self.position - point).norm_squared()
    }

    /// Records one bond becoming visible or hidden.
    ///
    /// Callers must only invoke this on an actual visibility transition of the bond.
    pub(crate) fn add_displayed_bond(&mut self, is_visible: bool) {
        if is_visible {
            self.displayed_bond_count += 1;
        } else {
            debug_assert!(
                self.displayed_bond_count > 0,
                "hiding a bond on atom {} with no displayed bonds",
                self.index
            );
            self.displayed_bond_count = self.displayed_bond_count.saturating_sub(1);
        }
    }
}
